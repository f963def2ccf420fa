use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::PermissionsConfig;
use crate::permissions::error::PermissionError;
use crate::permissions::model::{AccountId, Menu, MenuGrants, PermissionGrant, PermissionKind, PermissionMatrix};
use crate::store::{GrantStore, MenuCatalog};

/// Limits applied while loading grants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitializerSettings {
    pub fetch_timeout: Duration,
    pub max_concurrent_fetches: usize,
}

impl Default for InitializerSettings {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(10),
            max_concurrent_fetches: 8,
        }
    }
}

impl InitializerSettings {
    pub fn from_config(config: &PermissionsConfig) -> Self {
        Self {
            fetch_timeout: Duration::from_millis(config.grant_fetch_timeout_ms),
            max_concurrent_fetches: config.max_concurrent_fetches.max(1),
        }
    }
}

/// Builds a dense `PermissionMatrix` for an account from the catalog and grant store
#[derive(Clone)]
pub struct MatrixInitializer {
    catalog: Arc<dyn MenuCatalog>,
    grants: Arc<dyn GrantStore>,
    settings: InitializerSettings,
}

impl MatrixInitializer {
    pub fn new(catalog: Arc<dyn MenuCatalog>, grants: Arc<dyn GrantStore>, settings: InitializerSettings) -> Self {
        Self {
            catalog,
            grants,
            settings,
        }
    }

    pub fn settings(&self) -> &InitializerSettings {
        &self.settings
    }

    /// Load every catalog menu with its four grants.
    ///
    /// Only a catalog failure is an error. A grant lookup that fails, times out
    /// or comes back empty leaves that menu with all kinds off.
    pub async fn initialize(&self, account_id: AccountId) -> Result<PermissionMatrix, PermissionError> {
        let menus = self
            .catalog
            .list_menus()
            .await
            .map_err(PermissionError::CatalogUnavailable)?;

        let menu_count = menus.len();
        let entries: Vec<MenuGrants> = stream::iter(menus)
            .map(|menu| self.load_menu(account_id, menu))
            .buffered(self.settings.max_concurrent_fetches.max(1))
            .collect()
            .await;

        let matrix = PermissionMatrix::new(account_id, entries);
        info!(
            "Initialized permission matrix for account {}: {} menus, {} persisted grants",
            account_id,
            menu_count,
            matrix.grants().filter(|g| g.is_persisted()).count()
        );
        Ok(matrix)
    }

    async fn load_menu(&self, account_id: AccountId, menu: Menu) -> MenuGrants {
        let lookup = tokio::time::timeout(self.settings.fetch_timeout, self.grants.list_grants(menu.id, account_id));

        let stored = match lookup.await {
            Ok(Ok(rows)) => rows,
            Ok(Err(e)) => {
                warn!("Grant lookup for menu {} / account {} failed, defaulting to no access: {}", menu.id, account_id, e);
                Vec::new()
            }
            Err(_) => {
                warn!(
                    "Grant lookup for menu {} / account {} timed out after {:?}, defaulting to no access",
                    menu.id, account_id, self.settings.fetch_timeout
                );
                Vec::new()
            }
        };

        if stored.is_empty() {
            debug!("No grants stored for menu {} / account {}", menu.id, account_id);
        }

        fill_menu(account_id, menu, &stored)
    }
}

/// Sparse-to-dense pass: one grant per kind, copied from the store when present
pub(crate) fn fill_menu(account_id: AccountId, menu: Menu, stored: &[PermissionGrant]) -> MenuGrants {
    let mut entry = MenuGrants::defaulted(account_id, menu);
    let menu_id = entry.menu_id();

    for kind in PermissionKind::ALL {
        let mut matches = stored
            .iter()
            .filter(|g| g.account_id == account_id && g.menu_id == menu_id && g.kind.code() == kind.code());

        if let Some(found) = matches.next() {
            let slot = entry.grant_mut(kind);
            slot.status = found.status;
            slot.persisted_id = found.persisted_id.clone();

            if matches.next().is_some() {
                warn!("Multiple {} grants stored for menu {} / account {}, using the first", kind, menu_id, account_id);
            }
        }
    }

    entry
}

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::permissions::model::{AccountId, GrantId, Menu, MenuId, PermissionGrant, PermissionKind};
use crate::store::wire::{GrantRecord, MenuGrantRecords};
use crate::store::{BulkUpsertOutcome, GrantStore, MenuCatalog, StoreError};

/// Initial content for a `MemoryStore`, usually read from a JSON file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSeed {
    #[serde(default)]
    pub menus: Vec<Menu>,
    #[serde(default)]
    pub grants: Vec<GrantRecord>,
}

impl StoreSeed {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let seed: StoreSeed = serde_json::from_str(&content)?;
        Ok(seed)
    }
}

#[derive(Debug, Default)]
struct Faults {
    catalog_down: bool,
    failing_menus: HashSet<MenuId>,
    stalled_menus: HashSet<MenuId>,
    next_upsert_failure: Option<String>,
}

#[derive(Debug, Default)]
struct MemoryState {
    menus: Vec<Menu>,
    grants: Vec<PermissionGrant>,
    next_id: i64,
    faults: Faults,
}

impl MemoryState {
    fn position_by_id(&self, id: &GrantId) -> Option<usize> {
        self.grants.iter().position(|g| g.persisted_id.as_ref() == Some(id))
    }

    fn position_by_triple(&self, account_id: AccountId, menu_id: MenuId, kind: PermissionKind) -> Option<usize> {
        self.grants
            .iter()
            .position(|g| g.account_id == account_id && g.menu_id == menu_id && g.kind == kind)
    }

    fn allocate_id(&mut self) -> GrantId {
        self.next_id += 1;
        GrantId::from(self.next_id)
    }

    /// Reject the whole batch before touching any row
    fn validate(&self, account_id: AccountId, menus: &[MenuGrantRecords]) -> Result<(), StoreError> {
        for menu in menus {
            if !self.menus.iter().any(|m| m.id == menu.menu_id) {
                return Err(StoreError::Rejected(format!("menu {} does not exist", menu.menu_id)));
            }
            for record in &menu.permissions {
                if record.account_id != account_id {
                    return Err(StoreError::Rejected(format!(
                        "record for account {} submitted under account {}",
                        record.account_id, account_id
                    )));
                }
                if record.menu_id != menu.menu_id {
                    return Err(StoreError::Rejected(format!(
                        "record for menu {} submitted under menu {}",
                        record.menu_id, menu.menu_id
                    )));
                }
                let kind = record.kind().ok_or_else(|| {
                    StoreError::Rejected(format!("unknown permission code {}", record.permission_code))
                })?;
                if let Some(id) = &record.id {
                    let position = self
                        .position_by_id(id)
                        .ok_or_else(|| StoreError::Rejected(format!("grant {} does not exist", id)))?;
                    let existing = &self.grants[position];
                    if existing.account_id != account_id || existing.menu_id != menu.menu_id || existing.kind != kind {
                        return Err(StoreError::Rejected(format!(
                            "grant {} belongs to a different account, menu or kind",
                            id
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

/// In-process menu catalog and grant store.
///
/// Backs the development server and the test suite. Fault injection hooks let
/// tests exercise degraded lookups and rejected saves.
#[derive(Debug)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
    report_assigned: bool,
    upsert_delay: Option<Duration>,
}

impl MemoryStore {
    pub fn new(menus: Vec<Menu>) -> Self {
        Self {
            state: RwLock::new(MemoryState {
                menus,
                ..MemoryState::default()
            }),
            report_assigned: true,
            upsert_delay: None,
        }
    }

    pub fn from_seed(seed: StoreSeed) -> Self {
        let grants = seed.grants.into_iter().filter_map(GrantRecord::into_grant).collect();
        Self::new(seed.menus).with_grants(grants)
    }

    /// Preload grants; rows without an id get one allocated
    pub fn with_grants(mut self, grants: Vec<PermissionGrant>) -> Self {
        let state = self.state.get_mut();
        let highest = grants
            .iter()
            .filter_map(|g| g.persisted_id.as_ref())
            .filter_map(GrantId::as_numeric)
            .max()
            .unwrap_or(0);
        state.next_id = state.next_id.max(highest);

        for mut grant in grants {
            if grant.persisted_id.is_none() {
                grant.persisted_id = Some(state.allocate_id());
            }
            state.grants.push(grant);
        }
        self
    }

    /// Behave like a store whose bulk endpoint does not echo written rows
    pub fn without_assigned_ids(mut self) -> Self {
        self.report_assigned = false;
        self
    }

    pub fn with_upsert_delay(mut self, delay: Duration) -> Self {
        self.upsert_delay = Some(delay);
        self
    }

    pub async fn set_catalog_down(&self, down: bool) {
        self.state.write().await.faults.catalog_down = down;
    }

    pub async fn fail_grants_for(&self, menu_id: MenuId) {
        self.state.write().await.faults.failing_menus.insert(menu_id);
    }

    /// Grant lookups for this menu never answer
    pub async fn stall_grants_for(&self, menu_id: MenuId) {
        self.state.write().await.faults.stalled_menus.insert(menu_id);
    }

    pub async fn fail_next_upsert(&self, message: impl Into<String>) {
        self.state.write().await.faults.next_upsert_failure = Some(message.into());
    }

    /// Every stored grant, in insertion order
    pub async fn grants(&self) -> Vec<PermissionGrant> {
        self.state.read().await.grants.clone()
    }

    pub async fn grant_count(&self) -> usize {
        self.state.read().await.grants.len()
    }
}

#[async_trait]
impl MenuCatalog for MemoryStore {
    async fn list_menus(&self) -> Result<Vec<Menu>, StoreError> {
        let state = self.state.read().await;
        if state.faults.catalog_down {
            return Err(StoreError::Unavailable("menu catalog is down".to_string()));
        }
        Ok(state.menus.clone())
    }
}

#[async_trait]
impl GrantStore for MemoryStore {
    async fn list_grants(&self, menu_id: MenuId, account_id: AccountId) -> Result<Vec<PermissionGrant>, StoreError> {
        let stalled = {
            let state = self.state.read().await;
            if state.faults.failing_menus.contains(&menu_id) {
                return Err(StoreError::Unavailable(format!("grant lookup for menu {} failed", menu_id)));
            }
            state.faults.stalled_menus.contains(&menu_id)
        };
        if stalled {
            futures::future::pending::<()>().await;
        }

        let state = self.state.read().await;
        Ok(state
            .grants
            .iter()
            .filter(|g| g.menu_id == menu_id && g.account_id == account_id)
            .cloned()
            .collect())
    }

    async fn bulk_upsert(
        &self,
        account_id: AccountId,
        menus: Vec<MenuGrantRecords>,
    ) -> Result<BulkUpsertOutcome, StoreError> {
        if let Some(delay) = self.upsert_delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.write().await;
        if let Some(message) = state.faults.next_upsert_failure.take() {
            return Err(StoreError::Rejected(message));
        }
        state.validate(account_id, &menus)?;

        let mut written = Vec::new();
        let (mut created, mut updated) = (0usize, 0usize);
        for record in menus.into_iter().flat_map(|menu| menu.permissions) {
            let Some(mut grant) = record.into_grant() else {
                continue;
            };

            // A sentinel record for a triple that already exists updates that row,
            // so retries never produce a second grant for the same triple.
            let position = match &grant.persisted_id {
                Some(id) => state.position_by_id(id),
                None => state.position_by_triple(grant.account_id, grant.menu_id, grant.kind),
            };

            match position {
                Some(index) => {
                    let existing = &mut state.grants[index];
                    existing.status = grant.status;
                    written.push(existing.clone());
                    updated += 1;
                }
                None => {
                    grant.persisted_id = Some(state.allocate_id());
                    written.push(grant.clone());
                    state.grants.push(grant);
                    created += 1;
                }
            }
        }

        debug!("Bulk upsert for account {}: {} created, {} updated", account_id, created, updated);

        Ok(BulkUpsertOutcome {
            saved: written.len(),
            assigned: self.report_assigned.then_some(written),
        })
    }
}

/// Load a store from a seed file, or start empty when no file is configured
pub fn load_store(seed_file: Option<&Path>) -> anyhow::Result<MemoryStore> {
    match seed_file {
        Some(path) => {
            let seed = StoreSeed::from_file(path)?;
            info!(
                "Seeded grant store from {} ({} menus, {} grants)",
                path.display(),
                seed.menus.len(),
                seed.grants.len()
            );
            Ok(MemoryStore::from_seed(seed))
        }
        None => Ok(MemoryStore::new(Vec::new())),
    }
}

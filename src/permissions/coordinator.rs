use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use crate::permissions::error::PermissionError;
use crate::permissions::initializer::{InitializerSettings, MatrixInitializer};
use crate::permissions::model::{AccountId, PermissionGrant, PermissionKind, PermissionMatrix};
use crate::store::wire::{GrantRecord, MenuGrantRecords};
use crate::store::{GrantStore, MenuCatalog};

/// Persists whole matrices through a single bulk upsert and hands back a refreshed copy
pub struct BulkSaveCoordinator {
    initializer: MatrixInitializer,
    grants: Arc<dyn GrantStore>,
    in_flight: Arc<Mutex<HashSet<AccountId>>>,
}

/// Marks an account as saving until dropped
struct SaveGuard {
    in_flight: Arc<Mutex<HashSet<AccountId>>>,
    account_id: AccountId,
}

impl Drop for SaveGuard {
    fn drop(&mut self) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        in_flight.remove(&self.account_id);
    }
}

impl BulkSaveCoordinator {
    pub fn new(catalog: Arc<dyn MenuCatalog>, grants: Arc<dyn GrantStore>, settings: InitializerSettings) -> Self {
        Self {
            initializer: MatrixInitializer::new(catalog, grants.clone(), settings),
            grants,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn initializer(&self) -> &MatrixInitializer {
        &self.initializer
    }

    /// Build a fresh matrix for the account
    pub async fn load(&self, account_id: AccountId) -> Result<PermissionMatrix, PermissionError> {
        self.initializer.initialize(account_id).await
    }

    pub fn is_saving(&self, account_id: AccountId) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(&account_id)
    }

    /// One record per (menu, kind), persisted ids or the unsaved sentinel
    pub fn serialize(matrix: &PermissionMatrix) -> Vec<MenuGrantRecords> {
        matrix
            .menus()
            .map(|entry| MenuGrantRecords {
                menu_id: entry.menu_id(),
                permissions: PermissionKind::ALL
                    .iter()
                    .map(|kind| GrantRecord::from_grant(entry.grant(*kind)))
                    .collect(),
            })
            .collect()
    }

    /// Save the whole matrix and return its replacement.
    ///
    /// The caller's matrix is only borrowed; on any error it is exactly what it
    /// was before the call.
    pub async fn save(&self, matrix: &PermissionMatrix) -> Result<PermissionMatrix, PermissionError> {
        let account_id = matrix.account_id();
        let _guard = self.begin(account_id)?;

        let records = Self::serialize(matrix);
        let record_count: usize = records.iter().map(|menu| menu.permissions.len()).sum();
        info!("Saving {} grant records across {} menus for account {}", record_count, records.len(), account_id);

        let outcome = self.grants.bulk_upsert(account_id, records).await.map_err(|e| {
            warn!("Bulk save for account {} rejected: {}", account_id, e);
            PermissionError::SaveRejected(e)
        })?;

        match outcome.assigned {
            Some(assigned) => {
                info!("Store reported {} written grants for account {}, reconciling from response", assigned.len(), account_id);
                Ok(reconcile(matrix, &assigned))
            }
            None => self.initializer.initialize(account_id).await.map_err(|e| {
                warn!("Saved grants for account {} but refresh failed: {}", account_id, e);
                PermissionError::RefreshFailed(Box::new(e))
            }),
        }
    }

    fn begin(&self, account_id: AccountId) -> Result<SaveGuard, PermissionError> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if !in_flight.insert(account_id) {
            return Err(PermissionError::SaveInProgress(account_id));
        }
        Ok(SaveGuard {
            in_flight: self.in_flight.clone(),
            account_id,
        })
    }
}

/// New matrix from the saved snapshot with the store's written rows applied
fn reconcile(saved: &PermissionMatrix, written: &[PermissionGrant]) -> PermissionMatrix {
    let mut refreshed = saved.clone();
    for grant in written.iter().filter(|g| g.account_id == saved.account_id()) {
        if let Ok(entry) = refreshed.menu_mut(grant.menu_id) {
            let slot = entry.grant_mut(grant.kind);
            slot.status = grant.status;
            if grant.persisted_id.is_some() {
                slot.persisted_id = grant.persisted_id.clone();
            }
        }
    }
    refreshed
}

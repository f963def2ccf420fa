use std::sync::Arc;
use tracing::info;

use crate::permissions::coordinator::BulkSaveCoordinator;
use crate::permissions::error::PermissionError;
use crate::permissions::model::{AccountId, MenuId, PermissionKind, PermissionMatrix};

/// The permission screen for one account.
///
/// Owns the live matrix. A session only exists once initialization has
/// completed, so every edit can rely on a dense matrix.
pub struct PermissionSession {
    coordinator: Arc<BulkSaveCoordinator>,
    matrix: PermissionMatrix,
    loaded: PermissionMatrix,
}

impl PermissionSession {
    pub async fn open(coordinator: Arc<BulkSaveCoordinator>, account_id: AccountId) -> Result<Self, PermissionError> {
        let matrix = coordinator.load(account_id).await?;
        Ok(Self {
            coordinator,
            loaded: matrix.clone(),
            matrix,
        })
    }

    pub fn account_id(&self) -> AccountId {
        self.matrix.account_id()
    }

    pub fn matrix(&self) -> &PermissionMatrix {
        &self.matrix
    }

    /// Local edits not yet saved
    pub fn is_dirty(&self) -> bool {
        self.matrix != self.loaded
    }

    /// Whether the save control should be disabled
    pub fn is_saving(&self) -> bool {
        self.coordinator.is_saving(self.account_id())
    }

    pub fn toggle_kind(&mut self, menu_id: MenuId, kind: PermissionKind) -> Result<(), PermissionError> {
        self.matrix.toggle_kind(menu_id, kind)
    }

    pub fn set_kind(&mut self, menu_id: MenuId, kind: PermissionKind, status: bool) -> Result<(), PermissionError> {
        self.matrix.set_kind(menu_id, kind, status)
    }

    pub fn toggle_all_kinds_for_menu(&mut self, menu_id: MenuId) -> Result<(), PermissionError> {
        self.matrix.toggle_all_kinds_for_menu(menu_id)
    }

    pub fn toggle_all_menus(&mut self) {
        self.matrix.toggle_all_menus()
    }

    /// Persist the matrix. On success it is replaced with the refreshed copy;
    /// on failure it is left as it was.
    pub async fn save(&mut self) -> Result<(), PermissionError> {
        let refreshed = self.coordinator.save(&self.matrix).await?;
        info!("Permission matrix for account {} saved", self.account_id());
        self.loaded = refreshed.clone();
        self.matrix = refreshed;
        Ok(())
    }

    /// Drop local edits and rebuild from the store
    pub async fn reload(&mut self) -> Result<(), PermissionError> {
        let matrix = self.coordinator.load(self.account_id()).await?;
        self.loaded = matrix.clone();
        self.matrix = matrix;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::initializer::InitializerSettings;
    use crate::permissions::model::Menu;
    use crate::store::memory::MemoryStore;

    async fn open(store: Arc<MemoryStore>) -> PermissionSession {
        let coordinator = Arc::new(BulkSaveCoordinator::new(store.clone(), store, InitializerSettings::default()));
        PermissionSession::open(coordinator, AccountId(5)).await.unwrap()
    }

    #[tokio::test]
    async fn test_edits_mark_session_dirty_until_saved() {
        let store = Arc::new(MemoryStore::new(vec![Menu::new(1, "Subjects")]));
        let mut session = open(store).await;
        assert!(!session.is_dirty());

        session.toggle_kind(MenuId(1), PermissionKind::Read).unwrap();
        assert!(session.is_dirty());

        session.save().await.unwrap();
        assert!(!session.is_dirty());
        assert!(!session.is_saving());
        assert!(session.matrix().grant(MenuId(1), PermissionKind::Read).unwrap().is_persisted());
    }

    #[tokio::test]
    async fn test_failed_save_keeps_edits() {
        let store = Arc::new(MemoryStore::new(vec![Menu::new(1, "Subjects")]));
        let mut session = open(store.clone()).await;
        session.toggle_all_menus();
        let edited = session.matrix().clone();

        store.fail_next_upsert("network down").await;
        assert!(session.save().await.is_err());
        assert_eq!(session.matrix(), &edited);
        assert!(session.is_dirty());

        session.save().await.unwrap();
        assert!(session.matrix().is_fully_selected());
    }

    #[tokio::test]
    async fn test_reload_discards_edits() {
        let store = Arc::new(MemoryStore::new(vec![Menu::new(1, "Subjects")]));
        let mut session = open(store).await;
        session.toggle_all_kinds_for_menu(MenuId(1)).unwrap();
        session.reload().await.unwrap();
        assert!(!session.is_dirty());
        assert!(!session.matrix().is_menu_fully_selected(MenuId(1)).unwrap());
    }
}

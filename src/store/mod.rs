pub mod http;
pub mod memory;
pub mod wire;

use async_trait::async_trait;
use thiserror::Error;

use crate::permissions::model::{AccountId, Menu, MenuId, PermissionGrant};
use crate::store::wire::MenuGrantRecords;

/// Errors from the menu catalog and grant store collaborators
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid store URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Store responded with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Failed to decode store response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Store rejected the request: {0}")]
    Rejected(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Result of a bulk upsert.
///
/// `assigned` is only present when the store reports the rows it wrote;
/// otherwise the caller has to re-read grants to learn new identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkUpsertOutcome {
    pub saved: usize,
    pub assigned: Option<Vec<PermissionGrant>>,
}

/// Source of the manageable menus
#[async_trait]
pub trait MenuCatalog: Send + Sync {
    async fn list_menus(&self) -> Result<Vec<Menu>, StoreError>;
}

/// Persistence for individual grants
#[async_trait]
pub trait GrantStore: Send + Sync {
    /// Grants recorded for one (menu, account) pair; no row for a kind means not granted
    async fn list_grants(&self, menu_id: MenuId, account_id: AccountId) -> Result<Vec<PermissionGrant>, StoreError>;

    /// Create-or-update every record in one call; success or failure is for the whole batch
    async fn bulk_upsert(
        &self,
        account_id: AccountId,
        menus: Vec<MenuGrantRecords>,
    ) -> Result<BulkUpsertOutcome, StoreError>;
}

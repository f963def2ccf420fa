use thiserror::Error;

use crate::permissions::model::{AccountId, MenuId};
use crate::store::StoreError;

/// Errors surfaced by the permission matrix subsystem.
///
/// Per-menu grant lookups that fail are recovered during initialization and
/// never show up here.
#[derive(Debug, Error)]
pub enum PermissionError {
    #[error("Menu catalog unavailable: {0}")]
    CatalogUnavailable(#[source] StoreError),

    #[error("Bulk save rejected: {0}")]
    SaveRejected(#[source] StoreError),

    #[error("Grants were saved but the matrix could not be refreshed: {0}")]
    RefreshFailed(#[source] Box<PermissionError>),

    #[error("A save is already in progress for account {0}")]
    SaveInProgress(AccountId),

    #[error("Menu {0} is not part of the matrix")]
    UnknownMenu(MenuId),
}

#[derive(Debug, Error)]
#[error("Unknown permission kind '{0}' (expected create, read, update or delete)")]
pub struct ParseKindError(pub String);

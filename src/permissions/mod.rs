pub mod coordinator;
pub mod error;
pub mod initializer;
pub mod model;
pub mod mutator;
pub mod session;

pub use coordinator::BulkSaveCoordinator;
pub use error::PermissionError;
pub use initializer::{InitializerSettings, MatrixInitializer};
pub use model::{AccountId, GrantId, Menu, MenuGrants, MenuId, PermissionGrant, PermissionKind, PermissionMatrix};
pub use session::PermissionSession;

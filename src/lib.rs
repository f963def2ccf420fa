pub mod cli;
pub mod config;
pub mod error;
pub mod permissions;
pub mod server;
pub mod store;

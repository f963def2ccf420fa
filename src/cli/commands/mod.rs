pub mod menus;
pub mod permissions;

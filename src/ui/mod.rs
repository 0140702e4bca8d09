pub mod chat;
pub mod config_tab;
pub mod messages;
pub mod sidebar;
pub mod status_tab;
pub mod tools;

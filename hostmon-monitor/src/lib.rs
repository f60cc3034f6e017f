pub mod monitor;
pub mod pidfile;
pub mod provider_manager;
pub mod provision;
pub mod reporter;

//! Command implementations for harpoon-cli

pub mod changes;
pub mod config;
pub mod systemd;

pub use changes::run_changes;
pub use config::{run_restore_config, run_sync_config};
pub use systemd::{SystemdArgs, run_systemd};

//! Engine settings and remote configuration sync
//!
//! [`Settings`] describes where the agent keeps its configuration and which
//! helper image and container runtime it uses. [`ConfigSyncer`] keeps the
//! local configuration file in step with a remote URL, taking a backup of
//! the previous version before every replacement.

pub mod error;
pub mod fetch;
pub mod settings;
pub mod syncer;

pub use error::{Error, Result};
pub use fetch::{Fetch, HttpFetcher};
pub use settings::Settings;
pub use syncer::{ConfigPaths, ConfigSyncer};

//! Error types for harpoon-config

use std::path::PathBuf;

/// Result type for harpoon-config operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in harpoon-config operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unable to parse config file url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("Could not copy {primary} to path {backup}: {source}")]
    Backup {
        primary: PathBuf,
        backup: PathBuf,
        #[source]
        source: harpoon_fs::Error,
    },

    #[error("Unable to write new config contents to {path}, backup remains at {backup}: {source}")]
    Write {
        path: PathBuf,
        backup: PathBuf,
        #[source]
        source: harpoon_fs::Error,
    },

    #[error("No config backup found at {path}")]
    NoBackup { path: PathBuf },

    #[error("Failed to parse settings at {path}: {message}")]
    SettingsParse { path: PathBuf, message: String },

    #[error("Filesystem error: {0}")]
    Fs(#[from] harpoon_fs::Error),
}

impl Error {
    pub(crate) fn transport(url: &url::Url, message: impl Into<String>) -> Self {
        Self::Transport {
            url: url.to_string(),
            message: message.into(),
        }
    }
}

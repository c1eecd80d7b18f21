//! Error types for harpoon-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from harpoon-config
    #[error(transparent)]
    Config(#[from] harpoon_config::Error),

    /// Error from harpoon-git
    #[error(transparent)]
    Git(#[from] harpoon_git::Error),

    /// Error from harpoon-engine
    #[error(transparent)]
    Engine(#[from] harpoon_engine::Error),

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    /// Create a new user error with the given message
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }
}

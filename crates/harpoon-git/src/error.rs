//! Error types for harpoon-git

use std::fmt;
use std::path::PathBuf;

/// Result type for harpoon-git operations
pub type Result<T> = std::result::Result<T, Error>;

/// The step of history resolution that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Head,
    Commit,
    Tree,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Head => "head",
            Self::Commit => "commit",
            Self::Tree => "tree",
        })
    }
}

/// Errors that can occur in harpoon-git operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Error when retrieving {stage}: {source}")]
    Resolution {
        stage: Stage,
        #[source]
        source: git2::Error,
    },

    #[error("Failed to read content of {path}: {source}")]
    ContentRead {
        path: PathBuf,
        #[source]
        source: git2::Error,
    },

    #[error("Content of {path} is not valid UTF-8")]
    NonUtf8Content { path: PathBuf },
}

impl Error {
    pub(crate) fn resolution(stage: Stage) -> impl FnOnce(git2::Error) -> Self {
        move |source| Self::Resolution { stage, source }
    }
}

//! Change detection over git history
//!
//! Resolves the trees to compare between two points in history, lists the
//! paths that changed, narrows them by suffix tags, and reads the new
//! content of each change.

pub mod change;
pub mod error;
pub mod tags;
pub mod tree;

pub use change::{Change, ChangeKind, changed_paths, extract_content, list_changes};
pub use error::{Error, Result, Stage};
pub use tags::matches;
pub use tree::{find_commit, resolve_tree};

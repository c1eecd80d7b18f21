//! Git repositories with scripted history.
//!
//! Commits are made through `git2` so tests do not depend on a `git` binary
//! or on the user's global git configuration.

use std::fs;
use std::path::Path;

use git2::{Oid, Repository, Signature};
use tempfile::TempDir;

/// A temporary git repository that tests append commits to.
///
/// # Example
///
/// ```rust,no_run
/// use harpoon_test_utils::git::TestHistory;
///
/// let history = TestHistory::new();
/// let first = history.commit("add unit", &[("systemd/httpd.service", Some("[Unit]"))]);
/// let second = history.commit("drop unit", &[("systemd/httpd.service", None)]);
/// assert_ne!(first, second);
/// ```
pub struct TestHistory {
    temp_dir: TempDir,
    repo: Repository,
}

impl Default for TestHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHistory {
    /// Initialise an empty repository (no commits, unborn HEAD).
    ///
    /// # Panics
    /// Panics if the temp dir or repository cannot be created.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap_or_else(|e| panic!("TestHistory: temp dir: {e}"));
        let repo = Repository::init(temp_dir.path())
            .unwrap_or_else(|e| panic!("TestHistory: failed to init repository: {e}"));
        Self { temp_dir, repo }
    }

    /// Root of the working tree.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// The underlying repository handle.
    pub fn repo(&self) -> &Repository {
        &self.repo
    }

    /// Open a second, independent handle on the same repository.
    ///
    /// # Panics
    /// Panics if the repository cannot be opened.
    pub fn reopen(&self) -> Repository {
        Repository::open(self.root())
            .unwrap_or_else(|e| panic!("TestHistory::reopen: {e}"))
    }

    /// Apply `edits` to the working tree and commit them on top of HEAD.
    ///
    /// Each edit is `(path, Some(content))` to write a file or
    /// `(path, None)` to delete it. Returns the new commit id.
    ///
    /// # Panics
    /// Panics if any filesystem or git operation fails.
    pub fn commit(&self, message: &str, edits: &[(&str, Option<&str>)]) -> Oid {
        self.commit_bytes(
            message,
            &edits
                .iter()
                .map(|(path, content)| (*path, content.map(str::as_bytes)))
                .collect::<Vec<_>>(),
        )
    }

    /// Like [`TestHistory::commit`] but with raw byte contents.
    ///
    /// # Panics
    /// Panics if any filesystem or git operation fails.
    pub fn commit_bytes(&self, message: &str, edits: &[(&str, Option<&[u8]>)]) -> Oid {
        let mut index = self
            .repo
            .index()
            .unwrap_or_else(|e| panic!("TestHistory::commit: index: {e}"));

        for (rel, content) in edits {
            let full = self.root().join(rel);
            match content {
                Some(bytes) => {
                    if let Some(parent) = full.parent() {
                        fs::create_dir_all(parent)
                            .unwrap_or_else(|e| panic!("TestHistory::commit: mkdir: {e}"));
                    }
                    fs::write(&full, bytes)
                        .unwrap_or_else(|e| panic!("TestHistory::commit: write {rel}: {e}"));
                    index
                        .add_path(Path::new(rel))
                        .unwrap_or_else(|e| panic!("TestHistory::commit: add {rel}: {e}"));
                }
                None => {
                    let _ = fs::remove_file(&full);
                    index
                        .remove_path(Path::new(rel))
                        .unwrap_or_else(|e| panic!("TestHistory::commit: remove {rel}: {e}"));
                }
            }
        }

        index
            .write()
            .unwrap_or_else(|e| panic!("TestHistory::commit: write index: {e}"));
        let tree_id = index
            .write_tree()
            .unwrap_or_else(|e| panic!("TestHistory::commit: write tree: {e}"));
        let tree = self
            .repo
            .find_tree(tree_id)
            .unwrap_or_else(|e| panic!("TestHistory::commit: find tree: {e}"));

        let signature = Signature::now("Test User", "test@test.com")
            .unwrap_or_else(|e| panic!("TestHistory::commit: signature: {e}"));

        let parent = self
            .repo
            .head()
            .ok()
            .and_then(|head| head.peel_to_commit().ok());
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

        self.repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
            .unwrap_or_else(|e| panic!("TestHistory::commit: commit: {e}"))
    }
}

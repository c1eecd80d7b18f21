//! Changed paths between two trees and their new content.

use std::path::{Path, PathBuf};

use git2::{Delta, DiffFindOptions, DiffOptions, FileMode, Oid, Repository, Tree};

use crate::{Error, Result, tags};

/// How a path changed between two trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
    Renamed,
}

/// One changed path at one commit boundary.
///
/// `from` is the blob before the change and `to` the blob after it; a
/// deletion has no `to`, an addition has no `from`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub kind: ChangeKind,
    /// Path after the change (the removed path for deletions)
    pub path: PathBuf,
    /// Previous path, set only for renames
    pub old_path: Option<PathBuf>,
    pub from: Option<Oid>,
    pub to: Option<Oid>,
}

impl Change {
    pub fn is_deletion(&self) -> bool {
        self.to.is_none()
    }

    /// The path as git spells it, with forward slashes.
    pub fn path_str(&self) -> String {
        self.path.to_string_lossy().replace('\\', "/")
    }
}

/// List every changed file between `old_tree` and `new_tree`.
///
/// `None` for the old tree diffs against the empty tree, so on a first run
/// every tracked file shows up as an addition. Renames are detected and
/// reported as a single [`ChangeKind::Renamed`] entry. Submodule entries
/// carry no content and are skipped.
pub fn list_changes(
    repo: &Repository,
    old_tree: Option<&Tree<'_>>,
    new_tree: &Tree<'_>,
) -> Result<Vec<Change>> {
    let mut opts = DiffOptions::new();
    opts.include_typechange(true);
    let mut diff = repo.diff_tree_to_tree(old_tree, Some(new_tree), Some(&mut opts))?;

    let mut find = DiffFindOptions::new();
    find.renames(true);
    diff.find_similar(Some(&mut find))?;

    let mut changes = Vec::new();
    for delta in diff.deltas() {
        let kind = match delta.status() {
            Delta::Added | Delta::Copied => ChangeKind::Added,
            Delta::Modified | Delta::Typechange => ChangeKind::Modified,
            Delta::Deleted => ChangeKind::Deleted,
            Delta::Renamed => ChangeKind::Renamed,
            _ => continue,
        };

        let old_file = delta.old_file();
        let new_file = delta.new_file();
        if old_file.mode() == FileMode::Commit || new_file.mode() == FileMode::Commit {
            continue;
        }

        let side = if kind == ChangeKind::Deleted {
            &old_file
        } else {
            &new_file
        };
        let Some(path) = side.path().map(Path::to_path_buf) else {
            continue;
        };

        let from = (kind != ChangeKind::Added).then(|| old_file.id());
        let to = (kind != ChangeKind::Deleted).then(|| new_file.id());
        let old_path = (kind == ChangeKind::Renamed)
            .then(|| old_file.path().map(Path::to_path_buf))
            .flatten();

        changes.push(Change {
            kind,
            path,
            old_path,
            from: from.filter(|id| !id.is_zero()),
            to: to.filter(|id| !id.is_zero()),
        });
    }

    tracing::debug!(count = changes.len(), "Listed changes");
    Ok(changes)
}

/// Keep only the changes whose path matches one of `tags`.
pub fn changed_paths<'a>(changes: &'a [Change], tags: Option<&[String]>) -> Vec<&'a Change> {
    changes
        .iter()
        .filter(|change| tags::matches(tags, &change.path_str()))
        .collect()
}

/// Read the post-change content of `change`.
///
/// Returns `None` for a deletion or when no change is given. Blobs that are
/// not UTF-8 fail with [`Error::NonUtf8Content`] rather than being returned
/// lossily; callers listing many changes can skip that error per path.
pub fn extract_content(repo: &Repository, change: Option<&Change>) -> Result<Option<String>> {
    let Some(change) = change else {
        return Ok(None);
    };
    let Some(to) = change.to else {
        return Ok(None);
    };

    let blob = repo.find_blob(to).map_err(|source| Error::ContentRead {
        path: change.path.clone(),
        source,
    })?;

    String::from_utf8(blob.content().to_vec())
        .map(Some)
        .map_err(|_| Error::NonUtf8Content {
            path: change.path.clone(),
        })
}

//! Tree resolution between observed commits.

use git2::{Commit, Repository, Tree};

use crate::{Error, Result, Stage};

/// Resolve the tree to compare against.
///
/// With a previously observed commit, returns that commit's tree and no new
/// commit: the caller already knows it. Without one, resolves HEAD and
/// returns its tree together with the HEAD commit, which the caller keeps
/// as the baseline for the next comparison.
pub fn resolve_tree<'repo>(
    repo: &'repo Repository,
    old_commit: Option<&Commit<'repo>>,
) -> Result<(Tree<'repo>, Option<Commit<'repo>>)> {
    if let Some(commit) = old_commit {
        let tree = commit.tree().map_err(Error::resolution(Stage::Tree))?;
        return Ok((tree, None));
    }

    let head = repo.head().map_err(Error::resolution(Stage::Head))?;
    let new_commit = head
        .peel_to_commit()
        .map_err(Error::resolution(Stage::Commit))?;
    let tree = new_commit
        .tree()
        .map_err(Error::resolution(Stage::Tree))?;

    tracing::debug!(commit = %new_commit.id(), "Resolved HEAD");
    Ok((tree, Some(new_commit)))
}

/// Look up a commit by any revision git understands (full or short sha,
/// branch, tag).
pub fn find_commit<'repo>(repo: &'repo Repository, rev: &str) -> Result<Commit<'repo>> {
    repo.revparse_single(rev)
        .and_then(|object| object.peel_to_commit())
        .map_err(Error::resolution(Stage::Commit))
}

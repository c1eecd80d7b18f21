//! Changes command implementation

use std::path::Path;

use colored::Colorize;
use git2::Repository;
use harpoon_git::{Change, ChangeKind};

use crate::error::Result;

/// List the files changed between `since` (or nothing) and HEAD.
pub fn run_changes(
    repo_path: &Path,
    since: Option<&str>,
    tags: &[String],
    show_content: bool,
) -> Result<()> {
    let repo = Repository::open(repo_path).map_err(harpoon_git::Error::from)?;

    let (head_tree, head_commit) = harpoon_git::resolve_tree(&repo, None)?;
    let old_tree = match since {
        Some(rev) => {
            let commit = harpoon_git::find_commit(&repo, rev)?;
            Some(harpoon_git::resolve_tree(&repo, Some(&commit))?.0)
        }
        None => None,
    };

    let changes = harpoon_git::list_changes(&repo, old_tree.as_ref(), &head_tree)?;
    let tags = (!tags.is_empty()).then_some(tags);
    let selected = harpoon_git::changed_paths(&changes, tags);

    if let Some(commit) = &head_commit {
        tracing::debug!(head = %commit.id(), total = changes.len(), "Changes listed");
    }

    if selected.is_empty() {
        println!("{}", "No changes".dimmed());
        return Ok(());
    }

    for change in selected {
        println!("{} {}", marker(change.kind), describe(change));
        if !show_content {
            continue;
        }
        match harpoon_git::extract_content(&repo, Some(change)) {
            Ok(Some(content)) => {
                for line in content.lines() {
                    println!("    {line}");
                }
            }
            Ok(None) => {}
            Err(harpoon_git::Error::NonUtf8Content { path }) => {
                tracing::warn!(path = %path.display(), "Skipping content that is not UTF-8");
                println!("    {}", "(binary content not shown)".dimmed());
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

fn marker(kind: ChangeKind) -> colored::ColoredString {
    match kind {
        ChangeKind::Added => "A".green(),
        ChangeKind::Modified => "M".yellow(),
        ChangeKind::Deleted => "D".red(),
        ChangeKind::Renamed => "R".cyan(),
    }
}

fn describe(change: &Change) -> String {
    match &change.old_path {
        Some(old) => format!(
            "{} -> {}",
            old.to_string_lossy().replace('\\', "/"),
            change.path_str()
        ),
        None => change.path_str(),
    }
}

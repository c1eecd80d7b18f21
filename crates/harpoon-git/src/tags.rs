//! Suffix tag filtering for changed paths.

/// Whether `name` is relevant under the optional tag allow-list.
///
/// No list means everything matches. Otherwise `name` must end with at least
/// one of the tags; this is a plain suffix test, not a glob or substring.
pub fn matches(tags: Option<&[String]>, name: &str) -> bool {
    match tags {
        None => true,
        Some(tags) => tags.iter().any(|tag| name.ends_with(tag.as_str())),
    }
}

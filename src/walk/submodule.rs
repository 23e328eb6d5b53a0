use url::Url;

use super::WalkError;
use crate::provider::{ContentEntry, RepoCoordinate};

/// Remote URL of the first listed entry that is a followable submodule
pub fn find_submodule_url(entries: &[ContentEntry]) -> Option<&str> {
    entries.iter().find_map(|e| e.submodule_url())
}

/// Map a submodule remote URL such as `https://github.com/org/sub.git`
/// to the repository it points at.
///
/// The second and third path components are taken as owner and
/// repository; a trailing `.git` is stripped from the latter.
pub fn submodule_target(url: &str) -> Result<RepoCoordinate, WalkError> {
    let parsed = Url::parse(url).map_err(|source| WalkError::MalformedSubmoduleUrl {
        url: url.to_string(),
        source,
    })?;

    let parts: Vec<&str> = parsed.path().split('/').collect();
    if parts.len() < 3 {
        return Err(WalkError::UnexpectedUrlFormat {
            url: url.to_string(),
        });
    }

    let owner = parts[1];
    let repo = parts[2].strip_suffix(".git").unwrap_or(parts[2]);
    if owner.is_empty() || repo.is_empty() {
        return Err(WalkError::UnexpectedUrlFormat {
            url: url.to_string(),
        });
    }

    Ok(RepoCoordinate::new(owner, repo))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::EntryKind;

    fn entry(name: &str, kind: EntryKind, url: Option<&str>) -> ContentEntry {
        ContentEntry {
            name: name.to_string(),
            path: name.to_string(),
            kind,
            submodule_git_url: url.map(String::from),
            sha: None,
        }
    }

    #[test]
    fn test_https_url() {
        let target = submodule_target("https://github.com/org/sub.git").unwrap();
        assert_eq!(target, RepoCoordinate::new("org", "sub"));
    }

    #[test]
    fn test_url_without_git_suffix() {
        let target = submodule_target("https://github.com/org/sub").unwrap();
        assert_eq!(target, RepoCoordinate::new("org", "sub"));
    }

    #[test]
    fn test_extra_path_segments_are_ignored() {
        let target = submodule_target("https://git.example.com/org/sub.git/tree/main").unwrap();
        assert_eq!(target, RepoCoordinate::new("org", "sub"));
    }

    #[test]
    fn test_malformed_url() {
        let err = submodule_target("not-a-url").unwrap_err();
        assert!(matches!(err, WalkError::MalformedSubmoduleUrl { .. }));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_scp_style_url_is_malformed() {
        let err = submodule_target("git@github.com:org/sub.git").unwrap_err();
        assert!(matches!(err, WalkError::MalformedSubmoduleUrl { .. }));
    }

    #[test]
    fn test_missing_repo_segment() {
        let err = submodule_target("https://github.com/org").unwrap_err();
        assert!(matches!(err, WalkError::UnexpectedUrlFormat { .. }));

        let err = submodule_target("https://github.com/org/").unwrap_err();
        assert!(matches!(err, WalkError::UnexpectedUrlFormat { .. }));
    }

    #[test]
    fn test_find_submodule_url_skips_entries_without_url() {
        let entries = vec![
            entry("src", EntryKind::Dir, None),
            entry("broken", EntryKind::Submodule, None),
            entry("vendor", EntryKind::Submodule, Some("https://github.com/org/vendor.git")),
        ];
        assert_eq!(
            find_submodule_url(&entries),
            Some("https://github.com/org/vendor.git")
        );
        assert!(find_submodule_url(&entries[..2]).is_none());
    }
}

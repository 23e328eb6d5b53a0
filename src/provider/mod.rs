mod memory;

pub use memory::{Manifest, ManifestNode, MemoryProvider, ProviderCallRecord};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifies a hosted repository as an (owner, name) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoCoordinate {
    pub owner: String,
    pub repo: String,
}

impl RepoCoordinate {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }
}

impl fmt::Display for RepoCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

impl FromStr for RepoCoordinate {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.split_once('/') {
            Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
                Ok(Self::new(owner, repo))
            }
            _ => Err(anyhow::anyhow!("Expected OWNER/REPO, got '{}'", s)),
        }
    }
}

/// Options forwarded untouched to every provider call of one resolution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkOptions {
    /// Branch, tag or commit to read from (provider default when unset)
    pub reference: Option<String>,
}

/// Type of an entry in a directory listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
    Submodule,
    Symlink,
}

/// One child of a listed directory, as returned by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentEntry {
    pub name: String,
    /// Full path within the repository
    pub path: String,
    pub kind: EntryKind,
    /// Remote URL of the linked repository, set only for submodules
    pub submodule_git_url: Option<String>,
    pub sha: Option<String>,
}

impl ContentEntry {
    /// The remote URL if this entry is a submodule that can be followed
    pub fn submodule_url(&self) -> Option<&str> {
        match (self.kind, self.submodule_git_url.as_deref()) {
            (EntryKind::Submodule, Some(url)) if !url.is_empty() => Some(url),
            _ => None,
        }
    }
}

/// Descriptor of a single file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContent {
    pub name: String,
    pub path: String,
    pub kind: EntryKind,
    pub size: u64,
    pub sha: Option<String>,
    pub content: Option<String>,
}

/// What the provider returned for a path: one file, or a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Contents {
    File(FileContent),
    Dir(Vec<ContentEntry>),
}

impl Contents {
    /// The listing, if the path was a directory
    pub fn entries(&self) -> Option<&[ContentEntry]> {
        match self {
            Contents::Dir(entries) => Some(entries),
            Contents::File(_) => None,
        }
    }
}

/// Transport-level response metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseMeta {
    /// HTTP-like status code
    pub status: u16,
}

impl ResponseMeta {
    pub const OK: u16 = 200;
    pub const NOT_FOUND: u16 = 404;

    pub fn ok() -> Self {
        Self { status: Self::OK }
    }

    /// Synthesized "missing" response
    pub fn not_found() -> Self {
        Self {
            status: Self::NOT_FOUND,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status == Self::NOT_FOUND
    }
}

/// A failed provider call (transport, auth, rate limit, missing path)
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ProviderError {
    pub message: String,
    /// Response metadata, when the failure got as far as a response
    pub meta: Option<ResponseMeta>,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            meta: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.meta = Some(ResponseMeta { status });
        self
    }
}

/// Trait for content provider implementations
/// Providers list one directory, or fetch one file, per call
#[async_trait::async_trait]
pub trait ContentProvider: Send + Sync {
    /// Get the provider name
    fn name(&self) -> &str;

    /// Fetch the contents at `path` ("" is the repository root).
    /// The provider decides whether the path is a file or a directory.
    async fn get_contents(
        &self,
        repo: &RepoCoordinate,
        path: &str,
        options: &WalkOptions,
    ) -> Result<(Contents, ResponseMeta), ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_from_str() {
        let coord: RepoCoordinate = "org/sub".parse().unwrap();
        assert_eq!(coord, RepoCoordinate::new("org", "sub"));
        assert_eq!(coord.to_string(), "org/sub");

        assert!("org".parse::<RepoCoordinate>().is_err());
        assert!("org/".parse::<RepoCoordinate>().is_err());
        assert!("org/a/b".parse::<RepoCoordinate>().is_err());
    }

    #[test]
    fn test_submodule_url_requires_kind_and_url() {
        let mut entry = ContentEntry {
            name: "vendor".to_string(),
            path: "vendor".to_string(),
            kind: EntryKind::Submodule,
            submodule_git_url: Some("https://github.com/org/sub.git".to_string()),
            sha: None,
        };
        assert_eq!(entry.submodule_url(), Some("https://github.com/org/sub.git"));

        entry.submodule_git_url = Some(String::new());
        assert_eq!(entry.submodule_url(), None);

        entry.submodule_git_url = Some("https://github.com/org/sub.git".to_string());
        entry.kind = EntryKind::Dir;
        assert_eq!(entry.submodule_url(), None);
    }

    #[test]
    fn test_entry_kind_wire_names() {
        let kind: EntryKind = serde_json::from_str("\"submodule\"").unwrap();
        assert_eq!(kind, EntryKind::Submodule);
        assert_eq!(serde_json::to_string(&EntryKind::Dir).unwrap(), "\"dir\"");
    }

    #[test]
    fn test_provider_error_status() {
        let err = ProviderError::new("rate limited").with_status(403);
        assert_eq!(err.meta, Some(ResponseMeta { status: 403 }));
        assert_eq!(err.to_string(), "rate limited");
        assert!(ResponseMeta::not_found().is_not_found());
    }
}

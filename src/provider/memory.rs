use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Mutex;

use super::{
    ContentEntry, ContentProvider, Contents, EntryKind, FileContent, ProviderError,
    RepoCoordinate, ResponseMeta, WalkOptions,
};
use crate::walk::RepoPath;

/// A node in a manifest tree
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ManifestNode {
    File {
        #[serde(default)]
        content: String,
        #[serde(default)]
        sha: Option<String>,
    },
    Dir,
    Submodule {
        url: String,
        #[serde(default)]
        sha: Option<String>,
    },
    Symlink {
        target: String,
    },
}

impl ManifestNode {
    fn kind(&self) -> EntryKind {
        match self {
            ManifestNode::File { .. } => EntryKind::File,
            ManifestNode::Dir => EntryKind::Dir,
            ManifestNode::Submodule { .. } => EntryKind::Submodule,
            ManifestNode::Symlink { .. } => EntryKind::Symlink,
        }
    }
}

/// JSON description of a set of repositories.
///
/// ```json
/// { "repos": { "owner/repo": { "docs/guide.md": { "type": "file", "content": "..." } } } }
/// ```
///
/// Directories implied by deeper paths do not need their own entry.
#[derive(Debug, Default, Deserialize)]
pub struct Manifest {
    pub repos: BTreeMap<String, BTreeMap<String, ManifestNode>>,
}

/// A single call made against a [`MemoryProvider`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderCallRecord {
    pub repo: RepoCoordinate,
    pub path: String,
    pub reference: Option<String>,
}

/// In-memory content provider over any number of repositories.
///
/// Used by the CLI to serve manifest files and by tests as a scripted
/// collaborator: every call is logged, and individual paths can be made
/// to fail with a given status.
#[derive(Debug, Default)]
pub struct MemoryProvider {
    repos: HashMap<RepoCoordinate, BTreeMap<String, ManifestNode>>,
    failures: HashMap<(RepoCoordinate, String), u16>,
    calls: Mutex<Vec<ProviderCallRecord>>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a provider from a parsed manifest
    pub fn from_manifest(manifest: Manifest) -> Result<Self> {
        let mut provider = Self::new();
        for (coordinate, nodes) in manifest.repos {
            let repo: RepoCoordinate = coordinate
                .parse()
                .context(format!("Invalid repository key in manifest: {}", coordinate))?;
            provider.add_repo(repo.clone());
            for (path, node) in nodes {
                provider.insert(&repo, &path, node);
            }
        }
        Ok(provider)
    }

    /// Parse a JSON manifest
    pub fn from_json(json: &str) -> Result<Self> {
        let manifest: Manifest = serde_json::from_str(json).context("Failed to parse manifest")?;
        Self::from_manifest(manifest)
    }

    /// Load a JSON manifest file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .context(format!("Failed to read manifest: {}", path.display()))?;
        Self::from_json(&json)
    }

    /// Register an empty repository
    pub fn add_repo(&mut self, repo: RepoCoordinate) {
        self.repos.entry(repo).or_default();
    }

    pub fn add_file(&mut self, repo: &RepoCoordinate, path: &str, content: &str) {
        self.insert(
            repo,
            path,
            ManifestNode::File {
                content: content.to_string(),
                sha: None,
            },
        );
    }

    pub fn add_dir(&mut self, repo: &RepoCoordinate, path: &str) {
        self.insert(repo, path, ManifestNode::Dir);
    }

    pub fn add_submodule(&mut self, repo: &RepoCoordinate, path: &str, url: &str) {
        self.insert(
            repo,
            path,
            ManifestNode::Submodule {
                url: url.to_string(),
                sha: None,
            },
        );
    }

    pub fn add_symlink(&mut self, repo: &RepoCoordinate, path: &str, target: &str) {
        self.insert(
            repo,
            path,
            ManifestNode::Symlink {
                target: target.to_string(),
            },
        );
    }

    /// Make every call for `path` in `repo` fail with `status`
    pub fn fail_on(&mut self, repo: &RepoCoordinate, path: &str, status: u16) {
        let path = RepoPath::parse(path).to_string();
        self.failures.insert((repo.clone(), path), status);
    }

    /// Calls made so far, oldest first
    pub fn calls(&self) -> Vec<ProviderCallRecord> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Paths requested so far, oldest first
    pub fn requested_paths(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.path).collect()
    }

    fn insert(&mut self, repo: &RepoCoordinate, path: &str, node: ManifestNode) {
        let path = RepoPath::parse(path);
        let tree = self.repos.entry(repo.clone()).or_default();

        let mut parent = path.parent();
        while let Some(dir) = parent {
            if dir.is_empty() {
                break;
            }
            tree.entry(dir.to_string()).or_insert(ManifestNode::Dir);
            parent = dir.parent();
        }

        if !path.is_empty() {
            tree.insert(path.to_string(), node);
        }
    }

    fn record(&self, repo: &RepoCoordinate, path: &str, options: &WalkOptions) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(ProviderCallRecord {
                repo: repo.clone(),
                path: path.to_string(),
                reference: options.reference.clone(),
            });
        }
    }

    fn list(tree: &BTreeMap<String, ManifestNode>, dir: &RepoPath) -> Vec<ContentEntry> {
        tree.iter()
            .filter_map(|(path, node)| {
                let entry_path = RepoPath::parse(path);
                let parent = entry_path.parent()?;
                if &parent != dir {
                    return None;
                }
                Some(Self::entry(&entry_path, node))
            })
            .collect()
    }

    fn entry(path: &RepoPath, node: &ManifestNode) -> ContentEntry {
        let (submodule_git_url, sha) = match node {
            ManifestNode::Submodule { url, sha } => (Some(url.clone()), sha.clone()),
            ManifestNode::File { sha, .. } => (None, sha.clone()),
            _ => (None, None),
        };
        ContentEntry {
            name: path.filename().unwrap_or_default().to_string(),
            path: path.to_string(),
            kind: node.kind(),
            submodule_git_url,
            sha,
        }
    }

    fn file(path: &RepoPath, node: &ManifestNode) -> FileContent {
        let (size, sha, content) = match node {
            ManifestNode::File { content, sha } => {
                (content.len() as u64, sha.clone(), Some(content.clone()))
            }
            ManifestNode::Symlink { target } => (target.len() as u64, None, Some(target.clone())),
            ManifestNode::Submodule { sha, .. } => (0, sha.clone(), None),
            ManifestNode::Dir => (0, None, None),
        };
        FileContent {
            name: path.filename().unwrap_or_default().to_string(),
            path: path.to_string(),
            kind: node.kind(),
            size,
            sha,
            content,
        }
    }
}

fn not_found(repo: &RepoCoordinate, path: &str) -> ProviderError {
    ProviderError::new(format!("Not Found: {}:{}", repo, path))
        .with_status(ResponseMeta::NOT_FOUND)
}

#[async_trait::async_trait]
impl ContentProvider for MemoryProvider {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get_contents(
        &self,
        repo: &RepoCoordinate,
        path: &str,
        options: &WalkOptions,
    ) -> Result<(Contents, ResponseMeta), ProviderError> {
        self.record(repo, path, options);

        let path = RepoPath::parse(path);
        if let Some(status) = self.failures.get(&(repo.clone(), path.to_string())) {
            return Err(ProviderError::new(format!(
                "Request for {}:{} failed with status {}",
                repo, path, status
            ))
            .with_status(*status));
        }

        let tree = self
            .repos
            .get(repo)
            .ok_or_else(|| not_found(repo, &path.to_string()))?;

        if path.is_empty() {
            return Ok((Contents::Dir(Self::list(tree, &path)), ResponseMeta::ok()));
        }

        match tree.get(&path.to_string()) {
            None => Err(not_found(repo, &path.to_string())),
            Some(ManifestNode::Dir) => {
                Ok((Contents::Dir(Self::list(tree, &path)), ResponseMeta::ok()))
            }
            Some(node) => Ok((Contents::File(Self::file(&path, node)), ResponseMeta::ok())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> RepoCoordinate {
        RepoCoordinate::new("acme", "widgets")
    }

    fn names(contents: &Contents) -> Vec<String> {
        contents
            .entries()
            .unwrap()
            .iter()
            .map(|e| e.name.clone())
            .collect()
    }

    #[tokio::test]
    async fn test_implied_directories_are_listed() {
        let mut provider = MemoryProvider::new();
        provider.add_file(&repo(), "src/walk/mod.rs", "mod walker;");
        provider.add_file(&repo(), "README.md", "hi");

        assert_eq!(provider.name(), "memory");

        let opts = WalkOptions::default();
        let (root, meta) = provider.get_contents(&repo(), "", &opts).await.unwrap();
        assert_eq!(meta, ResponseMeta::ok());
        assert_eq!(names(&root), vec!["README.md", "src"]);

        let (src, _) = provider.get_contents(&repo(), "src", &opts).await.unwrap();
        assert_eq!(names(&src), vec!["walk"]);
        assert_eq!(src.entries().unwrap()[0].kind, EntryKind::Dir);
    }

    #[tokio::test]
    async fn test_file_contents() {
        let mut provider = MemoryProvider::new();
        provider.add_file(&repo(), "docs/guide.md", "# Guide");

        let (contents, _) = provider
            .get_contents(&repo(), "docs/guide.md", &WalkOptions::default())
            .await
            .unwrap();
        match contents {
            Contents::File(file) => {
                assert_eq!(file.name, "guide.md");
                assert_eq!(file.path, "docs/guide.md");
                assert_eq!(file.size, 7);
                assert_eq!(file.content.as_deref(), Some("# Guide"));
            }
            other => panic!("expected file, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_path_is_404() {
        let provider = MemoryProvider::from_json(r#"{"repos": {"acme/widgets": {}}}"#).unwrap();
        let err = provider
            .get_contents(&repo(), "nope", &WalkOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.meta, Some(ResponseMeta::not_found()));

        let err = provider
            .get_contents(&RepoCoordinate::new("acme", "other"), "", &WalkOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.meta, Some(ResponseMeta::not_found()));
    }

    #[tokio::test]
    async fn test_scripted_failure_and_call_log() {
        let mut provider = MemoryProvider::new();
        provider.add_dir(&repo(), "a");
        provider.fail_on(&repo(), "a", 502);

        let opts = WalkOptions {
            reference: Some("main".to_string()),
        };
        let err = provider.get_contents(&repo(), "a", &opts).await.unwrap_err();
        assert_eq!(err.meta.map(|m| m.status), Some(502));

        let calls = provider.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].path, "a");
        assert_eq!(calls[0].reference.as_deref(), Some("main"));
    }

    #[test]
    fn test_manifest_submodule_entry() {
        let provider = MemoryProvider::from_json(
            r#"{"repos": {"acme/widgets": {
                "vendor/lib": {"type": "submodule", "url": "https://github.com/org/lib.git"}
            }}}"#,
        )
        .unwrap();

        let tree = provider.repos.get(&repo()).unwrap();
        let entries = MemoryProvider::list(tree, &RepoPath::parse("vendor"));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, EntryKind::Submodule);
        assert_eq!(
            entries[0].submodule_url(),
            Some("https://github.com/org/lib.git")
        );
    }

    #[test]
    fn test_manifest_rejects_bad_repo_key() {
        assert!(MemoryProvider::from_json(r#"{"repos": {"widgets": {}}}"#).is_err());
        assert!(MemoryProvider::from_json("not json").is_err());
    }
}

/// A slash-separated path inside a repository, relative to its root
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RepoPath {
    /// Path segments (e.g., ["docs", "guide.md"])
    segments: Vec<String>,
}

impl RepoPath {
    /// Parse a path string, dropping empty and `.` segments.
    /// Leading and trailing slashes carry no meaning.
    pub fn parse(path: &str) -> Self {
        let segments = path
            .split('/')
            .filter(|s| !s.is_empty() && *s != ".")
            .map(String::from)
            .collect();

        RepoPath { segments }
    }

    /// The repository root
    pub fn root() -> Self {
        Self::default()
    }

    /// Get the path segments
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Check if this path is the root
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Get the parent path, `None` for the root
    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            None
        } else {
            let mut parent_segments = self.segments.clone();
            parent_segments.pop();
            Some(RepoPath {
                segments: parent_segments,
            })
        }
    }

    /// Get the last segment (filename)
    pub fn filename(&self) -> Option<&str> {
        self.segments.last().map(|s| s.as_str())
    }

    /// Split into the containing directory ("" for the root) and the final name
    pub fn split(&self) -> (String, String) {
        let dir = self.parent().map(|p| p.to_string()).unwrap_or_default();
        let name = self.filename().unwrap_or_default().to_string();
        (dir, name)
    }

    /// This path and each of its ancestors below the root, shallowest first.
    /// The root itself is a single level.
    pub fn ancestors(&self) -> Vec<RepoPath> {
        if self.is_empty() {
            return vec![RepoPath::root()];
        }
        let mut paths = Vec::with_capacity(self.segments.len());
        let mut current = Some(self.clone());
        while let Some(path) = current {
            if path.is_empty() {
                break;
            }
            current = path.parent();
            paths.push(path);
        }
        paths.reverse();
        paths
    }
}

impl std::fmt::Display for RepoPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

/// Decompose `path` into the sequence of paths to validate, shallowest
/// ancestor first and `path` itself last.
///
/// `"a/b/c"` gives `["a", "a/b", "a/b/c"]`; a bare name gives just itself,
/// and so does the root (`[""]`).
pub fn decompose(path: &str) -> Vec<String> {
    RepoPath::parse(path)
        .ancestors()
        .iter()
        .map(RepoPath::to_string)
        .collect()
}

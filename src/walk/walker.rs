use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use super::submodule::{find_submodule_url, submodule_target};
use super::{ProviderCall, RepoPath, WalkError, WalkMetrics, WalkerConfig};
use crate::provider::{ContentProvider, Contents, RepoCoordinate, ResponseMeta, WalkOptions};

/// Result of a successful resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// Repository the final fetch ran against; differs from the requested
    /// one when a submodule was followed
    pub repo: RepoCoordinate,
    /// Path of the final fetch
    pub path: String,
    /// Provider response for the final fetch, unchanged
    pub contents: Contents,
    pub meta: ResponseMeta,
}

enum Step {
    Done(Resolved),
    Redirect(RepoCoordinate),
}

/// Resolves nested paths by listing one directory level at a time.
///
/// Every ancestor of the target is checked against its parent's listing,
/// shallowest first, before the target itself is fetched. When a listing
/// contains a submodule, resolution moves to the linked repository.
///
/// Following a submodule restarts resolution at the *root* of the linked
/// repository and whatever remained of the requested path is dropped. The
/// root level is checked like any other: its listing is scanned for further
/// submodules, and since no entry is ever named `""` a root that links
/// nowhere else ends in [`WalkError::NotFound`] for path `""`. Resolving the
/// root directly behaves the same way.
pub struct ContentWalker {
    provider: Arc<dyn ContentProvider>,
    config: WalkerConfig,
    metrics: Option<Arc<WalkMetrics>>,
}

impl ContentWalker {
    pub fn new(provider: Arc<dyn ContentProvider>) -> Self {
        Self {
            provider,
            config: WalkerConfig::default(),
            metrics: None,
        }
    }

    pub fn with_config(mut self, config: WalkerConfig) -> Self {
        self.config = config;
        self
    }

    /// Record provider calls and redirects into `metrics`
    pub fn with_metrics(mut self, metrics: Arc<WalkMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Resolve `path` in `repo`, following submodules.
    ///
    /// The first failing level ends the walk; nothing is retried.
    pub async fn resolve(
        &self,
        cancel: &CancellationToken,
        repo: &RepoCoordinate,
        path: &str,
        options: &WalkOptions,
    ) -> Result<Resolved, WalkError> {
        let mut repo = repo.clone();
        let mut path = RepoPath::parse(path);
        let mut hops = 0;

        loop {
            match self.walk(cancel, &repo, &path, options).await? {
                Step::Done(resolved) => return Ok(resolved),
                Step::Redirect(target) => {
                    if hops >= self.config.max_submodule_hops {
                        return Err(WalkError::SubmoduleDepthExceeded {
                            limit: self.config.max_submodule_hops,
                        });
                    }
                    hops += 1;
                    if let Some(metrics) = &self.metrics {
                        metrics.record_redirect();
                    }
                    repo = target;
                    path = RepoPath::root();
                }
            }
        }
    }

    /// One pass over a single repository
    async fn walk(
        &self,
        cancel: &CancellationToken,
        repo: &RepoCoordinate,
        path: &RepoPath,
        options: &WalkOptions,
    ) -> Result<Step, WalkError> {
        for ancestor in path.ancestors() {
            let (dir, name) = ancestor.split();
            let (contents, meta) = self.fetch(cancel, repo, &dir, options).await?;

            let entries = match contents {
                Contents::Dir(entries) => entries,
                // The parent is not a directory
                Contents::File(_) => {
                    return Err(WalkError::NotFound {
                        repo: repo.clone(),
                        path: ancestor.to_string(),
                        meta,
                    });
                }
            };

            if self.config.follow_submodules {
                if let Some(url) = find_submodule_url(&entries) {
                    return submodule_target(url).map(Step::Redirect);
                }
            }

            if !entries.iter().any(|e| e.name == name) {
                return Err(WalkError::NotFound {
                    repo: repo.clone(),
                    path: ancestor.to_string(),
                    meta: ResponseMeta::not_found(),
                });
            }
        }

        let path = path.to_string();
        let (contents, meta) = self.fetch(cancel, repo, &path, options).await?;
        Ok(Step::Done(Resolved {
            repo: repo.clone(),
            path,
            contents,
            meta,
        }))
    }

    /// A single provider call, abandoned as soon as `cancel` fires
    async fn fetch(
        &self,
        cancel: &CancellationToken,
        repo: &RepoCoordinate,
        path: &str,
        options: &WalkOptions,
    ) -> Result<(Contents, ResponseMeta), WalkError> {
        if cancel.is_cancelled() {
            return Err(WalkError::Cancelled);
        }

        let start = Instant::now();
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = self.provider.get_contents(repo, path, options) => Some(result),
        };

        if let Some(metrics) = &self.metrics {
            let status = match &result {
                Some(Ok((_, meta))) => Some(meta.status),
                Some(Err(err)) => err.meta.map(|m| m.status),
                None => None,
            };
            let failed = !matches!(result, Some(Ok(_)));
            metrics.record_call(
                ProviderCall {
                    repo: repo.clone(),
                    path: path.to_string(),
                    duration: start.elapsed(),
                    status,
                },
                failed,
            );
        }

        match result {
            Some(result) => Ok(result?),
            None => Err(WalkError::Cancelled),
        }
    }
}

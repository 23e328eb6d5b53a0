pub mod error;
pub mod metrics;
pub mod path;
pub mod submodule;
pub mod walker;

pub use error::WalkError;
pub use metrics::{ProviderCall, WalkMetrics};
pub use path::{RepoPath, decompose};
pub use submodule::submodule_target;
pub use walker::{ContentWalker, Resolved};

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::provider::{ContentProvider, RepoCoordinate, WalkOptions};

/// Configuration for a [`ContentWalker`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkerConfig {
    /// Redirect into the linked repository when a listing contains a
    /// submodule. When off, submodules are treated as ordinary entries and
    /// a submodule path resolves to the provider's own submodule descriptor.
    pub follow_submodules: bool,
    /// Maximum number of submodule redirects followed by one resolution
    /// before giving up, so that submodule cycles terminate
    pub max_submodule_hops: usize,
}

impl WalkerConfig {
    pub const DEFAULT_MAX_SUBMODULE_HOPS: usize = 8;
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            follow_submodules: true,
            max_submodule_hops: Self::DEFAULT_MAX_SUBMODULE_HOPS,
        }
    }
}

/// Resolve `path` in `repo` with a default-configured walker
pub async fn resolve_content(
    provider: Arc<dyn ContentProvider>,
    cancel: &CancellationToken,
    repo: &RepoCoordinate,
    path: &str,
    options: &WalkOptions,
) -> Result<Resolved, WalkError> {
    ContentWalker::new(provider)
        .resolve(cancel, repo, path, options)
        .await
}

use thiserror::Error;

use crate::provider::{ProviderError, RepoCoordinate, ResponseMeta};

/// Failure of a path resolution
#[derive(Debug, Error)]
pub enum WalkError {
    /// A path component is absent from its parent's listing, or its parent
    /// turned out not to be a directory
    #[error("Not found: {repo}:{path}")]
    NotFound {
        repo: RepoCoordinate,
        path: String,
        meta: ResponseMeta,
    },

    /// The provider call itself failed
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Malformed submodule URL '{url}': {source}")]
    MalformedSubmoduleUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Unexpected submodule URL format: {url}")]
    UnexpectedUrlFormat { url: String },

    #[error("Resolution cancelled")]
    Cancelled,

    #[error("Gave up after following {limit} submodule redirects")]
    SubmoduleDepthExceeded { limit: usize },
}

impl WalkError {
    /// Response metadata attached to this failure, if any
    pub fn meta(&self) -> Option<ResponseMeta> {
        match self {
            WalkError::NotFound { meta, .. } => Some(*meta),
            WalkError::Provider(err) => err.meta,
            _ => None,
        }
    }

    /// True when the target (or one of its ancestors) does not exist,
    /// whether the walk or the provider noticed it
    pub fn is_not_found(&self) -> bool {
        match self {
            WalkError::NotFound { .. } => true,
            WalkError::Provider(err) => err.meta.is_some_and(|m| m.is_not_found()),
            _ => false,
        }
    }
}

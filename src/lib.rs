//! Resolve nested paths in hosted repositories through a content API that
//! can only list one directory at a time.
//!
//! The walk checks every ancestor of the requested path against its
//! parent's listing before fetching the path itself, so a missing level is
//! reported as such rather than as an ambiguous provider error. Listings
//! that contain a submodule redirect the walk to the linked repository.

pub mod output;
pub mod provider;
pub mod walk;

pub use provider::{
    ContentEntry, ContentProvider, Contents, EntryKind, FileContent, ProviderError,
    RepoCoordinate, ResponseMeta, WalkOptions,
};
pub use walk::{ContentWalker, Resolved, WalkError, WalkerConfig, decompose, resolve_content};

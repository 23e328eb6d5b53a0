//! Metrics collection for path resolution.
//!
//! Thread-safe tracking of the provider calls a walker makes and the
//! submodule redirects it follows. One collector may be shared by any
//! number of concurrent resolutions.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::provider::RepoCoordinate;

/// Record of a single provider call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderCall {
    pub repo: RepoCoordinate,
    pub path: String,
    /// Duration of the call
    pub duration: Duration,
    /// Response status, `None` if the call failed before a response
    /// or was cancelled
    pub status: Option<u16>,
}

/// Collector for walk metrics
#[derive(Debug, Default)]
pub struct WalkMetrics {
    /// Total number of provider calls
    call_count: AtomicUsize,
    /// Calls that returned an error
    failed_calls: AtomicUsize,
    /// Submodule redirects followed
    redirects: AtomicUsize,
    /// Total time spent in provider calls (nanoseconds)
    total_call_time_ns: AtomicU64,
    /// Individual call records, in order
    calls: RwLock<Vec<ProviderCall>>,
}

impl WalkMetrics {
    /// Create a new metrics collector wrapped in Arc for sharing
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Record a completed provider call
    pub fn record_call(&self, call: ProviderCall, failed: bool) {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.failed_calls.fetch_add(1, Ordering::Relaxed);
        }
        self.total_call_time_ns
            .fetch_add(call.duration.as_nanos() as u64, Ordering::Relaxed);

        if let Ok(mut calls) = self.calls.write() {
            calls.push(call);
        }
    }

    /// Record a submodule redirect
    pub fn record_redirect(&self) {
        self.redirects.fetch_add(1, Ordering::Relaxed);
    }

    /// Get provider call count
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Get failed provider call count
    pub fn failed_calls(&self) -> usize {
        self.failed_calls.load(Ordering::Relaxed)
    }

    /// Get number of submodule redirects followed
    pub fn redirects(&self) -> usize {
        self.redirects.load(Ordering::Relaxed)
    }

    /// Get total time spent waiting on the provider
    pub fn total_call_time(&self) -> Duration {
        Duration::from_nanos(self.total_call_time_ns.load(Ordering::Relaxed))
    }

    /// Get all individual call records
    pub fn calls(&self) -> Vec<ProviderCall> {
        self.calls.read().map(|c| c.clone()).unwrap_or_default()
    }

    /// Reset all metrics
    pub fn reset(&self) {
        self.call_count.store(0, Ordering::Relaxed);
        self.failed_calls.store(0, Ordering::Relaxed);
        self.redirects.store(0, Ordering::Relaxed);
        self.total_call_time_ns.store(0, Ordering::Relaxed);
        if let Ok(mut calls) = self.calls.write() {
            calls.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(path: &str, millis: u64, status: Option<u16>) -> ProviderCall {
        ProviderCall {
            repo: RepoCoordinate::new("acme", "widgets"),
            path: path.to_string(),
            duration: Duration::from_millis(millis),
            status,
        }
    }

    #[test]
    fn test_metrics_tracking() {
        let metrics = WalkMetrics::new();

        metrics.record_call(call("", 50, Some(200)), false);
        metrics.record_call(call("a", 100, Some(404)), true);
        metrics.record_redirect();

        assert_eq!(metrics.call_count(), 2);
        assert_eq!(metrics.failed_calls(), 1);
        assert_eq!(metrics.redirects(), 1);
        assert_eq!(metrics.total_call_time(), Duration::from_millis(150));

        let calls = metrics.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].path, "");
        assert_eq!(calls[1].status, Some(404));
    }

    #[test]
    fn test_metrics_reset() {
        let metrics = WalkMetrics::new();

        metrics.record_call(call("", 50, Some(200)), false);
        metrics.record_redirect();
        assert_eq!(metrics.call_count(), 1);

        metrics.reset();
        assert_eq!(metrics.call_count(), 0);
        assert_eq!(metrics.redirects(), 0);
        assert_eq!(metrics.total_call_time(), Duration::ZERO);
        assert!(metrics.calls().is_empty());
    }
}

//! Shared test utilities for integration and chaos tests.
//!
//! This module provides:
//! - A recording observer for delivery assertions
//! - A wiremock-backed HTTP origin
//! - Cache directory helpers

#![allow(dead_code)] // Not every test binary uses every helper

pub mod origin_server;
pub mod recorder;

pub use origin_server::*;
pub use recorder::*;

use data_replicator::{Endpoint, FileCache};
use std::path::Path;
use std::time::{Duration, SystemTime};

/// Endpoint nothing listens on (discard port), for "origin down" scenarios.
pub const UNREACHABLE_ENDPOINT: &str = "http://127.0.0.1:9/app.properties";

/// Install a test log writer once. Honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A cache for `endpoint` rooted at `dir`, as a job with the same settings would open it.
pub fn cache_for(dir: &Path, endpoint: &str, max_age: Duration) -> FileCache {
    FileCache::new(dir, Endpoint::parse(endpoint).unwrap(), max_age)
}

/// Pre-populate the cache for `endpoint` with one artifact.
pub fn seed_cache(dir: &Path, endpoint: &str, content: &[u8]) -> std::path::PathBuf {
    cache_for(dir, endpoint, Duration::from_secs(3600)).commit(content).unwrap()
}

/// Backdate a file's modification time.
pub fn age_file(path: &Path, by: Duration) {
    let file = std::fs::File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::now() - by).unwrap();
}

/// Number of files in the cache's artifact directory.
pub fn files_in(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}

/// Poll `condition` every 10ms until it holds or `timeout` passes.
pub async fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

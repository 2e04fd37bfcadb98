// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Error types for the data replicator.
//!
//! Errors are split by the component that raised them so callers (and tests)
//! can tell a dead origin from an expired cache or a rejecting observer.
//!
//! # Error Categories
//!
//! | Error Type | Retryable | Description |
//! |------------|-----------|-------------|
//! | `Config` | No | Unsupported scheme or unusable configuration |
//! | `Origin` | Yes | Origin unreachable, resource missing, bad HTTP status |
//! | `Cache` | Yes | Cache artifact missing, expired or unreadable |
//! | `Observer` | Yes | The registered observer rejected the data |
//!
//! # Propagation
//!
//! Only construction of a [`ReplicationJob`](crate::ReplicationJob) ever
//! returns these to the caller. Once a job is running, every failure is
//! logged and recorded in the job status, and the next tick tries again.
//! Cache *writes* never produce an error at all: see
//! [`FileCache::update`](crate::cache::FileCache::update).

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for replication operations.
pub type Result<T> = std::result::Result<T, ReplicationError>;

/// Boxed error returned by observer callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error of the data replicator.
#[derive(Error, Debug)]
pub enum ReplicationError {
    /// Invalid configuration, e.g. an endpoint with an unsupported scheme.
    ///
    /// Fatal at job construction, never retried.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Loading from the configured origin failed.
    #[error(transparent)]
    Origin(#[from] OriginError),

    /// Loading from the local file cache failed.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The observer rejected the delivered data.
    #[error(transparent)]
    Observer(#[from] ObserverError),
}

impl ReplicationError {
    /// Check if the next refresh cycle can recover from this error.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Config(_) => false,
            Self::Origin(_) => true,
            Self::Cache(_) => true,
            Self::Observer(_) => true,
        }
    }

    /// Short label used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Origin(_) => "origin",
            Self::Cache(_) => "cache",
            Self::Observer(_) => "observer",
        }
    }
}

/// Failures of bundled, file and HTTP origins.
#[derive(Error, Debug)]
pub enum OriginError {
    /// The resource does not exist at the origin.
    #[error("{endpoint}: {what} not found")]
    NotFound { endpoint: String, what: String },

    /// The origin could not be reached or read.
    #[error("{endpoint}: {message}")]
    Unreachable {
        endpoint: String,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The server answered with a status that is neither 2xx nor 304.
    #[error("{endpoint}: got HTTP {status}")]
    Status { endpoint: String, status: u16 },

    /// 304 received although no conditional request was sent.
    #[error("{endpoint}: got HTTP 304 for a non-conditional request")]
    UnexpectedNotModified { endpoint: String },

    /// The response could not be interpreted (e.g. unknown charset).
    #[error("{endpoint}: malformed response: {message}")]
    Malformed { endpoint: String, message: String },

    /// The origin has been closed and its transport released.
    #[error("{endpoint}: origin is closed")]
    Closed { endpoint: String },
}

impl OriginError {
    /// Build an `Unreachable` error from any source error.
    pub fn unreachable(
        endpoint: impl Into<String>,
        message: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::Unreachable {
            endpoint: endpoint.into(),
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

/// Failures of the file cache when it is read as an origin.
#[derive(Error, Debug)]
pub enum CacheError {
    /// No artifact exists for this endpoint.
    #[error("no cache artifact for {endpoint} in {}", dir.display())]
    Empty { endpoint: String, dir: PathBuf },

    /// The newest artifact is older than the max cache age.
    #[error("cache artifact {} is expired (age {age_secs}s)", path.display())]
    Expired { path: PathBuf, age_secs: u64 },

    /// Filesystem error while scanning, reading or writing the cache.
    #[error("cache I/O failed on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// The observer callback failed.
#[derive(Error, Debug)]
pub enum ObserverError {
    /// The callback returned an error.
    #[error("observer rejected data: {0}")]
    Rejected(#[source] BoxError),

    /// The callback panicked.
    #[error("observer panicked: {0}")]
    Panicked(String),
}

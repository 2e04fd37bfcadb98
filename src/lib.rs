//! # Data Replicator
//!
//! Keeps a local consumer supplied with the current content of one remote
//! resource, and keeps working when the remote side is down.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────────────┐
//! │                          ReplicationJob (per endpoint)                    │
//! │                                                                           │
//! │  ┌──────────────────┐    ┌────────────────┐    ┌──────────────────────┐   │
//! │  │ Origin           │───►│ ChangeDetector │───►│ Observer callback    │   │
//! │  │ bundle/file/http │    │ (fingerprint)  │    │ (bytes or text)      │   │
//! │  └──────────────────┘    └────────────────┘    └──────────────────────┘   │
//! │           │  success                                      ▲               │
//! │           ▼                                               │ startup       │
//! │  ┌─────────────────────────────────────────┐              │ fallback      │
//! │  │ FileCache (timestamped artifacts,       │──────────────┘               │
//! │  │ atomic commit, retention cleanup)       │                              │
//! │  └─────────────────────────────────────────┘                              │
//! └───────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Cycle
//!
//! Every cycle loads the resource, hands it to the observer only if its
//! fingerprint changed, and on success writes a fresh cache artifact. One
//! cycle runs before the job is returned; the rest run on a fixed-delay
//! schedule. Steady-state failures are logged and counted, never returned.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use data_replicator::ReplicationJob;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> data_replicator::Result<()> {
//!     let mut job = ReplicationJob::source("https://config.example/app.properties")
//!         .with_refresh_period(Duration::from_secs(60))
//!         .with_cache_dir("/var/cache/my-app")
//!         .start_consuming_text(|text| {
//!             println!("{} bytes of config", text.len());
//!             Ok(())
//!         })
//!         .await?;
//!
//!     // ... application runs ...
//!
//!     job.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod encoding;
pub mod endpoint;
pub mod error;
pub mod job;
pub mod metrics;
pub mod origin;
pub mod payload;

// Re-exports for convenience
pub use cache::FileCache;
pub use config::JobConfig;
pub use endpoint::{Endpoint, Scheme};
pub use error::{CacheError, ObserverError, OriginError, ReplicationError, Result};
pub use job::{JobBuilder, JobState, JobStatus, Observer, ObserverResult, ReplicationJob};
pub use origin::{Origin, ResourceBundle};
pub use payload::Payload;

// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Replication job.
//!
//! Ties together an [`Origin`](crate::origin::Origin), the
//! [`FileCache`](crate::cache::FileCache) and a [`ChangeDetector`] in front
//! of the registered observer.
//!
//! # Lifecycle
//!
//! 1. Select the origin from the endpoint scheme (unsupported → `Config` error)
//! 2. Run one cycle before returning
//! 3. If it fails: propagate when `fail_on_init_failure` is set, otherwise
//!    deliver the cached copy (a cache failure propagates)
//! 4. Spawn the periodic refresh task, first tick one period later
//! 5. [`shutdown()`](ReplicationJob::shutdown) or drop stops the task and
//!    closes the origin
//!
//! # Example
//!
//! ```rust,no_run
//! use data_replicator::ReplicationJob;
//! use std::time::Duration;
//!
//! # async fn run() -> data_replicator::Result<()> {
//! let mut job = ReplicationJob::source("https://config.example/app.properties")
//!     .with_refresh_period(Duration::from_secs(30))
//!     .start_consuming_text(|text| {
//!         println!("new config: {}", text);
//!         Ok(())
//!     })
//!     .await?;
//!
//! println!("{}", job.status());
//! job.shutdown().await;
//! # Ok(())
//! # }
//! ```

mod cycle;
mod detector;
mod types;

pub use detector::{ChangeDetector, Observer, ObserverResult};
pub use types::{JobState, JobStatus};

use crate::cache::FileCache;
use crate::config::JobConfig;
use crate::endpoint::Endpoint;
use crate::error::{ReplicationError, Result};
use crate::metrics;
use crate::origin::{self, OriginOptions, ResourceBundle};
use cycle::Replicator;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use types::StatusCell;

/// How long `shutdown()` waits for an in-flight cycle to finish.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// A running replication of one endpoint into one observer.
///
/// Created through [`ReplicationJob::source`]. Status accessors never block
/// and may be called from any thread.
pub struct ReplicationJob {
    endpoint: Endpoint,
    config: JobConfig,
    origin_kind: &'static str,
    status: Arc<StatusCell>,
    state_rx: watch::Receiver<JobState>,
    state_tx: Arc<watch::Sender<JobState>>,
    shutdown_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl ReplicationJob {
    /// Start configuring a job for `endpoint`.
    pub fn source(endpoint: impl Into<String>) -> JobBuilder {
        JobBuilder::new(endpoint)
    }

    async fn start(builder: JobBuilder, observer: Observer) -> Result<Self> {
        let JobBuilder {
            endpoint,
            config,
            client,
            bundle,
        } = builder;

        let endpoint = Endpoint::parse(&endpoint)?;
        let label = endpoint.to_string();
        let (state_tx, state_rx) = watch::channel(JobState::Starting);
        metrics::set_job_state(&label, "Starting");

        let origin = origin::for_endpoint(
            &endpoint,
            OriginOptions {
                client,
                bundle,
                request_timeout: config.request_timeout,
            },
        )?;
        let origin_kind = origin.kind();

        let cache = FileCache::new(&config.cache_dir, endpoint.clone(), config.max_cache_age);

        info!(
            endpoint = %label,
            origin = origin_kind,
            refresh = %humantime::format_duration(config.refresh_period),
            cache_dir = %cache.dir().display(),
            "Starting replication job"
        );

        let status = Arc::new(StatusCell::default());
        let mut replicator = Replicator {
            origin,
            detector: ChangeDetector::new(observer),
            cache,
            status: Arc::clone(&status),
            label: label.clone(),
        };

        if let Err(e) = replicator.cycle().await {
            if config.fail_on_init_failure {
                warn!(endpoint = %label, error = %e, "Initial load failed, not falling back to cache");
                return Err(Self::abort(replicator, e));
            }
            if let Err(cache_err) = replicator.deliver_from_cache().await {
                warn!(
                    endpoint = %label,
                    origin_error = %e,
                    error = %cache_err,
                    "Initial load failed and no usable cached copy"
                );
                return Err(Self::abort(replicator, cache_err));
            }
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let state_tx = Arc::new(state_tx);
        state_tx.send_replace(JobState::Running);
        metrics::set_job_state(&label, "Running");

        let task = tokio::spawn(cycle::run_refresh(
            replicator,
            config.refresh_period,
            shutdown_rx,
            Arc::clone(&state_tx),
        ));

        Ok(Self {
            endpoint,
            config,
            origin_kind,
            status,
            state_rx,
            state_tx,
            shutdown_tx,
            task: Some(task),
        })
    }

    fn abort(mut replicator: Replicator, error: ReplicationError) -> ReplicationError {
        replicator.close();
        metrics::set_job_state(&replicator.label, "Stopped");
        error
    }

    // =========================================================================
    // Status
    // =========================================================================

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn refresh_period(&self) -> Duration {
        self.config.refresh_period
    }

    pub fn max_cache_age(&self) -> Duration {
        self.config.max_cache_age
    }

    /// Kind of the configured origin (`bundle`, `file` or `http`).
    pub fn origin_kind(&self) -> &'static str {
        self.origin_kind
    }

    /// Time since the last successful cycle, `None` if none succeeded yet.
    ///
    /// A startup that fell back to the cache does not count as a success.
    pub fn elapsed_since_last_success(&self) -> Option<Duration> {
        self.status.since_last_success()
    }

    /// Time since the last failed cycle, `None` if none failed.
    pub fn elapsed_since_last_error(&self) -> Option<Duration> {
        self.status.since_last_error()
    }

    pub fn state(&self) -> JobState {
        *self.state_rx.borrow()
    }

    /// Get a receiver to watch state changes.
    pub fn state_receiver(&self) -> watch::Receiver<JobState> {
        self.state_rx.clone()
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state(), JobState::Running)
    }

    /// Snapshot of the job for logs and diagnostics.
    pub fn status(&self) -> JobStatus {
        JobStatus {
            endpoint: self.endpoint.to_string(),
            origin: self.origin_kind,
            state: self.state(),
            refresh_period: self.config.refresh_period,
            max_cache_age: self.config.max_cache_age,
            since_last_success: self.elapsed_since_last_success(),
            since_last_error: self.elapsed_since_last_error(),
        }
    }

    // =========================================================================
    // Shutdown
    // =========================================================================

    /// Stop scheduling cycles and close the origin.
    ///
    /// An in-flight cycle is allowed to finish (bounded wait). Calling this
    /// again is a no-op.
    pub async fn shutdown(&mut self) {
        let Some(task) = self.task.take() else {
            debug!(endpoint = %self.endpoint, "Replication job already shut down");
            return;
        };

        info!(endpoint = %self.endpoint, "Shutting down replication job");
        self.state_tx.send_replace(JobState::ShuttingDown);
        metrics::set_job_state(self.endpoint.as_str(), "ShuttingDown");

        let _ = self.shutdown_tx.send(true);

        match tokio::time::timeout(SHUTDOWN_TIMEOUT, task).await {
            Ok(Ok(())) => {
                debug!(endpoint = %self.endpoint, "Refresh task completed gracefully");
            }
            Ok(Err(e)) => {
                warn!(endpoint = %self.endpoint, error = %e, "Refresh task panicked");
            }
            Err(_) => {
                // it has seen the signal and exits once its cycle ends
                warn!(endpoint = %self.endpoint, "Refresh task did not stop in time, detaching it");
            }
        }

        self.state_tx.send_replace(JobState::Stopped);
        metrics::set_job_state(self.endpoint.as_str(), "Stopped");
        info!(endpoint = %self.endpoint, "Replication job stopped");
    }
}

impl Drop for ReplicationJob {
    fn drop(&mut self) {
        if self.task.is_some() {
            // the task finishes its current cycle, closes the origin and exits
            let _ = self.shutdown_tx.send(true);
        }
    }
}

impl std::fmt::Debug for ReplicationJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplicationJob")
            .field("endpoint", &self.endpoint.as_str())
            .field("origin", &self.origin_kind)
            .field("state", &self.state())
            .finish()
    }
}

/// Configures and starts a [`ReplicationJob`].
#[derive(Debug, Clone)]
pub struct JobBuilder {
    endpoint: String,
    config: JobConfig,
    client: Option<reqwest::Client>,
    bundle: ResourceBundle,
}

impl JobBuilder {
    fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            config: JobConfig::default(),
            client: None,
            bundle: ResourceBundle::default(),
        }
    }

    /// Replace the whole configuration (e.g. one loaded from a file).
    pub fn with_config(mut self, config: JobConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_refresh_period(mut self, period: Duration) -> Self {
        self.config.refresh_period = period;
        self
    }

    pub fn with_max_cache_age(mut self, age: Duration) -> Self {
        self.config.max_cache_age = age;
        self
    }

    pub fn with_fail_on_init_failure(mut self, fail: bool) -> Self {
        self.config.fail_on_init_failure = fail;
        self
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.cache_dir = dir.into();
        self
    }

    /// Use an externally owned HTTP client. The job will not close it.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Resources for `bundle:` endpoints.
    pub fn with_bundle(mut self, bundle: ResourceBundle) -> Self {
        self.bundle = bundle;
        self
    }

    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    /// Start the job, delivering raw bytes to `observer`.
    pub async fn start_consuming_binary<F>(self, observer: F) -> Result<ReplicationJob>
    where
        F: FnMut(&[u8]) -> ObserverResult + Send + 'static,
    {
        self.start(Observer::binary(observer)).await
    }

    /// Start the job, delivering decoded text to `observer`.
    pub async fn start_consuming_text<F>(self, observer: F) -> Result<ReplicationJob>
    where
        F: FnMut(&str) -> ObserverResult + Send + 'static,
    {
        self.start(Observer::text(observer)).await
    }

    /// Start the job with an already-built observer.
    pub async fn start(self, observer: Observer) -> Result<ReplicationJob> {
        if self.config.refresh_period.is_zero() {
            return Err(ReplicationError::Config(
                "refresh period must be greater than zero".to_string(),
            ));
        }
        ReplicationJob::start(self, observer).await
    }
}

// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Refresh cycle and the periodic task driving it.
//!
//! A cycle is: origin load → change detector → observer → cache update.
//! The construction-time cycle and every scheduled tick run the same
//! [`Replicator::cycle`], always from one task, so cycles never overlap.

use super::detector::ChangeDetector;
use super::types::{JobState, StatusCell};
use crate::cache::FileCache;
use crate::error::Result;
use crate::metrics;
use crate::origin::Origin;
use crate::payload::Payload;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, info, warn, Instrument};

/// Everything a cycle touches. Owned by exactly one task at a time.
pub(crate) struct Replicator {
    pub(crate) origin: Box<dyn Origin>,
    pub(crate) detector: ChangeDetector,
    pub(crate) cache: FileCache,
    pub(crate) status: Arc<StatusCell>,
    /// Endpoint string, used as the metrics label.
    pub(crate) label: String,
}

impl Replicator {
    /// Run one cycle, recording the outcome in status, metrics and logs.
    pub(crate) async fn cycle(&mut self) -> Result<()> {
        let start = Instant::now();
        let result = self.load_and_deliver().await;

        match &result {
            Ok(()) => {
                self.status.record_success();
                metrics::record_cycle(&self.label, "success", start.elapsed());
                metrics::set_seconds_since_success(&self.label, 0.0);
            }
            Err(e) => {
                self.status.record_error();
                metrics::record_cycle(&self.label, e.kind(), start.elapsed());
                if let Some(since) = self.status.since_last_success() {
                    metrics::set_seconds_since_success(&self.label, since.as_secs_f64());
                }
                warn!(
                    endpoint = %self.label,
                    error = %e,
                    retryable = e.is_retryable(),
                    "Refresh cycle failed"
                );
            }
        }
        result
    }

    async fn load_and_deliver(&mut self) -> Result<()> {
        let payload = self.origin.load().await?;
        self.deliver(&payload)?;
        // even an unchanged payload refreshes the artifact's age
        self.cache.update(&payload).await;
        Ok(())
    }

    /// Startup fallback: deliver the cached artifact instead of fresh content.
    pub(crate) async fn deliver_from_cache(&mut self) -> Result<()> {
        let loaded = self.cache.load().await;
        metrics::record_cache_fallback(&self.label, loaded.is_ok());

        let payload = loaded?;
        info!(
            endpoint = %self.label,
            bytes = payload.len(),
            "Origin unavailable at startup, delivering cached copy"
        );
        self.deliver(&payload)
    }

    fn deliver(&mut self, payload: &Payload) -> Result<()> {
        let delivered = self.detector.offer(payload)?;
        metrics::record_delivery(&self.label, delivered);
        if delivered {
            debug!(endpoint = %self.label, bytes = payload.len(), "Delivered changed content");
        } else {
            debug!(endpoint = %self.label, "Content unchanged, delivery suppressed");
        }
        Ok(())
    }

    /// Close the origin. Called once, when the task ends.
    pub(crate) fn close(&mut self) {
        self.origin.close();
    }
}

/// Run scheduled cycles until shutdown is signalled.
///
/// Fixed delay: each wait of `period` starts when the previous cycle has
/// finished, so the first cycle runs one full `period` after start and a slow
/// origin is never hit back-to-back.
pub(crate) async fn run_refresh(
    mut replicator: Replicator,
    period: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
    state_tx: Arc<watch::Sender<JobState>>,
) {
    let span = tracing::info_span!("replication_job", endpoint = %replicator.label);

    async move {
        info!(refresh_secs = period.as_secs_f64(), "Starting periodic refresh");

        loop {
            // The signal may predate this task; changed() only reports later sends
            if *shutdown_rx.borrow() {
                info!("Refresh task received shutdown signal");
                break;
            }

            tokio::select! {
                biased;

                changed = shutdown_rx.changed() => {
                    if changed.is_err() {
                        info!("Job handle dropped, stopping refresh task");
                        break;
                    }
                }

                _ = tokio::time::sleep(period) => {
                    // failures are recorded inside; the schedule carries on
                    let _ = replicator.cycle().await;
                }
            }
        }

        replicator.close();
        state_tx.send_replace(JobState::Stopped);
        metrics::set_job_state(&replicator.label, "Stopped");
        info!("Refresh task stopped");
    }
    .instrument(span)
    .await
}

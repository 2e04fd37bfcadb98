// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics for observability.
//!
//! Exports Prometheus-compatible metrics for:
//! - Refresh cycle outcomes and latency
//! - Observer deliveries vs. suppressed duplicates
//! - Cache writes, cleanup and fallback loads
//! - HTTP origin responses
//! - Job lifecycle state
//!
//! # Metric Naming Convention
//!
//! All metrics are prefixed with `datareplicator_` and follow Prometheus conventions:
//! - Counters end in `_total`
//! - Gauges represent current state
//! - Histograms track distributions (duration)
//!
//! No recorder is installed by this crate. Without one, every call is a no-op.
//!
//! # Usage
//!
//! ```rust,no_run
//! use data_replicator::metrics;
//! use std::time::Duration;
//!
//! metrics::record_cycle("https://config.example/app.properties", "success", Duration::from_millis(12));
//! metrics::record_delivery("https://config.example/app.properties", false);
//! ```

use metrics::{counter, gauge, histogram};
use std::time::Duration;

// =============================================================================
// Cycle Metrics
// =============================================================================

/// Record one refresh cycle and its outcome (`success` or an error kind).
pub fn record_cycle(endpoint: &str, outcome: &str, duration: Duration) {
    counter!(
        "datareplicator_cycles_total",
        "endpoint" => endpoint.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
    histogram!("datareplicator_cycle_duration_seconds", "endpoint" => endpoint.to_string())
        .record(duration.as_secs_f64());
}

/// Record whether a loaded payload reached the observer or was suppressed as unchanged.
pub fn record_delivery(endpoint: &str, delivered: bool) {
    if delivered {
        counter!("datareplicator_deliveries_total", "endpoint" => endpoint.to_string()).increment(1);
    } else {
        counter!("datareplicator_suppressed_total", "endpoint" => endpoint.to_string()).increment(1);
    }
}

/// Record a startup fallback to the cache.
pub fn record_cache_fallback(endpoint: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "datareplicator_cache_fallbacks_total",
        "endpoint" => endpoint.to_string(),
        "status" => status
    )
    .increment(1);
}

// =============================================================================
// Cache Metrics
// =============================================================================

/// Record a cache artifact write.
pub fn record_cache_write(success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!("datareplicator_cache_writes_total", "status" => status).increment(1);
}

/// Record files removed by a cleanup pass.
pub fn record_cache_cleanup(stale_temp_files: usize, old_artifacts: usize) {
    if stale_temp_files > 0 {
        counter!("datareplicator_cache_removed_total", "kind" => "temp")
            .increment(stale_temp_files as u64);
    }
    if old_artifacts > 0 {
        counter!("datareplicator_cache_removed_total", "kind" => "artifact")
            .increment(old_artifacts as u64);
    }
}

// =============================================================================
// Origin Metrics
// =============================================================================

/// Record an HTTP response from a network origin.
pub fn record_http_response(status: u16, duration: Duration) {
    let class = match status {
        200..=299 => "2xx",
        304 => "304",
        300..=399 => "3xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "other",
    };
    counter!("datareplicator_http_responses_total", "class" => class).increment(1);
    histogram!("datareplicator_http_request_duration_seconds").record(duration.as_secs_f64());
}

// =============================================================================
// Lifecycle Metrics
// =============================================================================

/// Gauge for job state.
pub fn set_job_state(endpoint: &str, state: &str) {
    // 0=starting, 1=running, 2=shutting down, 3=stopped
    let value = match state {
        "Starting" => 0.0,
        "Running" => 1.0,
        "ShuttingDown" => 2.0,
        "Stopped" => 3.0,
        _ => -1.0,
    };
    gauge!("datareplicator_job_state", "endpoint" => endpoint.to_string()).set(value);
}

/// Gauge for seconds since the last successful cycle.
pub fn set_seconds_since_success(endpoint: &str, seconds: f64) {
    gauge!("datareplicator_seconds_since_success", "endpoint" => endpoint.to_string())
        .set(seconds);
}

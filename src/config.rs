// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Configuration for a replication job.
//!
//! A [`JobConfig`] is fixed when the job is created. It can be built
//! programmatically, through the [`JobBuilder`](crate::JobBuilder), or
//! deserialized from YAML/JSON with durations written as humantime strings.
//!
//! # Quick Start
//!
//! ```rust
//! use data_replicator::config::JobConfig;
//! use std::time::Duration;
//!
//! let config = JobConfig {
//!     refresh_period: Duration::from_secs(30),
//!     fail_on_init_failure: true,
//!     ..Default::default()
//! };
//! assert_eq!(config.max_cache_age, Duration::from_secs(30 * 24 * 60 * 60));
//! ```
//!
//! # YAML Example
//!
//! ```yaml
//! refresh_period: "5m"
//! max_cache_age: "14days"
//! fail_on_init_failure: false
//! cache_dir: "/var/cache/myapp"
//! request_timeout: "10s"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Name of the subdirectory of `cache_dir` that holds the artifacts.
pub const CACHE_SUBDIR: &str = "datareplicator";

// ═══════════════════════════════════════════════════════════════════════════════
// JobConfig: immutable settings of one replication job
// ═══════════════════════════════════════════════════════════════════════════════

/// Settings of a single replication job.
///
/// # Fields
///
/// - `refresh_period`: delay between two refresh cycles.
/// - `max_cache_age`: oldest cache artifact still accepted as a fallback.
/// - `fail_on_init_failure`: abort construction instead of falling back to the cache.
/// - `cache_dir`: parent directory of the artifact directory.
/// - `request_timeout`: timeout of the HTTP client the job creates itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobConfig {
    /// How often the origin is polled.
    #[serde(default = "default_refresh_period", with = "humantime_duration")]
    pub refresh_period: Duration,

    /// Max age of the cache artifact used when the origin is unavailable at startup.
    #[serde(default = "default_max_cache_age", with = "humantime_duration")]
    pub max_cache_age: Duration,

    /// If set, a failed first load aborts job construction (no cache fallback).
    #[serde(default)]
    pub fail_on_init_failure: bool,

    /// Parent of the `datareplicator` artifact directory.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Timeout for HTTP requests. Only applies when no client is supplied.
    #[serde(default = "default_request_timeout", with = "humantime_duration")]
    pub request_timeout: Duration,
}

fn default_refresh_period() -> Duration {
    Duration::from_secs(60)
}

fn default_max_cache_age() -> Duration {
    Duration::from_secs(30 * 24 * 60 * 60) // 30 days
}

fn default_cache_dir() -> PathBuf {
    std::env::temp_dir()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            refresh_period: default_refresh_period(),
            max_cache_age: default_max_cache_age(),
            fail_on_init_failure: false,
            cache_dir: default_cache_dir(),
            request_timeout: default_request_timeout(),
        }
    }
}

impl JobConfig {
    /// Create a config with a short refresh period and the given cache dir.
    pub fn for_testing(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            refresh_period: Duration::from_millis(100),
            max_cache_age: Duration::from_secs(60 * 60),
            fail_on_init_failure: false,
            cache_dir: cache_dir.into(),
            request_timeout: Duration::from_secs(2),
        }
    }

    /// Directory the artifacts are written to.
    pub fn artifact_dir(&self) -> PathBuf {
        self.cache_dir.join(CACHE_SUBDIR)
    }
}

/// Serde adapter writing durations as humantime strings ("1m", "30days").
mod humantime_duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&humantime::format_duration(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_config_default() {
        let config = JobConfig::default();
        assert_eq!(config.refresh_period, Duration::from_secs(60));
        assert_eq!(config.max_cache_age, Duration::from_secs(2_592_000));
        assert!(!config.fail_on_init_failure);
        assert_eq!(config.cache_dir, std::env::temp_dir());
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_artifact_dir() {
        let config = JobConfig::for_testing("/var/cache/app");
        assert_eq!(
            config.artifact_dir(),
            PathBuf::from("/var/cache/app").join("datareplicator")
        );
    }

    #[test]
    fn test_for_testing_config() {
        let config = JobConfig::for_testing("/tmp/x");
        assert_eq!(config.refresh_period, Duration::from_millis(100));
        assert!(!config.fail_on_init_failure);
    }

    #[test]
    fn test_humantime_parsing_various_formats() {
        let test_cases = [
            ("5s", Duration::from_secs(5)),
            ("1m", Duration::from_secs(60)),
            ("500ms", Duration::from_millis(500)),
            ("14days", Duration::from_secs(14 * 86_400)),
        ];

        for (input, expected) in test_cases {
            let json = format!(r#"{{"refresh_period": "{}"}}"#, input);
            let config: JobConfig = serde_json::from_str(&json).unwrap();
            assert_eq!(config.refresh_period, expected, "Failed for input: {}", input);
        }
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: JobConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, JobConfig::default());
    }

    #[test]
    fn test_invalid_duration_rejected() {
        let result: Result<JobConfig, _> = serde_json::from_str(r#"{"max_cache_age": "soon"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_json_roundtrip() {
        let config = JobConfig {
            refresh_period: Duration::from_secs(300),
            max_cache_age: Duration::from_secs(7 * 86_400),
            fail_on_init_failure: true,
            cache_dir: PathBuf::from("/var/cache/app"),
            request_timeout: Duration::from_secs(10),
        };

        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"5m\""));
        let parsed: JobConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}

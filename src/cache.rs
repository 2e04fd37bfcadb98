// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Crash-safe on-disk cache of the last accepted payload.
//!
//! # Layout
//!
//! ```text
//! <cache_dir>/datareplicator/
//! ├── aHR0cDovL2V4YW1wbGUub3JnL2E_1735689600000.cache   # current artifact
//! ├── aHR0cDovL2V4YW1wbGUub3JnL2E_1735689540000.cache   # older, removed by cleanup
//! └── 5b0e8c1e-....temp                                 # in-flight (or crashed) write
//! ```
//!
//! The artifact name is the URL-safe base64 of the endpoint, `_`, the
//! commit time in epoch millis and `.cache`. Artifacts are never modified:
//! each update writes a temp file and renames it to a new name. The rename
//! is the commit point, so an artifact is either complete or absent.
//!
//! # Sharing
//!
//! Several jobs and processes may share the directory. There is no locking;
//! readers pick the artifact with the greatest timestamp, and cleanup only
//! removes artifacts older than the newest one it sees. A race leaves at
//! most a redundant artifact that the next cleanup removes.

use crate::config::CACHE_SUBDIR;
use crate::endpoint::Endpoint;
use crate::error::{CacheError, ReplicationError};
use crate::metrics;
use crate::origin::{BoxFuture, Origin};
use crate::payload::Payload;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// Suffix of committed artifacts.
pub const ARTIFACT_SUFFIX: &str = ".cache";

/// Suffix of in-flight writes.
pub const TEMP_SUFFIX: &str = ".temp";

/// Temp files older than this are leftovers of a crashed write.
pub const STALE_TEMP_AGE: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// A committed artifact found in the cache directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    /// Commit time embedded in the file name (epoch millis).
    pub timestamp: u64,
}

/// What a cleanup pass removed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CleanupStats {
    pub stale_temp_files: usize,
    pub old_artifacts: usize,
}

/// File cache for one endpoint. Cheap to clone.
#[derive(Debug, Clone)]
pub struct FileCache {
    endpoint: Endpoint,
    dir: PathBuf,
    prefix: String,
    max_age: Duration,
}

impl FileCache {
    /// Open the cache below `cache_dir`, creating the artifact directory.
    ///
    /// A directory that cannot be created is only logged: writes then fail
    /// and are swallowed, and loads report the I/O error.
    pub fn new(cache_dir: &Path, endpoint: Endpoint, max_age: Duration) -> Self {
        let dir = cache_dir.join(CACHE_SUBDIR);
        if let Err(e) = fs::create_dir_all(&dir) {
            warn!(dir = %dir.display(), error = %e, "Cannot create cache dir, cache writes will fail");
        }
        let prefix = artifact_prefix(&endpoint);

        debug!(dir = %dir.display(), prefix = %prefix, "Opened file cache");

        Self {
            endpoint,
            dir,
            prefix,
            max_age,
        }
    }

    /// Directory holding the artifacts.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name prefix of this endpoint's artifacts.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    // =========================================================================
    // Writing
    // =========================================================================

    /// Persist `payload` as the new current artifact, then clean up.
    ///
    /// Never fails: the payload has already been delivered, so write and
    /// cleanup errors are logged and counted only.
    pub async fn update(&self, payload: &Payload) {
        let cache = self.clone();
        let bytes = payload.bytes();

        let result = tokio::task::spawn_blocking(move || {
            let path = cache.commit(&bytes)?;
            let stats = cache.cleanup_keeping(Some(path.as_path()));
            Ok::<_, CacheError>((path, stats))
        })
        .await;

        match result {
            Ok(Ok((path, stats))) => {
                metrics::record_cache_write(true);
                metrics::record_cache_cleanup(stats.stale_temp_files, stats.old_artifacts);
                debug!(
                    artifact = %path.display(),
                    removed_artifacts = stats.old_artifacts,
                    removed_temp_files = stats.stale_temp_files,
                    "Cache updated"
                );
            }
            Ok(Err(e)) => {
                metrics::record_cache_write(false);
                warn!(endpoint = %self.endpoint, error = %e, "Writing cache artifact failed");
            }
            Err(e) => {
                metrics::record_cache_write(false);
                warn!(endpoint = %self.endpoint, error = %e, "Cache writer task failed");
            }
        }
    }

    /// Write `bytes` to a temp file and atomically rename it to a new artifact.
    ///
    /// Blocking. Returns the artifact path.
    pub fn commit(&self, bytes: &[u8]) -> Result<PathBuf, CacheError> {
        let final_path = self.dir.join(format!("{}{}{}", self.prefix, epoch_millis(), ARTIFACT_SUFFIX));
        let temp_path = self.dir.join(format!("{}{}", uuid::Uuid::new_v4(), TEMP_SUFFIX));

        let written = File::options()
            .write(true)
            .create_new(true)
            .open(&temp_path)
            .and_then(|mut file| {
                file.write_all(bytes)?;
                file.sync_all()
            });
        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path);
            return Err(CacheError::io(&temp_path, e));
        }

        if let Err(e) = fs::rename(&temp_path, &final_path) {
            let _ = fs::remove_file(&temp_path);
            return Err(CacheError::io(&final_path, e));
        }

        // Best-effort: persist the rename itself
        #[cfg(unix)]
        {
            if let Ok(dir) = File::open(&self.dir) {
                let _ = dir.sync_all();
            }
        }

        Ok(final_path)
    }

    /// Remove stale temp files and every artifact older than the newest one.
    ///
    /// Blocking. Individual delete failures are logged and skipped.
    pub fn cleanup(&self) -> CleanupStats {
        self.cleanup_keeping(None)
    }

    /// Like [`cleanup`](Self::cleanup), but `current` is never removed.
    ///
    /// `current` is the artifact just committed. If the wall clock stepped
    /// back, an older artifact can carry a greater timestamp than it. Both
    /// are kept until a later commit outdates them.
    pub fn cleanup_keeping(&self, current: Option<&Path>) -> CleanupStats {
        let mut stats = CleanupStats::default();

        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %self.dir.display(), error = %e, "Cannot scan cache dir for cleanup");
                return stats;
            }
        };

        let now = SystemTime::now();
        for entry in entries.flatten() {
            let name = entry.file_name();
            if !name.to_string_lossy().ends_with(TEMP_SUFFIX) {
                continue;
            }
            let stale = entry
                .metadata()
                .and_then(|m| m.modified())
                .map(|modified| age(now, modified) > STALE_TEMP_AGE)
                .unwrap_or(false);
            if stale && remove_logged(&entry.path()) {
                stats.stale_temp_files += 1;
            }
        }

        match self.artifacts() {
            Ok(artifacts) => {
                if let Some(newest) = artifacts.iter().map(|a| a.timestamp).max() {
                    let removable = artifacts
                        .iter()
                        .filter(|a| a.timestamp < newest)
                        .filter(|a| current != Some(a.path.as_path()));
                    for artifact in removable {
                        if remove_logged(&artifact.path) {
                            stats.old_artifacts += 1;
                        }
                    }
                }
            }
            Err(e) => warn!(error = %e, "Cannot list cache artifacts for cleanup"),
        }

        if stats.stale_temp_files > 0 {
            info!(
                count = stats.stale_temp_files,
                dir = %self.dir.display(),
                "Removed temp files left by an interrupted cache write"
            );
        }
        stats
    }

    // =========================================================================
    // Reading
    // =========================================================================

    /// All artifacts of this endpoint, in no particular order.
    pub fn artifacts(&self) -> Result<Vec<Artifact>, CacheError> {
        let entries = fs::read_dir(&self.dir).map_err(|e| CacheError::io(&self.dir, e))?;

        let mut artifacts = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| CacheError::io(&self.dir, e))?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if !name.starts_with(&self.prefix) || !name.ends_with(ARTIFACT_SUFFIX) {
                continue;
            }
            match parse_artifact_timestamp(&name, &self.prefix) {
                Some(timestamp) => artifacts.push(Artifact {
                    path: entry.path(),
                    timestamp,
                }),
                None => debug!(
                    dir = %self.dir.display(),
                    file = %name,
                    "Ignoring cache file with invalid name"
                ),
            }
        }
        Ok(artifacts)
    }

    /// The artifact with the greatest timestamp, expired or not.
    pub fn newest(&self) -> Result<Option<Artifact>, CacheError> {
        Ok(self.artifacts()?.into_iter().max_by_key(|a| a.timestamp))
    }

    /// Read the current artifact. Blocking.
    ///
    /// Fails when there is none, or when its modification time is older
    /// than the max cache age (the file stays on disk).
    pub fn load_blocking(&self) -> Result<Payload, CacheError> {
        let newest = self.newest()?.ok_or_else(|| CacheError::Empty {
            endpoint: self.endpoint.to_string(),
            dir: self.dir.clone(),
        })?;

        let modified = fs::metadata(&newest.path)
            .and_then(|m| m.modified())
            .map_err(|e| CacheError::io(&newest.path, e))?;
        let artifact_age = age(SystemTime::now(), modified);
        if artifact_age > self.max_age {
            warn!(
                artifact = %newest.path.display(),
                age_days = artifact_age.as_secs() / 86_400,
                "Cache artifact is expired, ignoring it"
            );
            return Err(CacheError::Expired {
                path: newest.path,
                age_secs: artifact_age.as_secs(),
            });
        }

        let content = fs::read(&newest.path).map_err(|e| CacheError::io(&newest.path, e))?;
        debug!(artifact = %newest.path.display(), bytes = content.len(), "Loaded cache artifact");
        Ok(Payload::new(content))
    }
}

impl Origin for FileCache {
    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    fn kind(&self) -> &'static str {
        "cache"
    }

    fn load(&mut self) -> BoxFuture<'_, Payload> {
        let cache = self.clone();
        Box::pin(async move {
            tokio::task::spawn_blocking(move || cache.load_blocking())
                .await
                .map_err(|e| CacheError::io(PathBuf::new(), std::io::Error::other(e)))?
                .map_err(ReplicationError::from)
        })
    }
}

/// File name prefix for an endpoint: URL-safe base64 of the endpoint plus `_`.
pub fn artifact_prefix(endpoint: &Endpoint) -> String {
    format!("{}_", URL_SAFE_NO_PAD.encode(endpoint.as_str().as_bytes()))
}

/// Timestamp of an artifact file name, if it belongs to `prefix`.
///
/// The part between prefix and suffix must be all ASCII digits; this keeps
/// an endpoint whose encoding happens to extend another's from matching.
pub fn parse_artifact_timestamp(file_name: &str, prefix: &str) -> Option<u64> {
    let digits = file_name.strip_prefix(prefix)?.strip_suffix(ARTIFACT_SUFFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn remove_logged(path: &Path) -> bool {
    match fs::remove_file(path) {
        Ok(()) => true,
        Err(e) => {
            warn!(file = %path.display(), error = %e, "Removing cache file failed");
            false
        }
    }
}

fn age(now: SystemTime, then: SystemTime) -> Duration {
    now.duration_since(then).unwrap_or_default()
}

fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

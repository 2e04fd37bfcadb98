// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Local filesystem origin.

use super::{BoxFuture, Origin};
use crate::endpoint::Endpoint;
use crate::error::{OriginError, ReplicationError, Result};
use crate::payload::Payload;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::debug;

/// Origin reading a `file:` endpoint from disk.
pub struct FileOrigin {
    endpoint: Endpoint,
    path: PathBuf,
}

impl FileOrigin {
    pub fn new(endpoint: Endpoint) -> Result<Self> {
        let path = endpoint.file_path()?;
        Ok(Self { endpoint, path })
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl Origin for FileOrigin {
    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    fn kind(&self) -> &'static str {
        "file"
    }

    fn load(&mut self) -> BoxFuture<'_, Payload> {
        Box::pin(async move {
            match tokio::fs::read(&self.path).await {
                Ok(content) => {
                    debug!(path = %self.path.display(), bytes = content.len(), "Loaded file");
                    Ok(Payload::new(content))
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    Err(ReplicationError::from(OriginError::NotFound {
                        endpoint: self.endpoint.to_string(),
                        what: format!("file {}", self.path.display()),
                    }))
                }
                Err(e) => Err(ReplicationError::from(OriginError::unreachable(
                    self.endpoint.to_string(),
                    format!("reading {} failed", self.path.display()),
                    e,
                ))),
            }
        })
    }
}

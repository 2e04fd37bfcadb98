// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Resources compiled into the application.

use super::{BoxFuture, Origin};
use crate::endpoint::Endpoint;
use crate::error::{OriginError, ReplicationError};
use crate::payload::Payload;
use bytes::Bytes;
use std::collections::HashMap;
use tracing::debug;

/// Named resources reachable through `bundle:` endpoints.
///
/// ```rust
/// use data_replicator::origin::ResourceBundle;
///
/// let bundle = ResourceBundle::new()
///     .with("defaults.properties", &b"timeout=30\n"[..]);
/// assert!(bundle.contains("defaults.properties"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ResourceBundle {
    resources: HashMap<String, Bytes>,
}

impl ResourceBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource (builder style). Leading slashes of `name` are ignored.
    pub fn with(mut self, name: impl AsRef<str>, content: impl Into<Bytes>) -> Self {
        self.insert(name, content);
        self
    }

    /// Add or replace a resource.
    pub fn insert(&mut self, name: impl AsRef<str>, content: impl Into<Bytes>) {
        let name = name.as_ref().trim_start_matches('/').to_string();
        self.resources.insert(name, content.into());
    }

    pub fn get(&self, name: &str) -> Option<Bytes> {
        self.resources.get(name.trim_start_matches('/')).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resources.contains_key(name.trim_start_matches('/'))
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// Origin resolving the endpoint path against a [`ResourceBundle`].
pub struct BundledOrigin {
    endpoint: Endpoint,
    bundle: ResourceBundle,
}

impl BundledOrigin {
    pub fn new(endpoint: Endpoint, bundle: ResourceBundle) -> Self {
        Self { endpoint, bundle }
    }
}

impl Origin for BundledOrigin {
    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    fn kind(&self) -> &'static str {
        "bundle"
    }

    fn load(&mut self) -> BoxFuture<'_, Payload> {
        Box::pin(async move {
            let name = self.endpoint.bundle_path();
            match self.bundle.get(name) {
                Some(content) => {
                    debug!(resource = name, bytes = content.len(), "Loaded bundled resource");
                    Ok(Payload::new(content))
                }
                None => Err(ReplicationError::from(OriginError::NotFound {
                    endpoint: self.endpoint.to_string(),
                    what: format!("bundled resource {}", name),
                })),
            }
        })
    }
}

// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Pluggable origins of the replicated resource.
//!
//! Every origin implements [`Origin`]: the bundled-resource, file and HTTP
//! variants in this module, and the [`FileCache`](crate::cache::FileCache),
//! which is read back through the same trait when the real origin is down.
//!
//! # Example
//!
//! ```rust,no_run
//! use data_replicator::origin::{BoxFuture, Origin};
//! use data_replicator::{Endpoint, Payload};
//!
//! struct Fixed {
//!     endpoint: Endpoint,
//! }
//!
//! impl Origin for Fixed {
//!     fn endpoint(&self) -> &Endpoint {
//!         &self.endpoint
//!     }
//!
//!     fn kind(&self) -> &'static str {
//!         "fixed"
//!     }
//!
//!     fn load(&mut self) -> BoxFuture<'_, Payload> {
//!         Box::pin(async move { Ok(Payload::new(b"A=1".to_vec())) })
//!     }
//! }
//! ```

mod bundled;
mod file;
mod http;

pub use bundled::{BundledOrigin, ResourceBundle};
pub use file::FileOrigin;
pub use http::{charset_from_content_type, HttpOrigin};

use crate::endpoint::{Endpoint, Scheme};
use crate::error::Result;
use crate::payload::Payload;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Type alias for boxed async loads (keeps the trait object-safe).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// A source of the resource's current bytes.
///
/// `load` takes `&mut self`: a job drives its origin from a single task, so
/// per-origin state (like the HTTP conditional entry) needs no locking.
pub trait Origin: Send + 'static {
    /// The configured endpoint.
    fn endpoint(&self) -> &Endpoint;

    /// Short name of the origin kind, for logs and status.
    fn kind(&self) -> &'static str;

    /// Fetch the current content.
    fn load(&mut self) -> BoxFuture<'_, Payload>;

    /// Release held resources. Idempotent; the default holds nothing.
    fn close(&mut self) {}
}

/// Runtime collaborators needed to build an origin.
#[derive(Debug, Clone)]
pub struct OriginOptions {
    /// Externally owned HTTP client. If absent the HTTP origin creates its own.
    pub client: Option<reqwest::Client>,
    /// Resources reachable through `bundle:` endpoints.
    pub bundle: ResourceBundle,
    /// Timeout applied to a self-created HTTP client.
    pub request_timeout: Duration,
}

impl Default for OriginOptions {
    fn default() -> Self {
        Self {
            client: None,
            bundle: ResourceBundle::default(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Build the origin matching the endpoint's scheme.
///
/// Unsupported schemes are a [`Config`](crate::ReplicationError::Config) error.
pub fn for_endpoint(endpoint: &Endpoint, options: OriginOptions) -> Result<Box<dyn Origin>> {
    let origin: Box<dyn Origin> = match endpoint.scheme()? {
        Scheme::Bundle => Box::new(BundledOrigin::new(endpoint.clone(), options.bundle)),
        Scheme::File => Box::new(FileOrigin::new(endpoint.clone())?),
        Scheme::Http | Scheme::Https => Box::new(HttpOrigin::new(
            endpoint.clone(),
            options.client,
            options.request_timeout,
        )?),
    };
    Ok(origin)
}

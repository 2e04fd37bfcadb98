// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Origin locators.

use crate::error::{ReplicationError, Result};
use reqwest::Url;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Origin kinds selected by the endpoint scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    /// `bundle:` (or `classpath:`), a resource compiled into the application
    Bundle,
    /// `file:`, the local filesystem
    File,
    /// `http:`
    Http,
    /// `https:`
    Https,
}

impl Scheme {
    /// Scheme names accepted by [`Endpoint::scheme`].
    pub const SUPPORTED: &'static str = "bundle, classpath, file, http, https";

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "bundle" | "classpath" => Some(Self::Bundle),
            "file" => Some(Self::File),
            "http" => Some(Self::Http),
            "https" => Some(Self::Https),
            _ => None,
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bundle => write!(f, "bundle"),
            Self::File => write!(f, "file"),
            Self::Http => write!(f, "http"),
            Self::Https => write!(f, "https"),
        }
    }
}

/// Immutable locator of the replicated resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    url: Url,
}

impl Endpoint {
    /// Parse an endpoint URI.
    pub fn parse(raw: &str) -> Result<Self> {
        let url = Url::parse(raw.trim())
            .map_err(|e| ReplicationError::Config(format!("invalid endpoint {:?}: {}", raw, e)))?;
        Ok(Self { url })
    }

    /// The origin kind, or a configuration error for unknown schemes.
    pub fn scheme(&self) -> Result<Scheme> {
        Scheme::from_name(self.url.scheme()).ok_or_else(|| {
            ReplicationError::Config(format!(
                "scheme of {} is not supported (supported: {})",
                self.url,
                Scheme::SUPPORTED
            ))
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// Path inside the resource bundle, without leading slashes.
    pub fn bundle_path(&self) -> &str {
        self.url.path().trim_start_matches('/')
    }

    /// Local path of a `file:` endpoint.
    pub fn file_path(&self) -> Result<PathBuf> {
        self.url
            .to_file_path()
            .map_err(|_| ReplicationError::Config(format!("{} is not a local file path", self.url)))
    }
}

impl FromStr for Endpoint {
    type Err = ReplicationError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! HTTP(S) origin with conditional re-fetch.
//!
//! # Conditional requests
//!
//! When a 2xx response carries an `etag`, the origin remembers
//! `(endpoint, etag, payload)`. The next request sends the token back in
//! the `etag` header (mirrored in `If-None-Match`); a 304 answer then
//! returns the remembered payload without transferring the body again.
//!
//! | Status | Entry present | Result |
//! |--------|---------------|--------|
//! | 2xx | - | new payload, entry replaced if the response has an `etag` |
//! | 304 | yes | remembered payload |
//! | 304 | no | [`OriginError::UnexpectedNotModified`] |
//! | other | - | [`OriginError::Status`] |

use super::{BoxFuture, Origin};
use crate::endpoint::Endpoint;
use crate::error::{OriginError, ReplicationError, Result};
use crate::metrics;
use crate::payload::Payload;
use encoding_rs::Encoding;
use reqwest::header::{CONTENT_TYPE, ETAG, IF_NONE_MATCH};
use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Request header carrying the validator token.
pub const VALIDATOR_HEADER: &str = "etag";

/// Remembered response for conditional re-fetch.
#[derive(Debug, Clone)]
struct ConditionalEntry {
    etag: String,
    payload: Payload,
}

/// Origin issuing HTTP GET requests to an `http:`/`https:` endpoint.
pub struct HttpOrigin {
    endpoint: Endpoint,
    client: Option<Client>,
    owns_client: bool,
    conditional: HashMap<String, ConditionalEntry>,
}

impl HttpOrigin {
    /// Create the origin. Without `client`, a client with `request_timeout`
    /// is created and owned (and released on [`close`](Origin::close)).
    pub fn new(endpoint: Endpoint, client: Option<Client>, request_timeout: Duration) -> Result<Self> {
        let owns_client = client.is_none();
        let client = match client {
            Some(client) => client,
            None => Client::builder()
                .timeout(request_timeout)
                .build()
                .map_err(|e| ReplicationError::Config(format!("cannot create HTTP client: {}", e)))?,
        };

        Ok(Self {
            endpoint,
            client: Some(client),
            owns_client,
            conditional: HashMap::new(),
        })
    }

    /// Whether the transport client was created (and is owned) by this origin.
    pub fn owns_client(&self) -> bool {
        self.owns_client
    }

    /// Validator token remembered for the endpoint, if any.
    pub fn cached_etag(&self) -> Option<&str> {
        self.conditional
            .get(self.endpoint.as_str())
            .map(|entry| entry.etag.as_str())
    }

    async fn fetch(&mut self) -> Result<Payload> {
        let endpoint = self.endpoint.to_string();
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| OriginError::Closed { endpoint: endpoint.clone() })?;

        let cached = self.conditional.get(&endpoint).cloned();

        let mut request = client.get(self.endpoint.url().clone());
        if let Some(entry) = &cached {
            request = request
                .header(VALIDATOR_HEADER, entry.etag.as_str())
                .header(IF_NONE_MATCH, entry.etag.as_str());
        }

        let start = Instant::now();
        let response = request
            .send()
            .await
            .map_err(|e| OriginError::unreachable(endpoint.clone(), "request failed", e))?;
        let status = response.status();
        metrics::record_http_response(status.as_u16(), start.elapsed());
        debug!(endpoint = %endpoint, status = status.as_u16(), conditional = cached.is_some(), "HTTP response");

        if status.is_success() {
            let charset = match response.headers().get(CONTENT_TYPE) {
                Some(value) => {
                    let value = value.to_str().map_err(|_| OriginError::Malformed {
                        endpoint: endpoint.clone(),
                        message: "Content-type header is not valid ASCII".to_string(),
                    })?;
                    charset_from_content_type(value).map_err(|message| OriginError::Malformed {
                        endpoint: endpoint.clone(),
                        message,
                    })?
                }
                None => None,
            };
            let etag = response
                .headers()
                .get(ETAG)
                .and_then(|v| v.to_str().ok())
                .filter(|v| !v.is_empty())
                .map(str::to_string);

            let body = response
                .bytes()
                .await
                .map_err(|e| OriginError::unreachable(endpoint.clone(), "reading body failed", e))?;

            let payload = match charset {
                Some(charset) => Payload::with_charset(body, charset),
                None => Payload::new(body),
            };

            if let Some(etag) = etag {
                debug!(endpoint = %endpoint, etag = %etag, "Remembering validator token");
                self.conditional.insert(
                    endpoint,
                    ConditionalEntry {
                        etag,
                        payload: payload.clone(),
                    },
                );
            }
            Ok(payload)
        } else if status == StatusCode::NOT_MODIFIED {
            match cached {
                Some(entry) => Ok(entry.payload),
                None => Err(OriginError::UnexpectedNotModified { endpoint }.into()),
            }
        } else {
            Err(OriginError::Status {
                endpoint,
                status: status.as_u16(),
            }
            .into())
        }
    }
}

impl Origin for HttpOrigin {
    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    fn kind(&self) -> &'static str {
        "http"
    }

    fn load(&mut self) -> BoxFuture<'_, Payload> {
        Box::pin(self.fetch())
    }

    fn close(&mut self) {
        if self.owns_client && self.client.take().is_some() {
            info!(endpoint = %self.endpoint, "Released HTTP client");
        }
    }
}

/// Extract the charset parameter of a `Content-type` value.
///
/// `Ok(None)` when the media type has no charset, `Err` when the value does
/// not parse or names an unknown charset.
pub fn charset_from_content_type(value: &str) -> std::result::Result<Option<&'static Encoding>, String> {
    let media_type: mime::Mime = value
        .trim()
        .parse()
        .map_err(|e| format!("invalid Content-type {:?}: {}", value, e))?;

    match media_type.get_param(mime::CHARSET) {
        Some(label) => Encoding::for_label(label.as_str().as_bytes())
            .map(Some)
            .ok_or_else(|| format!("unsupported charset {:?}", label.as_str())),
        None => Ok(None),
    }
}

// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Wiremock setup for HTTP origins.
//!
//! Provides helpers to serve a resource with a given body, status and
//! validator, and to swap it between ticks.

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path the test origin serves.
pub const RESOURCE_PATH: &str = "/app.properties";

/// An HTTP origin serving one resource.
pub struct TestOrigin {
    pub server: MockServer,
}

impl TestOrigin {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Endpoint URL of the served resource.
    pub fn endpoint(&self) -> String {
        format!("{}{}", self.server.uri(), RESOURCE_PATH)
    }

    /// Serve `body` with 200 and the given content type, replacing previous mocks.
    pub async fn serve(&self, body: &str, content_type: &str) {
        self.server.reset().await;
        Mock::given(method("GET"))
            .and(path(RESOURCE_PATH))
            .respond_with(
                // set_body_raw owns the content-type header
                ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), content_type),
            )
            .mount(&self.server)
            .await;
    }

    /// Serve a plain-text body.
    pub async fn serve_text(&self, body: &str) {
        self.serve(body, "text/plain; charset=utf-8").await;
    }

    /// Serve raw bytes without any content type.
    pub async fn serve_raw(&self, body: &[u8]) {
        self.server.reset().await;
        Mock::given(method("GET"))
            .and(path(RESOURCE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
            .mount(&self.server)
            .await;
    }

    /// Answer every request with `status` and no body.
    pub async fn respond_with_status(&self, status: u16) {
        self.server.reset().await;
        Mock::given(method("GET"))
            .and(path(RESOURCE_PATH))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Number of requests received so far.
    pub async fn request_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|requests| requests.len())
            .unwrap_or(0)
    }
}

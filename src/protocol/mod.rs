// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Communication with the Bosch Smart Home Controller.
//!
//! - [`BridgeHttpClient`]: HTTPS client with mutual TLS, pairing and typed requests
//! - [`BridgeEndpoint`] / [`BridgeAddress`]: URL construction for the endpoint families
//! - [`PairingCredential`]: client certificate and id presented to the bridge
//! - [`BridgeRequest`]: a request that has been built but not yet executed

mod credential;
mod endpoint;
mod http;

pub use credential::{CREDENTIAL_FILE, ClientId, PairingCredential};
pub use endpoint::{API_PORT, BridgeAddress, BridgeEndpoint, PAIRING_PORT};
pub use http::{BridgeHttpClient, BridgeHttpClientBuilder};

use std::time::Duration;

use reqwest::Method;
use serde_json::Value;

/// A request bound to an absolute URL and verb, not yet sent.
///
/// Construction never performs I/O and never fails; URL problems and
/// unreachable hosts surface when the request is sent.
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeRequest {
    method: Method,
    url: String,
    body: Option<Value>,
    headers: Vec<(String, String)>,
    timeout: Option<Duration>,
}

impl BridgeRequest {
    /// Creates a request without body.
    #[must_use]
    pub fn new(url: impl Into<String>, method: Method) -> Self {
        Self {
            method,
            url: url.into(),
            body: None,
            headers: Vec::new(),
            timeout: None,
        }
    }

    /// Sets the JSON body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Value>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Adds a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Overrides the client's default timeout for this request.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the absolute URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the JSON body, if any.
    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Returns the extra headers.
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Returns the per-request timeout, if set.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

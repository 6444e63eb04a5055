// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTPS client for the Bosch Smart Home Controller.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::error::{BridgeError, Error, PairingError, TransportError};
use crate::protocol::{BridgeAddress, BridgeEndpoint, BridgeRequest, ClientId, PairingCredential};
use crate::response::JsonRestExceptionResponseEntity;

/// Header carrying the base64 encoded system password during pairing.
const SYSTEM_PASSWORD_HEADER: &str = "Systempassword";

/// Role requested for paired clients.
const CLIENT_ROLE: &str = "ROLE_RESTRICTED_CLIENT";

/// Client for all network I/O with one bridge.
///
/// The client is cheap to clone; clones share the same connection pool and
/// may be used concurrently from any number of tasks.
///
/// # Examples
///
/// ```no_run
/// use boschshc::protocol::{BridgeHttpClient, PairingCredential};
/// use boschshc::response::Device;
/// use reqwest::Method;
///
/// # async fn example() -> boschshc::Result<()> {
/// let credential = PairingCredential::load("/var/lib/boschshc".as_ref())?;
/// let client = BridgeHttpClient::new("192.168.1.20", &credential)?;
///
/// if !client.is_access_possible().await {
///     client.do_pairing("system-password").await?;
/// }
///
/// let request = client.create_request(&client.smart_home_url("devices"), Method::GET);
/// let devices: Vec<Device> = client.send_request(&request).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct BridgeHttpClient {
    address: BridgeAddress,
    client: Client,
    client_id: ClientId,
    certificate: String,
}

impl BridgeHttpClient {
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a client for the bridge at `host` on the standard ports.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a malformed host, a pairing error if
    /// the credential cannot be used as TLS identity, and a transport error if
    /// the HTTP client cannot be created.
    pub fn new(host: impl Into<String>, credential: &PairingCredential) -> Result<Self, Error> {
        BridgeHttpClientBuilder::new(BridgeAddress::new(host)?).build(credential)
    }

    /// Returns a builder for custom ports, scheme or timeout.
    #[must_use]
    pub fn builder(address: BridgeAddress) -> BridgeHttpClientBuilder {
        BridgeHttpClientBuilder::new(address)
    }

    /// Returns the bridge address.
    #[must_use]
    pub fn address(&self) -> &BridgeAddress {
        &self.address
    }

    /// Returns the client id presented during pairing.
    #[must_use]
    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    /// URL of the pairing endpoint.
    #[must_use]
    pub fn pairing_url(&self) -> String {
        BridgeEndpoint::Pairing.url(&self.address)
    }

    /// URL of a generic bridge endpoint.
    #[must_use]
    pub fn bridge_url(&self, path: &str) -> String {
        BridgeEndpoint::Bridge(path).url(&self.address)
    }

    /// URL of a smart-home endpoint.
    #[must_use]
    pub fn smart_home_url(&self, path: &str) -> String {
        BridgeEndpoint::SmartHome(path).url(&self.address)
    }

    /// URL of the state of one device service.
    #[must_use]
    pub fn service_url(&self, service_name: &str, device_id: &str) -> String {
        BridgeEndpoint::DeviceService {
            device_id,
            service_name,
        }
        .url(&self.address)
    }

    /// Checks whether the bridge accepts API calls from this client.
    ///
    /// Returns `false` if the bridge is unreachable or rejects the client.
    pub async fn is_access_possible(&self) -> bool {
        let request = self.create_request(&self.smart_home_url("devices"), Method::GET);

        match self.dispatch(&request).await {
            Ok((status, body)) => {
                tracing::debug!(
                    status = status.as_u16(),
                    body_len = body.len(),
                    "Access check completed"
                );
                status.is_success()
            }
            Err(e) => {
                tracing::debug!(error = %e, "Access check failed");
                false
            }
        }
    }

    /// Registers this client's certificate with the bridge.
    ///
    /// The bridge only accepts pairing requests while its pairing button was
    /// pressed shortly before. Returns `Ok(false)` if the bridge is
    /// unreachable or refuses the pairing.
    ///
    /// # Errors
    ///
    /// Returns [`PairingError::MissingSystemPassword`] if `system_password`
    /// is empty.
    pub async fn do_pairing(&self, system_password: &str) -> Result<bool, Error> {
        if system_password.is_empty() {
            return Err(PairingError::MissingSystemPassword.into());
        }

        tracing::info!(client_id = %self.client_id, "Starting pairing with bridge");

        let body = json!({
            "@type": "client",
            "id": self.client_id.as_str(),
            "name": self.client_id.as_str(),
            "primaryRole": CLIENT_ROLE,
            "certificate": self.certificate,
        });
        let request = self
            .create_request_with_body(&self.pairing_url(), Method::POST, body)
            .header(SYSTEM_PASSWORD_HEADER, STANDARD.encode(system_password));

        match self.dispatch(&request).await {
            Ok((StatusCode::CREATED, _)) => {
                tracing::info!(client_id = %self.client_id, "Pairing successful");
                Ok(true)
            }
            Ok((status, body)) => {
                tracing::info!(
                    status = status.as_u16(),
                    body = %body,
                    "Pairing refused, press the pairing button on the bridge and retry"
                );
                Ok(false)
            }
            Err(e) => {
                tracing::info!(error = %e, "Pairing request failed");
                Ok(false)
            }
        }
    }

    /// Creates a request without body. Performs no I/O.
    #[must_use]
    pub fn create_request(&self, url: &str, method: Method) -> BridgeRequest {
        BridgeRequest::new(url, method)
    }

    /// Creates a request with a JSON body. Performs no I/O.
    #[must_use]
    pub fn create_request_with_body(
        &self,
        url: &str,
        method: Method,
        body: impl Into<Value>,
    ) -> BridgeRequest {
        BridgeRequest::new(url, method).with_body(body)
    }

    /// Executes a request and decodes the response body as `T`.
    ///
    /// # Errors
    ///
    /// - [`Error::Transport`] if no response was received
    /// - [`Error::Bridge`] if the bridge answered with a non-success status
    /// - [`Error::Decode`] if the body is not a valid `T`
    pub async fn send_request<T: DeserializeOwned>(&self, request: &BridgeRequest) -> Result<T, Error> {
        let body = self.execute(request).await?;
        serde_json::from_str(&body).map_err(Into::into)
    }

    /// Executes a request and discards the response body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] or [`Error::Bridge`] like
    /// [`send_request`](Self::send_request).
    pub async fn send_command(&self, request: &BridgeRequest) -> Result<(), Error> {
        self.execute(request).await.map(|_| ())
    }

    async fn execute(&self, request: &BridgeRequest) -> Result<String, Error> {
        let (status, body) = self.dispatch(request).await?;

        if !status.is_success() {
            let entity = JsonRestExceptionResponseEntity::from_body(&body);
            tracing::debug!(
                status = status.as_u16(),
                url = %request.url(),
                body = %body,
                "Bridge rejected request"
            );
            return Err(BridgeError::Rejected {
                status: status.as_u16(),
                entity,
            }
            .into());
        }

        Ok(body)
    }

    async fn dispatch(&self, request: &BridgeRequest) -> Result<(StatusCode, String), TransportError> {
        tracing::debug!(method = %request.method(), url = %request.url(), "Sending bridge request");

        let mut builder = self
            .client
            .request(request.method().clone(), request.url());
        if let Some(body) = request.body() {
            tracing::trace!(body = %body, "Request body");
            builder = builder.json(body);
        }
        for (name, value) in request.headers() {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(timeout) = request.timeout() {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        tracing::trace!(status = status.as_u16(), body = %body, "Received bridge response");

        Ok((status, body))
    }
}

/// Builder for a [`BridgeHttpClient`] with non-default settings.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use boschshc::protocol::{BridgeAddress, BridgeHttpClient, PairingCredential};
///
/// # fn example(credential: &PairingCredential) -> boschshc::Result<()> {
/// let address = BridgeAddress::new("192.168.1.20")?;
/// let client = BridgeHttpClient::builder(address)
///     .timeout(Duration::from_secs(5))
///     .build(credential)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct BridgeHttpClientBuilder {
    address: BridgeAddress,
    timeout: Duration,
}

impl BridgeHttpClientBuilder {
    /// Creates a builder for the given address.
    #[must_use]
    pub fn new(address: BridgeAddress) -> Self {
        Self {
            address,
            timeout: BridgeHttpClient::DEFAULT_TIMEOUT,
        }
    }

    /// Sets the default request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds the client, presenting `credential` during TLS handshakes.
    ///
    /// The bridge serves a self-signed certificate, so server certificates
    /// are not verified; the bridge authenticates this client instead.
    ///
    /// # Errors
    ///
    /// Returns [`PairingError::InvalidCertificate`] if the credential is
    /// unusable, or [`TransportError::ClientSetup`] if the HTTP client cannot
    /// be created.
    pub fn build(self, credential: &PairingCredential) -> Result<BridgeHttpClient, Error> {
        let identity = credential.identity()?;

        let client = Client::builder()
            .use_rustls_tls()
            .identity(identity)
            .danger_accept_invalid_certs(true)
            .timeout(self.timeout)
            .build()
            .map_err(|e| TransportError::ClientSetup(e.to_string()))?;

        Ok(BridgeHttpClient {
            address: self.address,
            client,
            client_id: credential.client_id().clone(),
            certificate: credential.certificate_for_pairing().to_string(),
        })
    }
}

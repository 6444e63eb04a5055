// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `boschshc` library.
//!
//! Failures fall into five classes that callers handle differently:
//!
//! - [`ConfigError`]: missing bridge, missing device id, unusable settings.
//!   Never retried.
//! - [`PairingError`]: the client credential itself is unusable.
//! - [`TransportError`]: the bridge could not be reached or did not answer.
//!   Expected while the controller is offline; callers retry on their own cadence.
//! - [`BridgeError`]: the bridge answered with a well-formed error.
//! - [`DecodeError`]: the bridge answered with JSON of an unexpected shape.

use thiserror::Error;

use crate::response::{JsonRestExceptionResponseEntity, JsonRpcError};

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration is missing or invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pairing credential or pairing parameters are unusable.
    #[error("pairing failed: {0}")]
    Pairing(#[from] PairingError),

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The bridge answered with an error.
    #[error("bridge error: {0}")]
    Bridge(#[from] BridgeError),

    /// The response body could not be decoded into the expected type.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// A value could not be parsed.
    #[error("value error: {0}")]
    Value(#[from] ValueError),
}

impl Error {
    /// Returns true if the request failed before any response was received.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Returns true if a response arrived but could not be decoded.
    #[must_use]
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_))
    }

    /// Returns true for configuration and credential errors.
    ///
    /// These cannot be fixed by repeating the same request.
    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Pairing(_))
    }
}

/// Errors caused by missing or invalid configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The thing has no bridge, or the bridge handler is not available.
    #[error("no valid bridge set for {0}")]
    MissingBridge(String),

    /// The device configuration has no bridge device id.
    #[error("device id is missing")]
    MissingDeviceId,

    /// The bridge address is empty or malformed.
    #[error("invalid bridge address: {0}")]
    InvalidAddress(String),

    /// No pairing credential was found in the credential directory.
    #[error("no pairing credential found in {0}")]
    MissingCredential(String),

    /// The credential file could not be read or written.
    #[error("credential storage failed for {path}: {source}")]
    CredentialIo {
        /// The file that could not be accessed.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Services were registered after the handler finished initializing.
    #[error("service registration for {0} is closed")]
    RegistrationClosed(String),

    /// The host returned a configuration that could not be used.
    #[error("invalid device configuration: {0}")]
    InvalidDeviceConfig(String),
}

/// Errors raised when parsing host-facing values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// An on/off state string was not recognized.
    #[error("invalid on/off state: {0}")]
    InvalidOnOff(String),

    /// An open/closed state string was not recognized.
    #[error("invalid open/closed state: {0}")]
    InvalidOpenClosed(String),

    /// A channel UID did not have the `binding:type:bridge:thing:channel` shape.
    #[error("invalid channel UID: {0}")]
    InvalidChannelUid(String),
}

/// Errors that make pairing impossible regardless of bridge reachability.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PairingError {
    /// The client identifier contains characters the bridge rejects.
    #[error("invalid client id: {0}")]
    InvalidClientId(String),

    /// Pairing was requested without the SHC system password.
    #[error("system password is required for pairing")]
    MissingSystemPassword,

    /// The client certificate or private key could not be loaded.
    #[error("invalid client certificate: {0}")]
    InvalidCertificate(String),
}

/// Errors raised when no response was received from the bridge.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP request failed (connection refused, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The HTTP client could not be created.
    #[error("HTTP client setup failed: {0}")]
    ClientSetup(String),
}

impl TransportError {
    /// Returns true if the request timed out.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_timeout())
    }
}

/// Well-formed error answers from the bridge.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The bridge rejected the request with a non-success status.
    #[error("request rejected with HTTP {status}{}", rejected_suffix(.entity))]
    Rejected {
        /// HTTP status code of the answer.
        status: u16,
        /// Decoded error entity, if the body had that shape.
        entity: Option<JsonRestExceptionResponseEntity>,
    },

    /// A JSON-RPC call returned an error object.
    #[error("JSON-RPC error {0}")]
    JsonRpc(JsonRpcError),

    /// The long-poll subscription is unknown to the bridge.
    #[error("subscription expired: {0}")]
    SubscriptionExpired(String),
}

fn rejected_suffix(entity: &Option<JsonRestExceptionResponseEntity>) -> String {
    entity
        .as_ref()
        .map(|e| format!(" ({})", e.error_code))
        .unwrap_or_default()
}

/// Errors related to decoding bridge payloads.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// JSON decoding failed.
    #[error("JSON decode error: {0}")]
    Json(#[from] serde_json::Error),

    /// A JSON-RPC response carried neither a result nor an error.
    #[error("JSON-RPC response without result")]
    MissingResult,
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(DecodeError::Json(err))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(TransportError::Http(err))
    }
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

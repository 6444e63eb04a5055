// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Client identity used for mutual TLS with the bridge.
//!
//! The bridge only accepts API calls from clients whose certificate was
//! registered through pairing. The certificate, its private key and the
//! client id form a [`PairingCredential`], which is persisted so the same
//! identity is presented again after a restart.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Error, PairingError};

/// File name of the persisted credential inside the credential directory.
pub const CREDENTIAL_FILE: &str = "credential.json";

/// Prefix the bridge expects for open-source clients.
const CLIENT_ID_PREFIX: &str = "oss_";

const MAX_CLIENT_ID_LEN: usize = 64;

/// Identifier under which the client is registered on the bridge.
///
/// Valid ids are non-empty, at most 64 characters long, and consist of ASCII
/// letters, digits, `_`, `-` and `.`.
///
/// # Examples
///
/// ```
/// use boschshc::protocol::ClientId;
///
/// let id = ClientId::new("oss_living_room").unwrap();
/// assert_eq!(id.as_str(), "oss_living_room");
///
/// assert!(ClientId::new("has space").is_err());
/// assert!(ClientId::generate().as_str().starts_with("oss_"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClientId(String);

impl ClientId {
    /// Validates and wraps a client id.
    ///
    /// # Errors
    ///
    /// Returns [`PairingError::InvalidClientId`] if the id is malformed.
    pub fn new(id: impl Into<String>) -> Result<Self, PairingError> {
        let id = id.into();
        let valid = !id.is_empty()
            && id.len() <= MAX_CLIENT_ID_LEN
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));

        if valid {
            Ok(Self(id))
        } else {
            Err(PairingError::InvalidClientId(id))
        }
    }

    /// Generates a fresh `oss_` client id.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("{CLIENT_ID_PREFIX}{}", uuid::Uuid::new_v4().simple()))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ClientId {
    type Err = PairingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ClientId {
    type Error = PairingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ClientId> for String {
    fn from(id: ClientId) -> Self {
        id.0
    }
}

/// Client id, certificate and private key presented to the bridge.
#[derive(Clone, Serialize, Deserialize)]
pub struct PairingCredential {
    client_id: ClientId,
    certificate_pem: String,
    private_key_pem: String,
}

impl PairingCredential {
    /// Creates a credential from PEM-encoded certificate and private key.
    ///
    /// # Errors
    ///
    /// Returns [`PairingError::InvalidCertificate`] if either block is not PEM.
    pub fn from_pem(
        client_id: ClientId,
        certificate_pem: impl Into<String>,
        private_key_pem: impl Into<String>,
    ) -> Result<Self, PairingError> {
        let certificate_pem = certificate_pem.into();
        let private_key_pem = private_key_pem.into();

        if !certificate_pem.contains("-----BEGIN CERTIFICATE-----") {
            return Err(PairingError::InvalidCertificate(
                "certificate is not PEM encoded".to_string(),
            ));
        }
        if !private_key_pem.contains("PRIVATE KEY-----") {
            return Err(PairingError::InvalidCertificate(
                "private key is not PEM encoded".to_string(),
            ));
        }

        Ok(Self {
            client_id,
            certificate_pem,
            private_key_pem,
        })
    }

    /// Returns the client id.
    #[must_use]
    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    /// Returns the certificate as sent in the pairing request.
    #[must_use]
    pub fn certificate_for_pairing(&self) -> &str {
        self.certificate_pem.trim()
    }

    /// Builds the TLS identity presented during the handshake.
    ///
    /// # Errors
    ///
    /// Returns [`PairingError::InvalidCertificate`] if the PEM blocks cannot
    /// be parsed into a certificate and key.
    pub fn identity(&self) -> Result<reqwest::Identity, PairingError> {
        let mut pem = String::with_capacity(self.certificate_pem.len() + self.private_key_pem.len() + 1);
        pem.push_str(self.certificate_pem.trim_end());
        pem.push('\n');
        pem.push_str(&self.private_key_pem);

        reqwest::Identity::from_pem(pem.as_bytes())
            .map_err(|e| PairingError::InvalidCertificate(e.to_string()))
    }

    /// Returns the path of the credential file inside `dir`.
    #[must_use]
    pub fn path_in(dir: &Path) -> PathBuf {
        dir.join(CREDENTIAL_FILE)
    }

    /// Loads a persisted credential from `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCredential`] if no credential was
    /// persisted, [`ConfigError::CredentialIo`] if it cannot be read, and a
    /// decode error if the file is corrupt.
    pub fn load(dir: &Path) -> Result<Self, Error> {
        let path = Self::path_in(dir);
        if !path.exists() {
            return Err(ConfigError::MissingCredential(dir.display().to_string()).into());
        }

        let contents = fs::read_to_string(&path).map_err(|source| ConfigError::CredentialIo {
            path: path.display().to_string(),
            source,
        })?;
        let credential: Self = serde_json::from_str(&contents)?;

        tracing::debug!(
            client_id = %credential.client_id,
            path = %path.display(),
            "Loaded pairing credential"
        );
        Ok(credential)
    }

    /// Persists this credential into `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::CredentialIo`] if the file cannot be written.
    pub fn persist(&self, dir: &Path) -> Result<(), Error> {
        let path = Self::path_in(dir);
        let io_error = |source| ConfigError::CredentialIo {
            path: path.display().to_string(),
            source,
        };

        fs::create_dir_all(dir).map_err(io_error)?;
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(&path, contents).map_err(io_error)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o600)).map_err(io_error)?;
        }

        tracing::info!(
            client_id = %self.client_id,
            path = %path.display(),
            "Saved pairing credential"
        );
        Ok(())
    }

    /// Loads the credential from `dir`, or imports the given PEM pair on first use.
    ///
    /// An imported credential gets a generated client id and is persisted so
    /// later starts reuse it.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted credential is unreadable, or if the
    /// PEM pair is invalid or cannot be persisted.
    pub fn load_or_import(
        dir: &Path,
        certificate_pem: &str,
        private_key_pem: &str,
    ) -> Result<Self, Error> {
        match Self::load(dir) {
            Err(Error::Config(ConfigError::MissingCredential(_))) => {
                let credential =
                    Self::from_pem(ClientId::generate(), certificate_pem, private_key_pem)?;
                credential.persist(dir)?;
                Ok(credential)
            }
            other => other,
        }
    }
}

impl fmt::Debug for PairingCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PairingCredential")
            .field("client_id", &self.client_id)
            .field("private_key_pem", &"<redacted>")
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CERT: &str = include_str!("../../tests/fixtures/client-cert.pem");
    const KEY: &str = include_str!("../../tests/fixtures/client-key.pem");

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("boschshc-credential-{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn client_id_validation() {
        assert!(ClientId::new("oss_openhab_binding").is_ok());
        assert!(ClientId::new("client-1.2").is_ok());
        assert!(ClientId::new("").is_err());
        assert!(ClientId::new("with/slash").is_err());
        assert!(ClientId::new("ümlaut").is_err());
        assert!(ClientId::new("x".repeat(65)).is_err());
    }

    #[test]
    fn generated_client_ids_are_unique_and_valid() {
        let a = ClientId::generate();
        let b = ClientId::generate();
        assert_ne!(a, b);
        assert!(ClientId::new(a.as_str()).is_ok());
    }

    #[test]
    fn client_id_rejected_when_deserializing() {
        let result: Result<ClientId, _> = serde_json::from_str(r#""bad id""#);
        assert!(result.is_err());
    }

    #[test]
    fn from_pem_rejects_non_pem() {
        let id = ClientId::new("oss_test").unwrap();
        assert!(matches!(
            PairingCredential::from_pem(id.clone(), "not a cert", KEY),
            Err(PairingError::InvalidCertificate(_))
        ));
        assert!(matches!(
            PairingCredential::from_pem(id, CERT, "not a key"),
            Err(PairingError::InvalidCertificate(_))
        ));
    }

    #[test]
    fn identity_from_fixture() {
        let credential =
            PairingCredential::from_pem(ClientId::new("oss_test").unwrap(), CERT, KEY).unwrap();
        assert!(credential.identity().is_ok());
        assert!(credential.certificate_for_pairing().ends_with("-----END CERTIFICATE-----"));
    }

    #[test]
    fn debug_redacts_private_key() {
        let credential =
            PairingCredential::from_pem(ClientId::new("oss_test").unwrap(), CERT, KEY).unwrap();
        let debug = format!("{credential:?}");
        assert!(debug.contains("oss_test"));
        assert!(!debug.contains("BEGIN PRIVATE KEY"));
    }

    #[test]
    fn persist_and_load() {
        let dir = temp_dir();
        let credential =
            PairingCredential::from_pem(ClientId::new("oss_persisted").unwrap(), CERT, KEY)
                .unwrap();

        credential.persist(&dir).unwrap();
        let loaded = PairingCredential::load(&dir).unwrap();

        assert_eq!(loaded.client_id().as_str(), "oss_persisted");
        assert_eq!(loaded.certificate_for_pairing(), credential.certificate_for_pairing());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn load_missing_credential() {
        let err = PairingCredential::load(&temp_dir()).unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::MissingCredential(_))
        ));
    }

    #[test]
    fn load_or_import_reuses_persisted_identity() {
        let dir = temp_dir();

        let first = PairingCredential::load_or_import(&dir, CERT, KEY).unwrap();
        let second = PairingCredential::load_or_import(&dir, CERT, KEY).unwrap();

        assert!(first.client_id().as_str().starts_with("oss_"));
        assert_eq!(first.client_id(), second.client_id());

        fs::remove_dir_all(&dir).unwrap();
    }
}

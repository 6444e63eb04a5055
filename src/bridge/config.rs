// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bridge configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::error::ConfigError;
use crate::protocol::{API_PORT, BridgeAddress, PAIRING_PORT};

/// Configuration of one Bosch Smart Home Controller.
///
/// Hosts usually deserialize it from their own configuration store; field
/// names are camelCase and everything except `ipAddress` has a default.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use boschshc::bridge::BridgeConfig;
///
/// let config: BridgeConfig = serde_json::from_str(
///     r#"{"ipAddress": "192.168.1.20", "password": "secret", "timeout": 5}"#,
/// ).unwrap();
/// assert_eq!(config.api_port, 8444);
/// assert_eq!(config.timeout, Duration::from_secs(5));
///
/// let config = BridgeConfig::new("192.168.1.20")
///     .with_credential_dir("/var/lib/boschshc")
///     .with_long_poll_timeout(30);
/// assert_eq!(config.long_poll_timeout, 30);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeConfig {
    /// IP address or host name of the controller.
    pub ip_address: String,
    /// System password of the controller, only needed for pairing.
    #[serde(default)]
    pub password: Option<String>,
    /// Port of the pairing endpoint.
    #[serde(default = "default_pairing_port")]
    pub pairing_port: u16,
    /// Port of the API endpoints.
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    /// Whether to talk HTTPS. Only disabled against test doubles.
    #[serde(default = "default_use_https")]
    pub use_https: bool,
    /// Timeout of ordinary requests, in seconds when deserialized.
    #[serde(default = "default_timeout", deserialize_with = "duration_from_secs")]
    pub timeout: Duration,
    /// Seconds the bridge holds a long poll open before answering empty.
    #[serde(default = "default_long_poll_timeout")]
    pub long_poll_timeout: u64,
    /// Directory holding the persisted pairing credential.
    #[serde(default = "default_credential_dir")]
    pub credential_dir: PathBuf,
    /// Backoff for the long-poll subscription.
    #[serde(skip)]
    pub reconnection: ReconnectionPolicy,
}

impl BridgeConfig {
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
    /// Default long-poll duration in seconds.
    pub const DEFAULT_LONG_POLL_TIMEOUT: u64 = 20;

    /// Creates a configuration for the controller at `ip_address`.
    #[must_use]
    pub fn new(ip_address: impl Into<String>) -> Self {
        Self {
            ip_address: ip_address.into(),
            password: None,
            pairing_port: PAIRING_PORT,
            api_port: API_PORT,
            use_https: true,
            timeout: Self::DEFAULT_TIMEOUT,
            long_poll_timeout: Self::DEFAULT_LONG_POLL_TIMEOUT,
            credential_dir: default_credential_dir(),
            reconnection: ReconnectionPolicy::default(),
        }
    }

    /// Sets the system password used for pairing.
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Overrides the pairing and API ports.
    #[must_use]
    pub fn with_ports(mut self, pairing_port: u16, api_port: u16) -> Self {
        self.pairing_port = pairing_port;
        self.api_port = api_port;
        self
    }

    /// Talks plain HTTP instead of HTTPS.
    #[must_use]
    pub fn with_plain_http(mut self) -> Self {
        self.use_https = false;
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets how many seconds the bridge may hold a long poll.
    #[must_use]
    pub fn with_long_poll_timeout(mut self, seconds: u64) -> Self {
        self.long_poll_timeout = seconds;
        self
    }

    /// Sets the directory holding the pairing credential.
    #[must_use]
    pub fn with_credential_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.credential_dir = dir.into();
        self
    }

    /// Sets the reconnection policy.
    #[must_use]
    pub fn with_reconnection(mut self, policy: ReconnectionPolicy) -> Self {
        self.reconnection = policy;
        self
    }

    /// Returns the system password if one is configured and non-empty.
    #[must_use]
    pub fn system_password(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.is_empty())
    }

    /// Builds the validated bridge address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidAddress`] for an empty or malformed host.
    pub fn address(&self) -> Result<BridgeAddress, ConfigError> {
        let address = BridgeAddress::new(self.ip_address.trim())?
            .with_ports(self.pairing_port, self.api_port);
        Ok(if self.use_https {
            address
        } else {
            address.with_plain_http()
        })
    }
}

fn default_pairing_port() -> u16 {
    PAIRING_PORT
}

fn default_api_port() -> u16 {
    API_PORT
}

fn default_use_https() -> bool {
    true
}

fn default_timeout() -> Duration {
    BridgeConfig::DEFAULT_TIMEOUT
}

fn default_long_poll_timeout() -> u64 {
    BridgeConfig::DEFAULT_LONG_POLL_TIMEOUT
}

fn default_credential_dir() -> PathBuf {
    PathBuf::from("boschshc")
}

fn duration_from_secs<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    u64::deserialize(deserializer).map(Duration::from_secs)
}

/// Backoff applied when the long-poll subscription fails.
///
/// After the `n`-th consecutive failure the loop waits
/// `initial_delay * backoff_multiplier^n`, capped at `max_delay`.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use boschshc::bridge::ReconnectionPolicy;
///
/// let policy = ReconnectionPolicy::new()
///     .with_max_retries(5)
///     .with_initial_delay(Duration::from_millis(500))
///     .with_max_delay(Duration::from_secs(30));
///
/// assert_eq!(policy.delay_for_attempt(2), Duration::from_secs(2));
/// assert!(!policy.should_retry(5));
/// assert!(!ReconnectionPolicy::disabled().should_retry(0));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectionPolicy {
    /// Whether long polling resumes after a failure at all.
    pub enabled: bool,
    /// Consecutive failures tolerated before long polling stops; `None` never stops.
    pub max_retries: Option<u32>,
    /// Wait after the first failure.
    pub initial_delay: Duration,
    /// Upper bound of the wait.
    pub max_delay: Duration,
    /// Growth of the wait per consecutive failure.
    pub backoff_multiplier: f64,
}

impl ReconnectionPolicy {
    /// Creates the default policy: 1 s doubling up to 60 s, retried forever.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a policy that stops long polling at the first failure.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Stops after `max_retries` consecutive failures.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Never stops retrying.
    #[must_use]
    pub fn with_infinite_retries(mut self) -> Self {
        self.max_retries = None;
        self
    }

    /// Sets the wait after the first failure.
    #[must_use]
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the upper bound of the wait.
    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the growth of the wait per consecutive failure.
    #[must_use]
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Returns how long to wait after failure number `attempt` (zero based).
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = self.backoff_multiplier.powf(f64::from(attempt));
        Duration::try_from_secs_f64(self.initial_delay.as_secs_f64() * factor)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    /// Returns true if long polling should resume after failure number `attempt`.
    #[must_use]
    pub fn should_retry(&self, attempt: u32) -> bool {
        self.enabled && self.max_retries.is_none_or(|max| attempt < max)
    }
}

impl Default for ReconnectionPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            max_retries: None,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            backoff_multiplier: 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_with_defaults() {
        let config: BridgeConfig = serde_json::from_str(r#"{"ipAddress": "192.168.1.20"}"#).unwrap();

        assert_eq!(config.ip_address, "192.168.1.20");
        assert_eq!(config.password, None);
        assert_eq!(config.pairing_port, 8443);
        assert_eq!(config.api_port, 8444);
        assert!(config.use_https);
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.long_poll_timeout, 20);
        assert_eq!(config.credential_dir, PathBuf::from("boschshc"));
        assert_eq!(config.reconnection, ReconnectionPolicy::default());
    }

    #[test]
    fn deserialize_requires_ip_address() {
        assert!(serde_json::from_str::<BridgeConfig>(r#"{"password": "x"}"#).is_err());
    }

    #[test]
    fn empty_password_is_no_password() {
        let config = BridgeConfig::new("10.0.0.2").with_password("");
        assert_eq!(config.system_password(), None);

        let config = config.with_password("secret");
        assert_eq!(config.system_password(), Some("secret"));
    }

    #[test]
    fn address_honours_ports_and_scheme() {
        let address = BridgeConfig::new(" 10.0.0.2 ")
            .with_ports(18443, 18444)
            .with_plain_http()
            .address()
            .unwrap();

        assert_eq!(address.host(), "10.0.0.2");
        assert_eq!(address.pairing_port(), 18443);
        assert_eq!(address.api_port(), 18444);
        assert!(!address.use_https());
    }

    #[test]
    fn address_rejects_url() {
        let err = BridgeConfig::new("https://10.0.0.2").address().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidAddress(_)));
    }

    #[test]
    fn backoff_doubles_up_to_cap() {
        let policy = ReconnectionPolicy::new().with_max_delay(Duration::from_secs(10));

        let delays: Vec<u64> = (0..6).map(|n| policy.delay_for_attempt(n).as_secs()).collect();
        assert_eq!(delays, vec![1, 2, 4, 8, 10, 10]);
    }

    #[test]
    fn backoff_saturates_for_huge_attempts() {
        let policy = ReconnectionPolicy::default();
        assert_eq!(policy.delay_for_attempt(u32::MAX), Duration::from_secs(60));
    }

    #[test]
    fn constant_backoff() {
        let policy = ReconnectionPolicy::new()
            .with_initial_delay(Duration::from_millis(250))
            .with_backoff_multiplier(1.0);
        assert_eq!(policy.delay_for_attempt(7), Duration::from_millis(250));
    }

    #[test]
    fn retries_forever_by_default() {
        let policy = ReconnectionPolicy::default();
        assert!(policy.should_retry(10_000));
        assert!(!ReconnectionPolicy::disabled().should_retry(0));
    }

    #[test]
    fn retry_limit() {
        let policy = ReconnectionPolicy::new().with_max_retries(3);
        assert!(policy.should_retry(2));
        assert!(!policy.should_retry(3));
        assert!(policy.with_infinite_retries().should_retry(3));
    }
}

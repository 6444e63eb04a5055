// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! URL families of the bridge API.

use crate::error::ConfigError;

/// Port of the pairing endpoint.
pub const PAIRING_PORT: u16 = 8443;

/// Port of every other endpoint.
pub const API_PORT: u16 = 8444;

/// One of the four URL shapes the bridge exposes.
///
/// # Examples
///
/// ```
/// use boschshc::protocol::{BridgeAddress, BridgeEndpoint};
///
/// let address = BridgeAddress::new("192.168.1.20").unwrap();
/// let url = BridgeEndpoint::DeviceService {
///     device_id: "hdm:HomeMaticIP:1",
///     service_name: "ShutterContact",
/// }
/// .url(&address);
///
/// assert_eq!(
///     url,
///     "https://192.168.1.20:8444/smarthome/devices/hdm:HomeMaticIP:1/services/ShutterContact/state"
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeEndpoint<'a> {
    /// `https://{host}:8443/smarthome/clients`
    Pairing,
    /// `https://{host}:8444/{path}`
    Bridge(&'a str),
    /// `https://{host}:8444/smarthome/{path}`
    SmartHome(&'a str),
    /// `https://{host}:8444/smarthome/devices/{device_id}/services/{service_name}/state`
    DeviceService {
        /// Bridge-assigned device id.
        device_id: &'a str,
        /// Service name, e.g. `ShutterContact`.
        service_name: &'a str,
    },
}

impl BridgeEndpoint<'_> {
    /// Builds the absolute URL of this endpoint on the given bridge.
    #[must_use]
    pub fn url(&self, address: &BridgeAddress) -> String {
        match self {
            Self::Pairing => format!("{}/smarthome/clients", address.pairing_base()),
            Self::Bridge(path) => format!("{}/{path}", address.api_base()),
            Self::SmartHome(path) => format!("{}/smarthome/{path}", address.api_base()),
            Self::DeviceService {
                device_id,
                service_name,
            } => format!(
                "{}/smarthome/devices/{device_id}/services/{service_name}/state",
                address.api_base()
            ),
        }
    }
}

/// Scheme, host and ports of one bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeAddress {
    host: String,
    pairing_port: u16,
    api_port: u16,
    use_https: bool,
}

impl BridgeAddress {
    /// Creates the address of a bridge on its standard ports.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidAddress`] if `host` is empty or contains
    /// a scheme, path or whitespace.
    pub fn new(host: impl Into<String>) -> Result<Self, ConfigError> {
        let host = host.into();
        if host.is_empty()
            || host.contains("://")
            || host.contains('/')
            || host.chars().any(char::is_whitespace)
        {
            return Err(ConfigError::InvalidAddress(host));
        }

        Ok(Self {
            host,
            pairing_port: PAIRING_PORT,
            api_port: API_PORT,
            use_https: true,
        })
    }

    /// Overrides the ports.
    #[must_use]
    pub fn with_ports(mut self, pairing_port: u16, api_port: u16) -> Self {
        self.pairing_port = pairing_port;
        self.api_port = api_port;
        self
    }

    /// Switches to plain HTTP.
    #[must_use]
    pub fn with_plain_http(mut self) -> Self {
        self.use_https = false;
        self
    }

    /// Returns the host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the pairing port.
    #[must_use]
    pub fn pairing_port(&self) -> u16 {
        self.pairing_port
    }

    /// Returns the API port.
    #[must_use]
    pub fn api_port(&self) -> u16 {
        self.api_port
    }

    /// Returns whether HTTPS is used.
    #[must_use]
    pub fn use_https(&self) -> bool {
        self.use_https
    }

    fn scheme(&self) -> &'static str {
        if self.use_https { "https" } else { "http" }
    }

    fn pairing_base(&self) -> String {
        format!("{}://{}:{}", self.scheme(), self.host, self.pairing_port)
    }

    fn api_base(&self) -> String {
        format!("{}://{}:{}", self.scheme(), self.host, self.api_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn localhost() -> BridgeAddress {
        BridgeAddress::new("127.0.0.1").unwrap()
    }

    #[test]
    fn pairing_url() {
        assert_eq!(
            BridgeEndpoint::Pairing.url(&localhost()),
            "https://127.0.0.1:8443/smarthome/clients"
        );
    }

    #[test]
    fn bridge_url() {
        assert_eq!(
            BridgeEndpoint::Bridge("testEndpoint").url(&localhost()),
            "https://127.0.0.1:8444/testEndpoint"
        );
    }

    #[test]
    fn smart_home_url() {
        assert_eq!(
            BridgeEndpoint::SmartHome("endpointForTest").url(&localhost()),
            "https://127.0.0.1:8444/smarthome/endpointForTest"
        );
    }

    #[test]
    fn device_service_url() {
        let endpoint = BridgeEndpoint::DeviceService {
            device_id: "testDevice",
            service_name: "testService",
        };
        assert_eq!(
            endpoint.url(&localhost()),
            "https://127.0.0.1:8444/smarthome/devices/testDevice/services/testService/state"
        );
    }

    #[test]
    fn custom_ports_and_plain_http() {
        let address = localhost().with_ports(18443, 18444).with_plain_http();
        assert_eq!(
            BridgeEndpoint::Pairing.url(&address),
            "http://127.0.0.1:18443/smarthome/clients"
        );
        assert_eq!(
            BridgeEndpoint::Bridge("remote/json-rpc").url(&address),
            "http://127.0.0.1:18444/remote/json-rpc"
        );
    }

    #[test]
    fn rejects_malformed_hosts() {
        assert!(BridgeAddress::new("").is_err());
        assert!(BridgeAddress::new("https://192.168.1.20").is_err());
        assert!(BridgeAddress::new("192.168.1.20/smarthome").is_err());
        assert!(BridgeAddress::new("shc host").is_err());
        assert!(BridgeAddress::new("shc-012345.local").is_ok());
    }
}

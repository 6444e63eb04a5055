// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `boschshc` - A Rust library to control Bosch Smart Home Controller devices.
//!
//! The controller (SHC) exposes a local HTTPS API secured with client
//! certificates. This library pairs with it, keeps a long-poll subscription
//! open and turns device service states into values a home-automation host
//! can publish on its channels.
//!
//! # Supported Features
//!
//! - **Pairing**: register a client certificate with the controller
//! - **Requests**: typed requests against the pairing, bridge, smart-home and
//!   device-service endpoints
//! - **Long polling**: pushed state changes routed to device handlers, with
//!   exponential backoff while the controller is unreachable
//! - **Devices**: window/door contacts, in-wall switches and thermostats
//!
//! # Quick Start
//!
//! ## Talking to the controller directly
//!
//! ```no_run
//! use boschshc::protocol::{BridgeHttpClient, PairingCredential};
//! use boschshc::response::Device;
//! use reqwest::Method;
//!
//! #[tokio::main]
//! async fn main() -> boschshc::Result<()> {
//!     // Imports the PEM pair on first start and reuses it afterwards
//!     let credential = PairingCredential::load_or_import(
//!         "/var/lib/boschshc".as_ref(),
//!         &std::fs::read_to_string("client-cert.pem").unwrap_or_default(),
//!         &std::fs::read_to_string("client-key.pem").unwrap_or_default(),
//!     )?;
//!     let client = BridgeHttpClient::new("192.168.1.20", &credential)?;
//!
//!     // Press the pairing button on the controller first
//!     if !client.is_access_possible().await && !client.do_pairing("system-password").await? {
//!         eprintln!("pairing refused");
//!         return Ok(());
//!     }
//!
//!     let request = client.create_request(&client.smart_home_url("devices"), Method::GET);
//!     let devices: Vec<Device> = client.send_request(&request).await?;
//!     for device in devices {
//!         println!("{} ({})", device.name, device.id);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Bridge and device handlers
//!
//! Hosts create one [`BridgeHandler`] per controller and one
//! [`ThingHandler`](device::ThingHandler) per device, coupled through their
//! own [`HostAdapter`](device::HostAdapter) implementation. See the
//! [`device`] module for a complete adapter.
//!
//! ```no_run
//! use std::sync::Arc;
//! use boschshc::bridge::{BridgeConfig, BridgeHandler};
//!
//! #[tokio::main]
//! async fn main() -> boschshc::Result<()> {
//!     let config = BridgeConfig::new("192.168.1.20")
//!         .with_password("system-password")
//!         .with_credential_dir("/var/lib/boschshc");
//!     let bridge = Arc::new(BridgeHandler::new(config)?);
//!
//!     let mut events = bridge.subscribe();
//!     bridge.initialize().await?;
//!
//!     while let Ok(event) = events.recv().await {
//!         println!("{event:?}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Logging
//!
//! All diagnostics are emitted through [`tracing`]; install a subscriber in
//! the host to see them. Request and response bodies are logged at `trace`.

pub mod bridge;
pub mod device;
pub mod error;
pub mod event;
pub mod protocol;
pub mod response;
pub mod services;
pub mod types;

pub use bridge::{BridgeConfig, BridgeHandler, ReconnectionPolicy};
pub use error::{
    BridgeError, ConfigError, DecodeError, Error, PairingError, Result, TransportError, ValueError,
};
pub use protocol::{BridgeHttpClient, BridgeRequest, ClientId, PairingCredential};
pub use types::{ChannelState, ChannelUid, Command, OnOff, OpenClosed, StatusDetail, ThingStatus};

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device handlers and their coupling to the host framework.
//!
//! The host framework owns things and channels. It talks to a device through
//! the [`ThingHandler`] trait and lends the device its own services through a
//! [`HostAdapter`]: configuration lookup, status and channel publication,
//! and the bridge the device belongs to.
//!
//! Concrete handlers compose a [`DeviceHandler`], which keeps the service
//! registry and implements the shared refresh and update routing:
//!
//! ```text
//! host ──handle_command(REFRESH, channel)──► DeviceHandler ──► every service affecting channel ──► GET state
//! bridge ──process_update(name, state)─────► DeviceHandler ──► every service named `name` ──► listener
//!                                                                                             │
//! host ◄──────────────────────update_state(channel, value)──────────────────────────────────┘
//! ```
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use boschshc::bridge::BridgeHandler;
//! use boschshc::device::{DeviceConfig, HostAdapter, ThingHandler, WindowContactHandler};
//! use boschshc::error::ConfigError;
//! use boschshc::types::{ChannelState, ThingStatus};
//!
//! struct Host {
//!     bridge: Arc<BridgeHandler>,
//! }
//!
//! impl HostAdapter for Host {
//!     fn device_config(&self) -> Result<DeviceConfig, ConfigError> {
//!         Ok(DeviceConfig::new("hdm:HomeMaticIP:3014F711A0001916D859A8A9"))
//!     }
//!     fn update_status(&self, status: ThingStatus) {
//!         println!("status: {status}");
//!     }
//!     fn update_state(&self, channel_id: &str, state: ChannelState) {
//!         println!("{channel_id} = {state:?}");
//!     }
//!     fn bridge(&self) -> Option<Arc<BridgeHandler>> {
//!         Some(Arc::clone(&self.bridge))
//!     }
//! }
//!
//! # fn example(bridge: Arc<BridgeHandler>) -> boschshc::Result<()> {
//! let host = Arc::new(Host { bridge: Arc::clone(&bridge) });
//! let thing: Arc<dyn ThingHandler> = Arc::new(WindowContactHandler::new(host));
//!
//! thing.initialize()?;
//! bridge.child_handler_initialized(&thing)?;
//! # Ok(())
//! # }
//! ```

mod handler;
mod host;
mod inwall_switch;
mod thermostat;
mod window_contact;

pub use handler::{DeviceHandler, ServiceRegistrar};
pub use host::{HostAdapter, ThingHandler};
pub use inwall_switch::InWallSwitchHandler;
pub use thermostat::ThermostatHandler;
pub use window_contact::WindowContactHandler;

use serde::Deserialize;

/// Per-device configuration supplied by the host.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeviceConfig {
    /// Bridge id of the device, e.g. `hdm:HomeMaticIP:3014F711A0001916D859A8A9`.
    #[serde(default)]
    pub id: String,
}

impl DeviceConfig {
    /// Creates a configuration for the device with bridge id `id`.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Traits at the boundary to the host framework.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::DeviceConfig;
use crate::bridge::BridgeHandler;
use crate::error::{ConfigError, Error};
use crate::types::{ChannelState, ChannelUid, Command, ThingStatus};

/// Services the host framework provides to one device handler.
///
/// The device handler keeps its adapter alive. An adapter that also owns
/// its handler must hold it through a [`Weak`](std::sync::Weak) reference
/// or drop it on dispose, otherwise neither is ever freed.
pub trait HostAdapter: Send + Sync {
    /// Returns the configuration of the device.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidDeviceConfig`] if the host's
    /// configuration cannot be converted.
    fn device_config(&self) -> Result<DeviceConfig, ConfigError>;

    /// Publishes a new status of the device.
    fn update_status(&self, status: ThingStatus);

    /// Publishes a new value of a channel.
    fn update_state(&self, channel_id: &str, state: ChannelState);

    /// Returns the handler of the bridge the device belongs to.
    fn bridge(&self) -> Option<Arc<BridgeHandler>>;
}

/// Entry points the host framework calls on a device handler.
///
/// Hosts may call these concurrently for different devices; calls for one
/// channel are expected to be serialized.
#[async_trait]
pub trait ThingHandler: Send + Sync {
    /// Returns the bridge id of the device once its configuration is loaded.
    fn bosch_id(&self) -> Option<String>;

    /// Loads the configuration and registers the device services.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the device has no bridge or no id,
    /// or if it was already initialized.
    fn initialize(&self) -> Result<(), Error>;

    /// Handles a command for one of the device's channels.
    async fn handle_command(&self, channel: &ChannelUid, command: Command);

    /// Delivers a state pushed by the bridge for the named service.
    fn process_update(&self, service_name: &str, state: &Value);

    /// Returns the current status.
    fn status(&self) -> ThingStatus;
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use serde_json::Value;

use super::{DeviceHandler, HostAdapter, ThingHandler};
use crate::error::{ConfigError, Error};
use crate::services::{DeviceService, PowerSwitchState};
use crate::types::{CHANNEL_POWER_SWITCH, ChannelState, ChannelUid, Command, ThingStatus};

/// Handler for in-wall switches and smart plugs.
///
/// Publishes the `PowerSwitch` service on the `power-switch` channel and
/// writes ON/OFF commands back to the bridge. The new position is published
/// once the bridge pushes it.
#[derive(Debug)]
pub struct InWallSwitchHandler {
    base: DeviceHandler,
    power_switch: OnceLock<Arc<DeviceService<PowerSwitchState>>>,
}

impl InWallSwitchHandler {
    /// Creates a handler for the device behind `host`.
    #[must_use]
    pub fn new(host: Arc<dyn HostAdapter>) -> Self {
        Self {
            base: DeviceHandler::new(host),
            power_switch: OnceLock::new(),
        }
    }
}

#[async_trait]
impl ThingHandler for InWallSwitchHandler {
    fn bosch_id(&self) -> Option<String> {
        self.base.bosch_id()
    }

    fn initialize(&self) -> Result<(), Error> {
        self.base.initialize(|services| {
            let publish = services.channel_updater(CHANNEL_POWER_SWITCH);
            let power_switch = services.create_service(
                move |state: PowerSwitchState| publish(ChannelState::OnOff(state.switch_state)),
                &[CHANNEL_POWER_SWITCH],
            )?;

            self.power_switch
                .set(power_switch)
                .map_err(|_| ConfigError::RegistrationClosed(services.device_id().to_string()))?;
            Ok(())
        })
    }

    async fn handle_command(&self, channel: &ChannelUid, command: Command) {
        match command {
            Command::OnOff(state) if channel.id_without_group() == CHANNEL_POWER_SWITCH => {
                if !self.base.is_ready() {
                    return;
                }
                let Some(service) = self.power_switch.get() else {
                    tracing::debug!(channel = %channel, "Switch command before initialization");
                    return;
                };

                if let Err(e) = service.set_state(&PowerSwitchState::new(state)).await {
                    tracing::warn!(
                        device_id = service.device_id(),
                        state = %state,
                        error = %e,
                        "Switching failed"
                    );
                }
            }
            _ => self.base.handle_command(channel, command).await,
        }
    }

    fn process_update(&self, service_name: &str, state: &Value) {
        self.base.process_update(service_name, state);
    }

    fn status(&self) -> ThingStatus {
        self.base.status()
    }
}

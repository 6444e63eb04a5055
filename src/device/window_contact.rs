// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::{DeviceHandler, HostAdapter, ThingHandler};
use crate::error::Error;
use crate::services::ShutterContactState;
use crate::types::{CHANNEL_CONTACT, ChannelState, ChannelUid, Command, ThingStatus};

/// Handler for window and door contacts.
///
/// Publishes the `ShutterContact` service as OPEN/CLOSED on the `contact`
/// channel.
#[derive(Debug)]
pub struct WindowContactHandler {
    base: DeviceHandler,
}

impl WindowContactHandler {
    /// Creates a handler for the device behind `host`.
    #[must_use]
    pub fn new(host: Arc<dyn HostAdapter>) -> Self {
        Self {
            base: DeviceHandler::new(host),
        }
    }
}

#[async_trait]
impl ThingHandler for WindowContactHandler {
    fn bosch_id(&self) -> Option<String> {
        self.base.bosch_id()
    }

    fn initialize(&self) -> Result<(), Error> {
        self.base.initialize(|services| {
            let publish = services.channel_updater(CHANNEL_CONTACT);
            services.create_service(
                move |state: ShutterContactState| publish(ChannelState::OpenClosed(state.value)),
                &[CHANNEL_CONTACT],
            )?;
            Ok(())
        })
    }

    async fn handle_command(&self, channel: &ChannelUid, command: Command) {
        self.base.handle_command(channel, command).await;
    }

    fn process_update(&self, service_name: &str, state: &Value) {
        self.base.process_update(service_name, state);
    }

    fn status(&self) -> ThingStatus {
        self.base.status()
    }
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bridge handler owning the connection to one controller.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use reqwest::Method;
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::device::ThingHandler;
use crate::error::{ConfigError, Error};
use crate::event::{BridgeEvent, EventBus};
use crate::protocol::{BridgeHttpClient, PairingCredential};
use crate::response::{Device, DeviceServiceData};
use crate::services::ServiceState;
use crate::types::{StatusDetail, ThingStatus};

use super::config::BridgeConfig;
use super::long_poll::LongPolling;

/// Handler for one Bosch Smart Home Controller.
///
/// Owns the shared [`BridgeHttpClient`], runs the long-poll subscription in
/// a background task and routes pushed service states to the device
/// handlers attached through [`child_handler_initialized`].
///
/// Device handlers are tracked by weak reference; the host owns them.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use boschshc::bridge::{BridgeConfig, BridgeHandler};
///
/// # async fn example() -> boschshc::Result<()> {
/// let config = BridgeConfig::new("192.168.1.20")
///     .with_password("system-password")
///     .with_credential_dir("/var/lib/boschshc");
/// let bridge = Arc::new(BridgeHandler::new(config)?);
///
/// bridge.initialize().await?;
/// println!("bridge is {}", bridge.status());
///
/// bridge.dispose().await;
/// # Ok(())
/// # }
/// ```
///
/// [`child_handler_initialized`]: Self::child_handler_initialized
pub struct BridgeHandler {
    config: BridgeConfig,
    client: BridgeHttpClient,
    shared: Arc<BridgeShared>,
    /// Running long-poll task; locked for the whole of `initialize` and `dispose`.
    long_poll: Mutex<Option<LongPollTask>>,
}

struct LongPollTask {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl BridgeHandler {
    /// Creates a handler using the credential persisted in the configured
    /// credential directory.
    ///
    /// Performs no network I/O.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the address is invalid or no
    /// credential was persisted, and a pairing error if the credential is
    /// unusable.
    pub fn new(config: BridgeConfig) -> Result<Self, Error> {
        let credential = PairingCredential::load(&config.credential_dir)?;
        Self::with_credential(config, &credential)
    }

    /// Creates a handler presenting `credential` to the controller.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`new`](Self::new), except for credential
    /// storage errors.
    pub fn with_credential(config: BridgeConfig, credential: &PairingCredential) -> Result<Self, Error> {
        let client = BridgeHttpClient::builder(config.address()?)
            .timeout(config.timeout)
            .build(credential)?;

        Ok(Self {
            config,
            client,
            shared: Arc::new(BridgeShared::new()),
            long_poll: Mutex::new(None),
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Returns the HTTP client shared by all devices of this bridge.
    #[must_use]
    pub fn client(&self) -> &BridgeHttpClient {
        &self.client
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> ThingStatus {
        self.shared.status.read().clone()
    }

    /// Subscribes to events of this bridge.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<BridgeEvent> {
        self.shared.events.subscribe()
    }

    /// Connects to the controller and starts long polling.
    ///
    /// Pairs first if access is denied and a system password is configured.
    /// An unreachable controller, refused pairing or failing device query
    /// leaves the bridge OFFLINE and is not an error; the host decides when
    /// to try again.
    ///
    /// Calling this again restarts the subscription. Concurrent calls run
    /// one after the other, so at most one long-poll task exists.
    ///
    /// # Errors
    ///
    /// Returns an error only for configuration problems.
    pub async fn initialize(&self) -> Result<(), Error> {
        let mut long_poll = self.long_poll.lock().await;
        stop_long_polling(long_poll.take()).await;
        self.shared.set_status(ThingStatus::Initializing);

        if !self.client.is_access_possible().await {
            let Some(password) = self.config.system_password() else {
                self.shared.set_status(ThingStatus::offline(
                    StatusDetail::CommunicationError,
                    "Bridge not reachable or access denied, set the system password to pair",
                ));
                return Ok(());
            };

            if !self.client.do_pairing(password).await? {
                self.shared.set_status(ThingStatus::offline(
                    StatusDetail::CommunicationError,
                    "Pairing failed, press the button on the controller and retry",
                ));
                return Ok(());
            }

            if !self.client.is_access_possible().await {
                self.shared.set_status(ThingStatus::offline(
                    StatusDetail::CommunicationError,
                    "Access denied after pairing",
                ));
                return Ok(());
            }
        }

        match self.get_devices().await {
            Ok(devices) => {
                tracing::info!(
                    host = %self.client.address().host(),
                    devices = devices.len(),
                    "Connected to bridge"
                );
            }
            Err(e) => {
                self.shared.set_status(ThingStatus::offline(
                    StatusDetail::CommunicationError,
                    format!("Could not retrieve devices: {e}"),
                ));
                return Ok(());
            }
        }

        self.shared.set_status(ThingStatus::Online);
        *long_poll = Some(self.start_long_polling());
        Ok(())
    }

    /// Stops long polling and waits for the background task to finish.
    pub async fn dispose(&self) {
        let mut long_poll = self.long_poll.lock().await;
        stop_long_polling(long_poll.take()).await;
        self.shared.set_status(ThingStatus::Uninitialized);
    }

    /// Returns all devices known to the controller.
    ///
    /// # Errors
    ///
    /// Returns transport, bridge or decode errors from the request.
    pub async fn get_devices(&self) -> Result<Vec<Device>, Error> {
        let request = self
            .client
            .create_request(&self.client.smart_home_url("devices"), Method::GET);
        self.client.send_request(&request).await
    }

    /// Fetches the current state of service `S` on `device_id`.
    ///
    /// # Errors
    ///
    /// Returns transport, bridge or decode errors from the request.
    pub async fn refresh_state<S: ServiceState>(&self, device_id: &str) -> Result<S, Error> {
        let url = self.client.service_url(S::SERVICE_NAME, device_id);
        tracing::debug!(device_id, service = S::SERVICE_NAME, "Refreshing service state");

        let request = self.client.create_request(&url, Method::GET);
        self.client.send_request(&request).await
    }

    /// Writes a new state of service `S` on `device_id`.
    ///
    /// # Errors
    ///
    /// Returns transport, bridge or decode errors from the request.
    pub async fn put_state<S: ServiceState>(&self, device_id: &str, state: &S) -> Result<(), Error> {
        let url = self.client.service_url(S::SERVICE_NAME, device_id);
        tracing::debug!(device_id, service = S::SERVICE_NAME, "Writing service state");

        let request = self
            .client
            .create_request_with_body(&url, Method::PUT, state.to_payload()?);
        self.client.send_command(&request).await
    }

    /// Attaches a device handler so it receives pushed updates.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingDeviceId`] if the handler has no
    /// bridge id yet.
    pub fn child_handler_initialized(&self, handler: &Arc<dyn ThingHandler>) -> Result<(), Error> {
        let device_id = handler.bosch_id().ok_or(ConfigError::MissingDeviceId)?;
        tracing::debug!(device_id = %device_id, "Attaching device handler");

        self.shared
            .things
            .write()
            .insert(device_id, Arc::downgrade(handler));
        Ok(())
    }

    /// Detaches the device handler for `device_id`.
    ///
    /// Returns `true` if a handler was attached.
    pub fn child_handler_disposed(&self, device_id: &str) -> bool {
        tracing::debug!(device_id, "Detaching device handler");
        self.shared.things.write().remove(device_id).is_some()
    }

    fn start_long_polling(&self) -> LongPollTask {
        let token = CancellationToken::new();
        let polling = LongPolling::new(
            self.client.clone(),
            Arc::clone(&self.shared),
            &self.config,
        );
        let handle = tokio::spawn(polling.run(token.clone()));

        LongPollTask { token, handle }
    }
}

async fn stop_long_polling(task: Option<LongPollTask>) {
    if let Some(task) = task {
        task.token.cancel();
        if let Err(e) = task.handle.await {
            tracing::warn!(error = %e, "Long polling task failed");
        }
    }
}

impl fmt::Debug for BridgeHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeHandler")
            .field("address", self.client.address())
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

impl Drop for BridgeHandler {
    fn drop(&mut self) {
        if let Some(task) = self.long_poll.get_mut().take() {
            task.token.cancel();
        }
    }
}

/// State shared between the handler and its long-poll task.
pub(crate) struct BridgeShared {
    status: RwLock<ThingStatus>,
    things: RwLock<HashMap<String, Weak<dyn ThingHandler>>>,
    events: EventBus,
}

impl BridgeShared {
    fn new() -> Self {
        Self {
            status: RwLock::new(ThingStatus::Uninitialized),
            things: RwLock::new(HashMap::new()),
            events: EventBus::new(),
        }
    }

    /// Updates the status and publishes the change, if any.
    pub(crate) fn set_status(&self, status: ThingStatus) {
        {
            let mut current = self.status.write();
            if *current == status {
                return;
            }
            *current = status.clone();
        }

        if status.is_offline() {
            tracing::warn!(status = %status, "Bridge status changed");
        } else {
            tracing::info!(status = %status, "Bridge status changed");
        }
        self.events.publish(BridgeEvent::status_changed(status));
    }

    pub(crate) fn subscription_established(&self, subscription_id: &str) {
        tracing::info!(subscription_id, "Long polling subscription established");
        self.events
            .publish(BridgeEvent::subscription_established(subscription_id));
    }

    /// Delivers one pushed service state to the attached device handler.
    ///
    /// Returns `false` if the entry carries no state or no handler is
    /// attached for its device.
    pub(crate) fn route_update(&self, data: &DeviceServiceData) -> bool {
        let Some(state) = data.state.as_ref() else {
            tracing::debug!(
                device_id = %data.device_id,
                service = %data.id,
                kind = %data.kind,
                "Ignoring update without state"
            );
            return false;
        };

        let handler = self
            .things
            .read()
            .get(&data.device_id)
            .and_then(Weak::upgrade);

        let Some(handler) = handler else {
            tracing::debug!(
                device_id = %data.device_id,
                service = %data.id,
                "No device handler attached"
            );
            return false;
        };

        tracing::trace!(device_id = %data.device_id, service = %data.id, "Routing update");
        handler.process_update(&data.id, state);
        self.events
            .publish(BridgeEvent::service_updated(data.device_id.as_str(), data.id.as_str()));
        true
    }
}

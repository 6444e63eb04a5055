// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shared behaviour of all device handlers.

use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

use parking_lot::RwLock;
use serde_json::Value;

use super::{DeviceConfig, HostAdapter};
use crate::bridge::BridgeHandler;
use crate::error::{ConfigError, Error};
use crate::services::{DeviceService, ServiceHandle, ServiceState};
use crate::types::{ChannelState, ChannelUid, Command, StatusDetail, ThingStatus};

/// Base of every device handler.
///
/// Holds the host adapter, the loaded configuration and the service
/// registry. The registry is filled once by [`initialize`](Self::initialize)
/// and read-only afterwards, so dispatch needs no locking.
pub struct DeviceHandler {
    host: Arc<dyn HostAdapter>,
    config: RwLock<Option<DeviceConfig>>,
    status: RwLock<ThingStatus>,
    services: OnceLock<Vec<ServiceRegistration>>,
}

struct ServiceRegistration {
    service: Arc<dyn ServiceHandle>,
    affected_channels: Vec<String>,
}

impl ServiceRegistration {
    fn affects(&self, channel_id: &str) -> bool {
        self.affected_channels.iter().any(|c| c == channel_id)
    }
}

impl DeviceHandler {
    /// Creates an uninitialized handler.
    #[must_use]
    pub fn new(host: Arc<dyn HostAdapter>) -> Self {
        Self {
            host,
            config: RwLock::new(None),
            status: RwLock::new(ThingStatus::Uninitialized),
            services: OnceLock::new(),
        }
    }

    /// Returns the host adapter.
    #[must_use]
    pub fn host(&self) -> &Arc<dyn HostAdapter> {
        &self.host
    }

    /// Returns the bridge id once the configuration is loaded.
    #[must_use]
    pub fn bosch_id(&self) -> Option<String> {
        self.config.read().as_ref().map(|c| c.id.clone())
    }

    /// Returns the handler of the owning bridge, if the host has one.
    #[must_use]
    pub fn bridge_handler(&self) -> Option<Arc<BridgeHandler>> {
        self.host.bridge()
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> ThingStatus {
        self.status.read().clone()
    }

    /// Returns the number of registered services.
    #[must_use]
    pub fn service_count(&self) -> usize {
        self.registrations().len()
    }

    /// Loads the configuration, lets `register` add the device services and
    /// goes ONLINE.
    ///
    /// The registry is closed afterwards.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::RegistrationClosed`] if the handler was already initialized
    /// - [`ConfigError::MissingDeviceId`] if the configuration has no id
    /// - [`ConfigError::MissingBridge`] if the host has no bridge
    /// - any error returned by `register`
    ///
    /// All but the first also move the device OFFLINE.
    pub fn initialize<F>(&self, register: F) -> Result<(), Error>
    where
        F: FnOnce(&mut ServiceRegistrar<'_>) -> Result<(), Error>,
    {
        if self.services.get().is_some() {
            let device_id = self.bosch_id().unwrap_or_default();
            return Err(ConfigError::RegistrationClosed(device_id).into());
        }

        self.update_status(ThingStatus::Initializing);

        let result = self.register_services(register);
        match &result {
            Ok(()) => self.update_status(ThingStatus::Online),
            Err(e) => {
                tracing::warn!(error = %e, "Device initialization failed");
                self.update_status(ThingStatus::offline(
                    StatusDetail::ConfigurationError,
                    e.to_string(),
                ));
            }
        }
        result
    }

    fn register_services<F>(&self, register: F) -> Result<(), Error>
    where
        F: FnOnce(&mut ServiceRegistrar<'_>) -> Result<(), Error>,
    {
        let config = self.host.device_config()?;
        if config.id.trim().is_empty() {
            return Err(ConfigError::MissingDeviceId.into());
        }
        if self.host.bridge().is_none() {
            return Err(ConfigError::MissingBridge(config.id).into());
        }

        let mut registrar = ServiceRegistrar {
            host: &self.host,
            device_id: &config.id,
            registrations: Vec::new(),
        };
        register(&mut registrar)?;
        let registrations = registrar.registrations;

        tracing::debug!(
            device_id = %config.id,
            services = registrations.len(),
            "Registered device services"
        );
        if self.services.set(registrations).is_err() {
            return Err(ConfigError::RegistrationClosed(config.id).into());
        }

        *self.config.write() = Some(config);
        Ok(())
    }

    /// Returns `true` if bridge and configuration are available.
    ///
    /// Otherwise moves the device OFFLINE and returns `false`.
    pub fn is_ready(&self) -> bool {
        if self.host.bridge().is_some() && self.config.read().is_some() {
            return true;
        }

        self.update_status(ThingStatus::offline(
            StatusDetail::CommunicationError,
            "Bridge or config is missing",
        ));
        false
    }

    /// Handles the commands every device supports.
    ///
    /// Only [`Command::Refresh`] is handled here; device specific commands
    /// are left to the concrete handler.
    pub async fn handle_command(&self, channel: &ChannelUid, command: Command) {
        if !self.is_ready() {
            return;
        }

        match command {
            Command::Refresh => self.handle_refresh_command(channel).await,
            Command::OnOff(_) => {
                tracing::debug!(channel = %channel, ?command, "Command not supported by device");
            }
        }
    }

    /// Refreshes every service whose affected channels contain `channel`.
    ///
    /// The channel group is ignored. Failures are logged.
    pub async fn handle_refresh_command(&self, channel: &ChannelUid) {
        let channel_id = channel.id_without_group();

        for registration in self.registrations().iter().filter(|r| r.affects(channel_id)) {
            if let Err(e) = registration.service.refresh().await {
                tracing::warn!(
                    channel = %channel,
                    service = registration.service.service_name(),
                    error = %e,
                    "Refreshing service state failed"
                );
            }
        }
    }

    /// Delivers a pushed state to every service named `service_name`.
    pub fn process_update(&self, service_name: &str, state: &Value) {
        let mut delivered = false;
        for registration in self
            .registrations()
            .iter()
            .filter(|r| r.service.service_name() == service_name)
        {
            registration.service.on_state_update(state);
            delivered = true;
        }

        if !delivered {
            tracing::trace!(service = service_name, "No service registered for update");
        }
    }

    fn registrations(&self) -> &[ServiceRegistration] {
        self.services.get().map_or(&[], Vec::as_slice)
    }

    fn update_status(&self, status: ThingStatus) {
        {
            let mut current = self.status.write();
            if *current == status {
                return;
            }
            *current = status.clone();
        }
        self.host.update_status(status);
    }
}

impl fmt::Debug for DeviceHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceHandler")
            .field("id", &self.bosch_id())
            .field("status", &self.status())
            .field("services", &self.service_count())
            .finish_non_exhaustive()
    }
}

/// Collects the services of a device during initialization.
pub struct ServiceRegistrar<'a> {
    host: &'a Arc<dyn HostAdapter>,
    device_id: &'a str,
    registrations: Vec<ServiceRegistration>,
}

impl ServiceRegistrar<'_> {
    /// Returns the bridge id of the device being initialized.
    #[must_use]
    pub fn device_id(&self) -> &str {
        self.device_id
    }

    /// Returns a weak handle to the host adapter, for use in state listeners.
    ///
    /// Listeners live as long as the handler; a strong handle would keep a
    /// host that owns the handler alive forever.
    #[must_use]
    pub fn host(&self) -> Weak<dyn HostAdapter> {
        Arc::downgrade(self.host)
    }

    /// Returns a callback publishing values of `channel_id` to the host.
    ///
    /// Does nothing once the host is gone.
    #[must_use]
    pub fn channel_updater(
        &self,
        channel_id: &'static str,
    ) -> impl Fn(ChannelState) + Send + Sync + use<> {
        let host = self.host();
        move |state| {
            if let Some(host) = host.upgrade() {
                host.update_state(channel_id, state);
            }
        }
    }

    /// Registers `service` for the given channels.
    ///
    /// Registrations are not deduplicated; a service registered twice is
    /// refreshed and updated twice.
    pub fn register_service(&mut self, service: Arc<dyn ServiceHandle>, affected_channels: &[&str]) {
        tracing::trace!(
            device_id = self.device_id,
            service = service.service_name(),
            channels = ?affected_channels,
            "Registering service"
        );
        self.registrations.push(ServiceRegistration {
            service,
            affected_channels: affected_channels.iter().map(ToString::to_string).collect(),
        });
    }

    /// Creates the service of type `S` for this device and registers it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingBridge`] if the host has no bridge.
    pub fn create_service<S, F>(
        &mut self,
        listener: F,
        affected_channels: &[&str],
    ) -> Result<Arc<DeviceService<S>>, Error>
    where
        S: ServiceState,
        F: Fn(S) + Send + Sync + 'static,
    {
        let bridge = self
            .host
            .bridge()
            .ok_or_else(|| ConfigError::MissingBridge(self.device_id.to_string()))?;

        let service = Arc::new(DeviceService::new(self.device_id, bridge, Arc::new(listener)));
        let handle: Arc<dyn ServiceHandle> = service.clone();
        self.register_service(handle, affected_channels);
        Ok(service)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;

    use super::*;
    use crate::device::test_support::TestHost;
    use crate::services::{PowerSwitchState, ShutterContactState};
    use crate::types::OnOff;

    const DEVICE_ID: &str = "hdm:HomeMaticIP:3014F711A0001916D859A8A9";

    #[derive(Default)]
    struct CountingService {
        name: &'static str,
        refreshes: AtomicUsize,
        updates: Mutex<Vec<Value>>,
    }

    impl CountingService {
        fn named(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                ..Self::default()
            })
        }

        fn refreshes(&self) -> usize {
            self.refreshes.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ServiceHandle for CountingService {
        fn service_name(&self) -> &str {
            self.name
        }

        async fn refresh(&self) -> Result<(), Error> {
            self.refreshes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn on_state_update(&self, state: &Value) {
            self.updates.lock().push(state.clone());
        }
    }

    fn channel(id: &str) -> ChannelUid {
        format!("boschshc:device:shc1:thing1:{id}").parse().unwrap()
    }

    #[tokio::test]
    async fn refresh_triggers_each_overlapping_service_once() {
        let handler = DeviceHandler::new(TestHost::new(DEVICE_ID));
        let wide = CountingService::named("Wide");
        let narrow = CountingService::named("Narrow");

        let (w, n) = (wide.clone(), narrow.clone());
        handler
            .initialize(move |services| {
                services.register_service(w, &["power-switch", "power-consumption"]);
                services.register_service(n, &["power-consumption"]);
                Ok(())
            })
            .unwrap();

        handler
            .handle_command(&channel("meter#power-consumption"), Command::Refresh)
            .await;
        assert_eq!(wide.refreshes(), 1);
        assert_eq!(narrow.refreshes(), 1);

        handler
            .handle_command(&channel("power-switch"), Command::Refresh)
            .await;
        assert_eq!(wide.refreshes(), 2);
        assert_eq!(narrow.refreshes(), 1);
    }

    #[test]
    fn duplicate_registrations_all_receive_updates() {
        let handler = DeviceHandler::new(TestHost::new(DEVICE_ID));
        let service = CountingService::named("ShutterContact");

        let s = service.clone();
        handler
            .initialize(move |services| {
                services.register_service(s.clone(), &["contact"]);
                services.register_service(s, &["contact"]);
                Ok(())
            })
            .unwrap();

        handler.process_update("ShutterContact", &json!({"value": "OPEN"}));
        handler.process_update("PowerSwitch", &json!({"switchState": "ON"}));

        assert_eq!(service.updates.lock().len(), 2);
    }

    #[test]
    fn decode_failure_does_not_block_other_services() {
        let host = TestHost::new(DEVICE_ID);
        let handler = DeviceHandler::new(host.clone());
        let switched = Arc::new(Mutex::new(Vec::new()));
        let contacts = Arc::new(Mutex::new(Vec::new()));

        let (sw, co) = (switched.clone(), contacts.clone());
        handler
            .initialize(move |services| {
                services.create_service(
                    move |state: ShutterContactState| co.lock().push(state.value),
                    &["contact"],
                )?;
                services.create_service(
                    move |state: PowerSwitchState| sw.lock().push(state.switch_state),
                    &["power-switch"],
                )?;
                Ok(())
            })
            .unwrap();

        handler.process_update("ShutterContact", &json!({"value": "SIDEWAYS"}));
        handler.process_update("PowerSwitch", &json!({"switchState": "ON"}));

        assert!(contacts.lock().is_empty());
        assert_eq!(*switched.lock(), vec![OnOff::On]);
        assert_eq!(handler.status(), ThingStatus::Online);
    }

    #[test]
    fn initialize_goes_online() {
        let host = TestHost::new(DEVICE_ID);
        let handler = DeviceHandler::new(host.clone());

        handler.initialize(|_| Ok(())).unwrap();

        assert_eq!(handler.bosch_id().as_deref(), Some(DEVICE_ID));
        assert_eq!(
            *host.statuses.lock(),
            vec![ThingStatus::Initializing, ThingStatus::Online]
        );
    }

    #[test]
    fn initialize_without_bridge_is_a_configuration_error() {
        let host = TestHost::without_bridge(DEVICE_ID);
        let handler = DeviceHandler::new(host.clone());

        let err = handler.initialize(|_| Ok(())).unwrap_err();

        assert!(matches!(err, Error::Config(ConfigError::MissingBridge(_))));
        assert!(matches!(
            host.last_status(),
            Some(ThingStatus::Offline {
                detail: StatusDetail::ConfigurationError,
                ..
            })
        ));
        assert_eq!(handler.bosch_id(), None);
    }

    #[test]
    fn initialize_without_device_id_fails() {
        let handler = DeviceHandler::new(TestHost::new("  "));
        let err = handler.initialize(|_| Ok(())).unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::MissingDeviceId)));
    }

    #[test]
    fn registry_is_closed_after_initialization() {
        let handler = DeviceHandler::new(TestHost::new(DEVICE_ID));
        handler.initialize(|_| Ok(())).unwrap();

        let err = handler
            .initialize(|services| {
                services.register_service(CountingService::named("Late"), &["contact"]);
                Ok(())
            })
            .unwrap_err();

        assert!(matches!(err, Error::Config(ConfigError::RegistrationClosed(_))));
        assert_eq!(handler.service_count(), 0);
        assert_eq!(handler.status(), ThingStatus::Online);
    }

    #[tokio::test]
    async fn command_without_config_goes_offline() {
        let host = TestHost::without_config();
        let handler = DeviceHandler::new(host.clone());

        handler.handle_command(&channel("contact"), Command::Refresh).await;

        assert_eq!(
            host.last_status(),
            Some(ThingStatus::offline(
                StatusDetail::CommunicationError,
                "Bridge or config is missing"
            ))
        );
    }

    #[tokio::test]
    async fn command_after_bridge_removal_goes_offline() {
        let host = TestHost::new(DEVICE_ID);
        let handler = DeviceHandler::new(host.clone());
        let service = CountingService::named("ShutterContact");

        let s = service.clone();
        handler
            .initialize(move |services| {
                services.register_service(s, &["contact"]);
                Ok(())
            })
            .unwrap();

        host.remove_bridge();
        handler.handle_command(&channel("contact"), Command::Refresh).await;

        assert_eq!(service.refreshes(), 0);
        assert!(handler.status().is_offline());
    }

    #[tokio::test]
    async fn failed_refresh_is_logged_not_raised() {
        let host = TestHost::new(DEVICE_ID);
        let handler = DeviceHandler::new(host.clone());
        handler
            .initialize(|services| {
                services.create_service(|_: ShutterContactState| {}, &["contact"])?;
                Ok(())
            })
            .unwrap();

        // The test bridge points at a closed port.
        handler.handle_command(&channel("contact"), Command::Refresh).await;

        assert!(host.states().is_empty());
        assert_eq!(handler.status(), ThingStatus::Online);
    }
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device services and their typed states.
//!
//! A device service is a named sub-resource of a device on the bridge, such
//! as `ShutterContact` or `PowerSwitch`. Each has its own state shape,
//! described by a type implementing [`ServiceState`].
//!
//! [`DeviceService`] binds a state type to one device and a listener. Device
//! handlers keep their services behind the object-safe [`ServiceHandle`]
//! trait so services with different state types can share one registry.

mod power_switch;
mod shutter_contact;
mod temperature_level;

pub use power_switch::PowerSwitchState;
pub use shutter_contact::ShutterContactState;
pub use temperature_level::TemperatureLevelState;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::bridge::BridgeHandler;
use crate::error::Error;

/// Decoded state of one device service type.
///
/// # Examples
///
/// ```
/// use boschshc::services::{ServiceState, ShutterContactState};
/// use boschshc::types::OpenClosed;
///
/// let state = ShutterContactState::new(OpenClosed::Open);
/// let payload = state.to_payload().unwrap();
/// assert_eq!(payload["@type"], "shutterContactState");
/// assert_eq!(payload["value"], "OPEN");
/// ```
pub trait ServiceState: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Name of the service on the bridge, e.g. `ShutterContact`.
    const SERVICE_NAME: &'static str;

    /// Entity type written as `@type`, e.g. `shutterContactState`.
    const STATE_TYPE: &'static str;

    /// Serializes the state as sent to the bridge, including its `@type`.
    ///
    /// # Errors
    ///
    /// Returns a decode error if the state cannot be represented as JSON.
    fn to_payload(&self) -> Result<Value, Error> {
        let mut payload = serde_json::to_value(self)?;
        if let Value::Object(map) = &mut payload {
            map.insert("@type".to_string(), Value::from(Self::STATE_TYPE));
        }
        Ok(payload)
    }

    /// Decodes a state payload received from the bridge.
    ///
    /// # Errors
    ///
    /// Returns a decode error for malformed JSON or unexpected values.
    fn from_payload(payload: &Value) -> Result<Self, Error> {
        Self::deserialize(payload).map_err(Into::into)
    }
}

/// Callback invoked with each freshly decoded state.
pub type StateListener<S> = Arc<dyn Fn(S) + Send + Sync>;

/// Type-erased view of a [`DeviceService`].
#[async_trait]
pub trait ServiceHandle: Send + Sync {
    /// Name of the service on the bridge.
    fn service_name(&self) -> &str;

    /// Requests the current state from the bridge and notifies the listener.
    ///
    /// # Errors
    ///
    /// Returns an error if the state could not be fetched or decoded.
    async fn refresh(&self) -> Result<(), Error>;

    /// Decodes a pushed state and notifies the listener.
    ///
    /// Decode failures are logged and dropped.
    fn on_state_update(&self, state: &Value);
}

/// One service of one device, bound to a listener.
pub struct DeviceService<S: ServiceState> {
    device_id: String,
    bridge: Arc<BridgeHandler>,
    listener: StateListener<S>,
}

impl<S: ServiceState> DeviceService<S> {
    /// Binds the service of type `S` on `device_id` to `listener`.
    #[must_use]
    pub fn new(
        device_id: impl Into<String>,
        bridge: Arc<BridgeHandler>,
        listener: StateListener<S>,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            bridge,
            listener,
        }
    }

    /// Returns the bridge id of the device.
    #[must_use]
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Fetches the current state and passes it to the listener.
    ///
    /// # Errors
    ///
    /// Returns transport, bridge or decode errors from the request.
    pub async fn refresh_state(&self) -> Result<(), Error> {
        let state = self.bridge.refresh_state::<S>(&self.device_id).await?;
        (self.listener)(state);
        Ok(())
    }

    /// Decodes a pushed state and passes it to the listener.
    ///
    /// Malformed payloads are logged and dropped, so one bad update never
    /// affects later ones.
    pub fn on_state_update(&self, state: &Value) {
        match S::from_payload(state) {
            Ok(state) => (self.listener)(state),
            Err(e) => {
                tracing::warn!(
                    device_id = %self.device_id,
                    service = S::SERVICE_NAME,
                    error = %e,
                    payload = %state,
                    "Dropping undecodable service state"
                );
            }
        }
    }

    /// Writes a new state to the bridge.
    ///
    /// # Errors
    ///
    /// Returns transport, bridge or decode errors from the request.
    pub async fn set_state(&self, state: &S) -> Result<(), Error> {
        self.bridge.put_state(&self.device_id, state).await
    }
}

impl<S: ServiceState> fmt::Debug for DeviceService<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceService")
            .field("service", &S::SERVICE_NAME)
            .field("device_id", &self.device_id)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<S: ServiceState> ServiceHandle for DeviceService<S> {
    fn service_name(&self) -> &str {
        S::SERVICE_NAME
    }

    async fn refresh(&self) -> Result<(), Error> {
        self.refresh_state().await
    }

    fn on_state_update(&self, state: &Value) {
        DeviceService::on_state_update(self, state);
    }
}

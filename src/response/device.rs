// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device entity from `/smarthome/devices`.

use serde::{Deserialize, Serialize};

/// A device known to the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    /// Bridge-assigned identifier, e.g. `hdm:HomeMaticIP:3014F711A0001916D859A8A9`.
    pub id: String,
    /// User-visible name.
    #[serde(default)]
    pub name: String,
    /// Room the device is assigned to.
    #[serde(default)]
    pub room_id: Option<String>,
    /// Manufacturer, usually `BOSCH`.
    #[serde(default)]
    pub manufacturer: Option<String>,
    /// Model identifier, e.g. `SWD` for a window contact.
    #[serde(default)]
    pub device_model: Option<String>,
    /// Serial number.
    #[serde(default)]
    pub serial: Option<String>,
    /// Availability as reported by the bridge, e.g. `AVAILABLE`.
    #[serde(default)]
    pub status: Option<String>,
    /// Names of the services this device offers.
    #[serde(default)]
    pub device_service_ids: Vec<String>,
}

impl Device {
    /// Returns true if the device offers the named service.
    #[must_use]
    pub fn has_service(&self, service_name: &str) -> bool {
        self.device_service_ids.iter().any(|s| s == service_name)
    }
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use serde::{Deserialize, Serialize};

use super::ServiceState;
use crate::types::OnOff;

/// State of the `PowerSwitch` service of in-wall switches and smart plugs.
///
/// ```json
/// {"@type": "powerSwitchState", "switchState": "ON", "automaticPowerOffTime": 0}
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerSwitchState {
    /// Current switch position.
    pub switch_state: OnOff,
    /// Seconds after which the device switches itself off, 0 if disabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub automatic_power_off_time: Option<u32>,
}

impl PowerSwitchState {
    /// Creates a state that only sets the switch position.
    #[must_use]
    pub fn new(switch_state: OnOff) -> Self {
        Self {
            switch_state,
            automatic_power_off_time: None,
        }
    }
}

impl ServiceState for PowerSwitchState {
    const SERVICE_NAME: &'static str = "PowerSwitch";
    const STATE_TYPE: &'static str = "powerSwitchState";
}

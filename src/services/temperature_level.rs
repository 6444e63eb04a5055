// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use serde::{Deserialize, Serialize};

use super::ServiceState;

/// State of the `TemperatureLevel` service of thermostats and climate sensors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureLevelState {
    /// Measured temperature in degrees Celsius.
    pub temperature: f64,
}

impl ServiceState for TemperatureLevelState {
    const SERVICE_NAME: &'static str = "TemperatureLevel";
    const STATE_TYPE: &'static str = "temperatureLevelState";
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decode_bridge_payload() {
        let state = TemperatureLevelState::from_payload(&json!({
            "@type": "temperatureLevelState",
            "temperature": 21.5
        }))
        .unwrap();
        assert!((state.temperature - 21.5).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_temperature_is_a_decode_error() {
        assert!(TemperatureLevelState::from_payload(&json!({})).is_err());
    }
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Two-valued channel states: on/off and open/closed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// On/off state of a switch.
///
/// Serialized the way the bridge writes it (`"ON"` / `"OFF"`).
///
/// # Examples
///
/// ```
/// use boschshc::types::OnOff;
///
/// assert_eq!("on".parse::<OnOff>().unwrap(), OnOff::On);
/// assert_eq!(OnOff::from(false), OnOff::Off);
/// assert_eq!(OnOff::On.as_str(), "ON");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OnOff {
    /// Switched on.
    On,
    /// Switched off.
    Off,
}

impl OnOff {
    /// Returns the string representation used by the bridge.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::On => "ON",
            Self::Off => "OFF",
        }
    }
}

impl fmt::Display for OnOff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OnOff {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ON" | "1" | "TRUE" => Ok(Self::On),
            "OFF" | "0" | "FALSE" => Ok(Self::Off),
            _ => Err(ValueError::InvalidOnOff(s.to_string())),
        }
    }
}

impl From<bool> for OnOff {
    fn from(value: bool) -> Self {
        if value { Self::On } else { Self::Off }
    }
}

/// Open/closed state of a contact.
///
/// # Examples
///
/// ```
/// use boschshc::types::OpenClosed;
///
/// assert_eq!("CLOSED".parse::<OpenClosed>().unwrap(), OpenClosed::Closed);
/// assert!("AJAR".parse::<OpenClosed>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OpenClosed {
    /// Contact open.
    Open,
    /// Contact closed.
    Closed,
}

impl OpenClosed {
    /// Returns the string representation used by the bridge.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Closed => "CLOSED",
        }
    }
}

impl fmt::Display for OpenClosed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OpenClosed {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "OPEN" => Ok(Self::Open),
            "CLOSED" => Ok(Self::Closed),
            _ => Err(ValueError::InvalidOpenClosed(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn on_off_parsing() {
        assert_eq!("ON".parse::<OnOff>().unwrap(), OnOff::On);
        assert_eq!("off".parse::<OnOff>().unwrap(), OnOff::Off);
        assert_eq!("1".parse::<OnOff>().unwrap(), OnOff::On);
        assert_eq!("false".parse::<OnOff>().unwrap(), OnOff::Off);
        assert!("toggle".parse::<OnOff>().is_err());
    }

    #[test]
    fn on_off_serde_matches_bridge() {
        assert_eq!(serde_json::to_string(&OnOff::On).unwrap(), r#""ON""#);
        assert_eq!(
            serde_json::from_str::<OnOff>(r#""OFF""#).unwrap(),
            OnOff::Off
        );
    }

    #[test]
    fn open_closed_serde_matches_bridge() {
        assert_eq!(
            serde_json::from_str::<OpenClosed>(r#""OPEN""#).unwrap(),
            OpenClosed::Open
        );
        assert!(serde_json::from_str::<OpenClosed>(r#""TILTED""#).is_err());
    }

    #[test]
    fn display() {
        assert_eq!(OnOff::Off.to_string(), "OFF");
        assert_eq!(OpenClosed::Closed.to_string(), "CLOSED");
    }
}

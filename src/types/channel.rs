// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Channels, channel states and commands exchanged with the host.

use std::fmt;
use std::str::FromStr;

use crate::error::ValueError;

use super::{OnOff, OpenClosed};

/// Id of the window/door contact channel.
pub const CHANNEL_CONTACT: &str = "contact";

/// Id of the switch channel of in-wall switches and smart plugs.
pub const CHANNEL_POWER_SWITCH: &str = "power-switch";

/// Id of the measured temperature channel.
pub const CHANNEL_TEMPERATURE: &str = "temperature";

/// Unique id of a channel: `binding:type:bridge:thing:[group#]channel`.
///
/// # Examples
///
/// ```
/// use boschshc::types::ChannelUid;
///
/// let uid: ChannelUid = "boschshc:thermostat:shc1:bathroom:climate#temperature".parse().unwrap();
/// assert_eq!(uid.thing_uid(), "boschshc:thermostat:shc1:bathroom");
/// assert_eq!(uid.group(), Some("climate"));
/// assert_eq!(uid.id_without_group(), "temperature");
/// assert_eq!(uid.id(), "climate#temperature");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelUid {
    thing_uid: String,
    group: Option<String>,
    id: String,
}

impl ChannelUid {
    /// Creates a channel UID below the given thing.
    #[must_use]
    pub fn new(thing_uid: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            thing_uid: thing_uid.into(),
            group: None,
            id: id.into(),
        }
    }

    /// Places the channel in a channel group.
    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Returns the UID of the owning thing.
    #[must_use]
    pub fn thing_uid(&self) -> &str {
        &self.thing_uid
    }

    /// Returns the channel group, if any.
    #[must_use]
    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    /// Returns the channel id including its group prefix.
    #[must_use]
    pub fn id(&self) -> String {
        match &self.group {
            Some(group) => format!("{group}#{}", self.id),
            None => self.id.clone(),
        }
    }

    /// Returns the channel id without its group prefix.
    #[must_use]
    pub fn id_without_group(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for ChannelUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.thing_uid, self.id())
    }
}

impl FromStr for ChannelUid {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValueError::InvalidChannelUid(s.to_string());

        let (thing_uid, channel) = s.rsplit_once(':').ok_or_else(invalid)?;
        if thing_uid.split(':').count() < 3 || channel.is_empty() {
            return Err(invalid());
        }

        let uid = match channel.split_once('#') {
            Some((group, id)) if !group.is_empty() && !id.is_empty() => {
                Self::new(thing_uid, id).with_group(group)
            }
            Some(_) => return Err(invalid()),
            None => Self::new(thing_uid, channel),
        };
        Ok(uid)
    }
}

/// State published to a host channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChannelState {
    /// Open/closed contact.
    OpenClosed(OpenClosed),
    /// On/off switch.
    OnOff(OnOff),
    /// Temperature in degrees Celsius.
    Temperature(f64),
    /// No known value.
    Undefined,
}

/// Command sent by the host to a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Re-read the current value from the bridge.
    Refresh,
    /// Switch on or off.
    OnOff(OnOff),
}

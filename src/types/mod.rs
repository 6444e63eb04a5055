// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Values exchanged with the host framework.
//!
//! - [`ChannelUid`] - Channel address, optionally inside a channel group
//! - [`ChannelState`] - Value published to a channel
//! - [`Command`] - Command received from the host
//! - [`ThingStatus`] - ONLINE/OFFLINE lifecycle status
//! - [`OnOff`], [`OpenClosed`] - Two-valued states as written by the bridge

mod channel;
mod power;
mod status;

pub use channel::{
    CHANNEL_CONTACT, CHANNEL_POWER_SWITCH, CHANNEL_TEMPERATURE, ChannelState, ChannelUid, Command,
};
pub use power::{OnOff, OpenClosed};
pub use status::{StatusDetail, ThingStatus};

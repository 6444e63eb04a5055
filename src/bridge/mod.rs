// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bridge handling: configuration, lifecycle and long polling.
//!
//! A [`BridgeHandler`] represents one controller. Its lifecycle is
//!
//! ```text
//! UNINITIALIZED ─► INITIALIZING ─► access check ─► (pairing) ─► devices ─► ONLINE
//!                                        │              │           │
//!                                        └──────────────┴───────────┴──► OFFLINE
//! ```
//!
//! While ONLINE a background task holds a long-poll subscription and routes
//! every pushed service state to the device handler attached for that
//! device. Failures of the subscription move the bridge OFFLINE and are
//! retried according to the [`ReconnectionPolicy`].

mod config;
mod handler;
mod long_poll;

pub use config::{BridgeConfig, ReconnectionPolicy};
pub use handler::BridgeHandler;

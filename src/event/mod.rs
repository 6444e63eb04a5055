// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Events published by a bridge handler.
//!
//! Hosts that want more than the status callbacks of their adapter can
//! subscribe to a bridge's [`EventBus`] and observe status changes, new
//! long-poll subscriptions and delivered service updates.
//!
//! # Examples
//!
//! ```
//! use boschshc::event::{BridgeEvent, EventBus};
//!
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe();
//!
//! bus.publish(BridgeEvent::service_updated("hdm:ZigBee:1", "PowerSwitch"));
//! assert!(rx.try_recv().unwrap().is_service_update());
//! ```

mod bridge_event;
mod event_bus;

pub use bridge_event::BridgeEvent;
pub use event_bus::EventBus;

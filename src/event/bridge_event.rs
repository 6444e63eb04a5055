// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bridge event types.

use chrono::{DateTime, Utc};

use crate::types::ThingStatus;

/// Events emitted by a bridge handler.
///
/// # Examples
///
/// ```
/// use boschshc::event::BridgeEvent;
/// use boschshc::types::ThingStatus;
///
/// let event = BridgeEvent::status_changed(ThingStatus::Online);
/// assert!(event.is_status());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeEvent {
    /// The bridge status changed.
    StatusChanged {
        /// The new status.
        status: ThingStatus,
        /// When the change happened.
        timestamp: DateTime<Utc>,
    },

    /// A long-poll subscription was opened.
    SubscriptionEstablished {
        /// Id assigned by the bridge.
        subscription_id: String,
        /// When the subscription was opened.
        timestamp: DateTime<Utc>,
    },

    /// A pushed service state was delivered to a device handler.
    ServiceUpdated {
        /// Bridge id of the device.
        device_id: String,
        /// Name of the updated service.
        service_name: String,
        /// When the update was delivered.
        timestamp: DateTime<Utc>,
    },
}

impl BridgeEvent {
    /// Creates a status changed event.
    #[must_use]
    pub fn status_changed(status: ThingStatus) -> Self {
        Self::StatusChanged {
            status,
            timestamp: Utc::now(),
        }
    }

    /// Creates a subscription established event.
    #[must_use]
    pub fn subscription_established(subscription_id: impl Into<String>) -> Self {
        Self::SubscriptionEstablished {
            subscription_id: subscription_id.into(),
            timestamp: Utc::now(),
        }
    }

    /// Creates a service updated event.
    #[must_use]
    pub fn service_updated(device_id: impl Into<String>, service_name: impl Into<String>) -> Self {
        Self::ServiceUpdated {
            device_id: device_id.into(),
            service_name: service_name.into(),
            timestamp: Utc::now(),
        }
    }

    /// Returns when the event happened.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::StatusChanged { timestamp, .. }
            | Self::SubscriptionEstablished { timestamp, .. }
            | Self::ServiceUpdated { timestamp, .. } => *timestamp,
        }
    }

    /// Returns `true` if this is a status change.
    #[must_use]
    pub fn is_status(&self) -> bool {
        matches!(self, Self::StatusChanged { .. })
    }

    /// Returns `true` if this is a service update.
    #[must_use]
    pub fn is_service_update(&self) -> bool {
        matches!(self, Self::ServiceUpdated { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StatusDetail;

    #[test]
    fn event_kinds() {
        assert!(BridgeEvent::status_changed(ThingStatus::Online).is_status());
        assert!(!BridgeEvent::subscription_established("sub-1").is_status());

        let update = BridgeEvent::service_updated("hdm:ZigBee:1", "PowerSwitch");
        assert!(update.is_service_update());
        assert!(!update.is_status());
    }

    #[test]
    fn timestamps_are_taken_at_creation() {
        let before = Utc::now();
        let event = BridgeEvent::status_changed(ThingStatus::offline(
            StatusDetail::CommunicationError,
            "timeout",
        ));
        assert!(event.timestamp() >= before);
        assert!(event.timestamp() <= Utc::now());
    }
}

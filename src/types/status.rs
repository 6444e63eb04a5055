// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Lifecycle status of bridges and devices as shown by the host.

use std::fmt;

/// Reason attached to an OFFLINE status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusDetail {
    /// No further detail.
    None,
    /// Configuration is missing or invalid; retrying will not help.
    ConfigurationError,
    /// The bridge could not be reached or refused the client.
    CommunicationError,
    /// The bridge this device belongs to is offline.
    BridgeOffline,
}

/// Status of a bridge or device handler.
///
/// Handlers move `Uninitialized -> Initializing -> Online | Offline`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThingStatus {
    /// Created but not yet initialized.
    Uninitialized,
    /// Initialization in progress.
    Initializing,
    /// Operational.
    Online,
    /// Not operational.
    Offline {
        /// Category of the problem.
        detail: StatusDetail,
        /// Human-readable description.
        description: Option<String>,
    },
}

impl ThingStatus {
    /// Creates an OFFLINE status with a description.
    #[must_use]
    pub fn offline(detail: StatusDetail, description: impl Into<String>) -> Self {
        Self::Offline {
            detail,
            description: Some(description.into()),
        }
    }

    /// Returns true if the status is ONLINE.
    #[must_use]
    pub fn is_online(&self) -> bool {
        matches!(self, Self::Online)
    }

    /// Returns true if the status is OFFLINE.
    #[must_use]
    pub fn is_offline(&self) -> bool {
        matches!(self, Self::Offline { .. })
    }
}

impl fmt::Display for ThingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => f.write_str("UNINITIALIZED"),
            Self::Initializing => f.write_str("INITIALIZING"),
            Self::Online => f.write_str("ONLINE"),
            Self::Offline {
                detail,
                description: Some(description),
            } => write!(f, "OFFLINE ({detail:?}): {description}"),
            Self::Offline { detail, .. } => write!(f, "OFFLINE ({detail:?})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offline_constructor() {
        let status = ThingStatus::offline(StatusDetail::CommunicationError, "Bridge or config is missing");
        assert!(status.is_offline());
        assert!(!status.is_online());
        assert_eq!(
            status.to_string(),
            "OFFLINE (CommunicationError): Bridge or config is missing"
        );
    }

    #[test]
    fn online_display() {
        assert_eq!(ThingStatus::Online.to_string(), "ONLINE");
        assert!(ThingStatus::Online.is_online());
    }
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use serde::{Deserialize, Serialize};

use super::ServiceState;
use crate::types::OpenClosed;

/// State of the `ShutterContact` service of window and door contacts.
///
/// ```json
/// {"@type": "shutterContactState", "value": "CLOSED"}
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShutterContactState {
    /// Whether the contact is open.
    pub value: OpenClosed,
}

impl ShutterContactState {
    /// Creates a state with the given contact value.
    #[must_use]
    pub fn new(value: OpenClosed) -> Self {
        Self { value }
    }
}

impl ServiceState for ShutterContactState {
    const SERVICE_NAME: &'static str = "ShutterContact";
    const STATE_TYPE: &'static str = "shutterContactState";
}

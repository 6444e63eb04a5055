// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error entity returned by the REST endpoints.

use serde::{Deserialize, Serialize};

/// Error body sent by the bridge together with a non-success status.
///
/// ```json
/// {"@type":"JsonRestExceptionResponseEntity","errorCode":"ENTITY_NOT_FOUND","statusCode":404}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonRestExceptionResponseEntity {
    /// Symbolic error code, e.g. `ENTITY_NOT_FOUND`.
    pub error_code: String,
    /// HTTP status code repeated in the body.
    pub status_code: u16,
}

impl JsonRestExceptionResponseEntity {
    /// Tries to decode an error body. Returns `None` for any other shape.
    #[must_use]
    pub fn from_body(body: &str) -> Option<Self> {
        serde_json::from_str(body).ok()
    }
}

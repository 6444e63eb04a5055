// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! JSON-RPC envelopes used for long polling.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{BridgeError, DecodeError, Error};

/// Topic that covers every state change the bridge publishes.
const SUBSCRIBE_TOPIC: &str = "com/bosch/sh/remote/*";

/// Error code the bridge uses for unknown or expired subscriptions.
const SUBSCRIPTION_NOT_FOUND: i64 = -32001;

/// A JSON-RPC 2.0 call.
///
/// # Examples
///
/// ```
/// use boschshc::response::JsonRpcRequest;
///
/// let request = JsonRpcRequest::long_poll("e71k823d0-16", 20);
/// let json = serde_json::to_value(&request).unwrap();
/// assert_eq!(json["method"], "RE/longPoll");
/// assert_eq!(json["params"][1], 20);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcRequest {
    jsonrpc: &'static str,
    method: &'static str,
    params: Vec<Value>,
}

impl JsonRpcRequest {
    /// Opens a subscription for all state changes.
    #[must_use]
    pub fn subscribe() -> Self {
        Self::new("RE/subscribe", vec![SUBSCRIBE_TOPIC.into(), Value::Null])
    }

    /// Waits up to `timeout_secs` for changes on an open subscription.
    #[must_use]
    pub fn long_poll(subscription_id: &str, timeout_secs: u64) -> Self {
        Self::new(
            "RE/longPoll",
            vec![subscription_id.into(), timeout_secs.into()],
        )
    }

    /// Closes an open subscription.
    #[must_use]
    pub fn unsubscribe(subscription_id: &str) -> Self {
        Self::new("RE/unsubscribe", vec![subscription_id.into()])
    }

    fn new(method: &'static str, params: Vec<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            method,
            params,
        }
    }

    /// Returns the method name.
    #[must_use]
    pub fn method(&self) -> &str {
        self.method
    }
}

impl From<JsonRpcRequest> for Value {
    fn from(request: JsonRpcRequest) -> Self {
        serde_json::json!({
            "jsonrpc": request.jsonrpc,
            "method": request.method,
            "params": request.params,
        })
    }
}

/// Error object of a failed JSON-RPC call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Numeric error code.
    pub code: i64,
    /// Human-readable message.
    #[serde(default)]
    pub message: String,
}

impl fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Response to a JSON-RPC call. Exactly one of `result` and `error` is set.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JsonRpcResponse<T> {
    /// Protocol version, always `2.0`.
    #[serde(default)]
    pub jsonrpc: String,
    /// Result of a successful call.
    pub result: Option<T>,
    /// Error of a failed call.
    pub error: Option<JsonRpcError>,
}

impl<T> JsonRpcResponse<T> {
    /// Converts the envelope into its result.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::SubscriptionExpired`] for an unknown subscription,
    /// [`BridgeError::JsonRpc`] for any other error object, and
    /// [`DecodeError::MissingResult`] if neither field is present.
    pub fn into_result(self) -> Result<T, Error> {
        match (self.result, self.error) {
            (_, Some(error)) if error.code == SUBSCRIPTION_NOT_FOUND => {
                Err(BridgeError::SubscriptionExpired(error.message).into())
            }
            (_, Some(error)) => Err(BridgeError::JsonRpc(error).into()),
            (Some(result), None) => Ok(result),
            (None, None) => Err(DecodeError::MissingResult.into()),
        }
    }
}

/// Answer to `RE/subscribe`; the result is the subscription id.
pub type SubscribeResult = JsonRpcResponse<String>;

/// Answer to `RE/longPoll`; the result lists changed service states.
///
/// Entries stay raw JSON so one malformed entry cannot spoil the batch;
/// decode them with [`DeviceServiceData::from_entries`].
pub type LongPollResult = JsonRpcResponse<Vec<Value>>;

/// One changed device service, as delivered by a long poll.
///
/// ```json
/// {
///   "@type": "DeviceServiceData",
///   "path": "/devices/hdm:HomeMaticIP:3014F711A0001916D859A8A9/services/ShutterContact",
///   "id": "ShutterContact",
///   "state": {"@type": "shutterContactState", "value": "OPEN"},
///   "deviceId": "hdm:HomeMaticIP:3014F711A0001916D859A8A9"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceServiceData {
    /// Entity type tag.
    #[serde(rename = "@type", default)]
    pub kind: String,
    /// Service name, e.g. `ShutterContact`.
    #[serde(default)]
    pub id: String,
    /// Device the service belongs to.
    #[serde(default)]
    pub device_id: String,
    /// Resource path of the service.
    #[serde(default)]
    pub path: Option<String>,
    /// New service state, absent for non-state notifications.
    #[serde(default)]
    pub state: Option<Value>,
}

impl DeviceServiceData {
    /// Decodes the entries of one long-poll batch.
    ///
    /// Entries that do not have the expected shape are logged and skipped.
    #[must_use]
    pub fn from_entries(entries: Vec<Value>) -> Vec<Self> {
        entries
            .into_iter()
            .filter_map(|entry| match Self::deserialize(&entry) {
                Ok(data) => Some(data),
                Err(e) => {
                    tracing::warn!(error = %e, entry = %entry, "Skipping malformed long poll entry");
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn subscribe_request_shape() {
        let json = serde_json::to_value(JsonRpcRequest::subscribe()).unwrap();
        assert_eq!(
            json,
            json!({
                "jsonrpc": "2.0",
                "method": "RE/subscribe",
                "params": ["com/bosch/sh/remote/*", null]
            })
        );
    }

    #[test]
    fn converts_into_request_body() {
        let request = JsonRpcRequest::long_poll("sub-1", 20);
        let body: Value = request.clone().into();
        assert_eq!(body, serde_json::to_value(&request).unwrap());
    }

    #[test]
    fn unsubscribe_request_shape() {
        let json = serde_json::to_value(JsonRpcRequest::unsubscribe("sub-1")).unwrap();
        assert_eq!(json["method"], "RE/unsubscribe");
        assert_eq!(json["params"], json!(["sub-1"]));
    }

    #[test]
    fn subscribe_result_ok() {
        let result: SubscribeResult =
            serde_json::from_str(r#"{"result":"e71k823d0-16","jsonrpc":"2.0"}"#).unwrap();
        assert_eq!(result.into_result().unwrap(), "e71k823d0-16");
    }

    #[test]
    fn long_poll_result_with_updates() {
        let body = r#"{
            "result": [
                {
                    "@type": "DeviceServiceData",
                    "path": "/devices/hdm:HomeMaticIP:1/services/ShutterContact",
                    "id": "ShutterContact",
                    "state": {"@type": "shutterContactState", "value": "CLOSED"},
                    "deviceId": "hdm:HomeMaticIP:1"
                },
                {"@type": "message", "id": "8a7b6c"}
            ],
            "jsonrpc": "2.0"
        }"#;
        let result: LongPollResult = serde_json::from_str(body).unwrap();
        let updates = DeviceServiceData::from_entries(result.into_result().unwrap());

        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].id, "ShutterContact");
        assert_eq!(updates[0].device_id, "hdm:HomeMaticIP:1");
        assert_eq!(updates[0].state.as_ref().unwrap()["value"], "CLOSED");
        assert_eq!(updates[1].kind, "message");
        assert!(updates[1].state.is_none());
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let entries = vec![
            json!({"@type": "message", "id": 42, "deviceId": null}),
            json!({
                "@type": "DeviceServiceData",
                "id": "PowerSwitch",
                "deviceId": "hdm:ZigBee:1",
                "state": {"@type": "powerSwitchState", "switchState": "ON"}
            }),
            json!("not an object"),
        ];

        let updates = DeviceServiceData::from_entries(entries);

        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].id, "PowerSwitch");
        assert_eq!(updates[0].device_id, "hdm:ZigBee:1");
    }

    #[test]
    fn expired_subscription_is_distinguished() {
        let body = r#"{"jsonrpc":"2.0","error":{"code":-32001,"message":"No subscription with id: abc"}}"#;
        let result: LongPollResult = serde_json::from_str(body).unwrap();
        let err = result.into_result().unwrap_err();
        assert!(matches!(
            err,
            Error::Bridge(BridgeError::SubscriptionExpired(_))
        ));
    }

    #[test]
    fn other_rpc_errors_are_kept() {
        let body = r#"{"jsonrpc":"2.0","error":{"code":-32602,"message":"Invalid params"}}"#;
        let result: SubscribeResult = serde_json::from_str(body).unwrap();
        let err = result.into_result().unwrap_err();
        assert!(matches!(err, Error::Bridge(BridgeError::JsonRpc(ref e)) if e.code == -32602));
    }

    #[test]
    fn empty_envelope_is_decode_error() {
        let result: SubscribeResult = serde_json::from_str(r#"{"jsonrpc":"2.0"}"#).unwrap();
        assert!(result.into_result().unwrap_err().is_decode());
    }
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Long-poll subscription loop.
//!
//! ```text
//! RE/subscribe ──► subscription id
//!      │
//!      ▼
//! RE/longPoll ◄──┐  updates routed to device handlers
//!      │         │
//!      ├─────────┘  (ok)
//!      ├──► -32001: subscribe again at once
//!      └──► failure: OFFLINE, back off, subscribe again
//!
//! cancelled ──► RE/unsubscribe (best effort)
//! ```

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use tokio_util::sync::CancellationToken;

use crate::error::{BridgeError, Error};
use crate::protocol::{BridgeHttpClient, BridgeRequest};
use crate::response::{DeviceServiceData, JsonRpcRequest, LongPollResult, SubscribeResult};
use crate::types::{StatusDetail, ThingStatus};

use super::config::{BridgeConfig, ReconnectionPolicy};
use super::handler::BridgeShared;

/// Path of the JSON-RPC endpoint on the API port.
const JSON_RPC_PATH: &str = "remote/json-rpc";

/// Background loop receiving pushed state changes from the bridge.
pub(crate) struct LongPolling {
    client: BridgeHttpClient,
    shared: Arc<BridgeShared>,
    policy: ReconnectionPolicy,
    poll_seconds: u64,
    request_timeout: Duration,
}

impl LongPolling {
    pub(crate) fn new(client: BridgeHttpClient, shared: Arc<BridgeShared>, config: &BridgeConfig) -> Self {
        Self {
            client,
            shared,
            policy: config.reconnection.clone(),
            poll_seconds: config.long_poll_timeout,
            request_timeout: config.timeout,
        }
    }

    /// Runs until `token` is cancelled or the reconnection policy gives up.
    pub(crate) async fn run(self, token: CancellationToken) {
        let mut attempt: u32 = 0;
        let mut subscription: Option<String> = None;

        loop {
            let subscription_id = match subscription.clone() {
                Some(id) => id,
                None => {
                    let result = tokio::select! {
                        () = token.cancelled() => break,
                        result = self.subscribe() => result,
                    };
                    match result {
                        Ok(id) => {
                            attempt = 0;
                            self.shared.subscription_established(&id);
                            self.shared.set_status(ThingStatus::Online);
                            subscription = Some(id.clone());
                            id
                        }
                        Err(e) => {
                            if !self.back_off(&e, &mut attempt, &token).await {
                                break;
                            }
                            continue;
                        }
                    }
                }
            };

            let result = tokio::select! {
                () = token.cancelled() => break,
                result = self.poll(&subscription_id) => result,
            };

            match result {
                Ok(updates) => {
                    tracing::trace!(count = updates.len(), "Long poll returned");
                    for data in &updates {
                        self.shared.route_update(data);
                    }
                }
                Err(Error::Bridge(BridgeError::SubscriptionExpired(message))) => {
                    tracing::info!(
                        subscription_id = %subscription_id,
                        message = %message,
                        "Subscription expired, subscribing again"
                    );
                    subscription = None;
                }
                Err(e) => {
                    subscription = None;
                    if !self.back_off(&e, &mut attempt, &token).await {
                        break;
                    }
                }
            }
        }

        if let Some(subscription_id) = subscription {
            self.unsubscribe(&subscription_id).await;
        }
        tracing::debug!("Long polling stopped");
    }

    /// Marks the bridge OFFLINE and sleeps before the next attempt.
    ///
    /// Returns `false` if the loop should stop.
    async fn back_off(&self, error: &Error, attempt: &mut u32, token: &CancellationToken) -> bool {
        tracing::warn!(error = %error, attempt = *attempt, "Long polling failed");
        self.shared.set_status(ThingStatus::offline(
            StatusDetail::CommunicationError,
            format!("Long polling failed: {error}"),
        ));

        if !self.policy.should_retry(*attempt) {
            tracing::warn!(attempts = *attempt, "Giving up on long polling");
            return false;
        }

        let delay = self.policy.delay_for_attempt(*attempt);
        *attempt = attempt.saturating_add(1);
        tracing::debug!(delay_ms = delay.as_millis(), "Waiting before subscribing again");

        tokio::select! {
            () = token.cancelled() => false,
            () = tokio::time::sleep(delay) => true,
        }
    }

    async fn subscribe(&self) -> Result<String, Error> {
        let request = self.rpc_request(JsonRpcRequest::subscribe());
        let response: SubscribeResult = self.client.send_request(&request).await?;
        response.into_result()
    }

    async fn poll(&self, subscription_id: &str) -> Result<Vec<DeviceServiceData>, Error> {
        let request = self
            .rpc_request(JsonRpcRequest::long_poll(subscription_id, self.poll_seconds))
            .with_timeout(Duration::from_secs(self.poll_seconds) + self.request_timeout);
        let response: LongPollResult = self.client.send_request(&request).await?;
        Ok(DeviceServiceData::from_entries(response.into_result()?))
    }

    async fn unsubscribe(&self, subscription_id: &str) {
        let request = self.rpc_request(JsonRpcRequest::unsubscribe(subscription_id));
        match self.client.send_command(&request).await {
            Ok(()) => tracing::debug!(subscription_id, "Unsubscribed from bridge"),
            Err(e) => tracing::debug!(subscription_id, error = %e, "Unsubscribe failed"),
        }
    }

    fn rpc_request(&self, call: JsonRpcRequest) -> BridgeRequest {
        self.client
            .create_request_with_body(&self.client.bridge_url(JSON_RPC_PATH), Method::POST, call)
    }
}

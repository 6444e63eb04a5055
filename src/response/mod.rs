// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed payloads returned by the Bosch Smart Home Controller.
//!
//! The bridge speaks two dialects:
//!
//! - REST endpoints under `/smarthome/...` returning plain JSON entities
//!   ([`Device`], service states, [`JsonRestExceptionResponseEntity`] on error)
//! - A JSON-RPC endpoint under `/remote/json-rpc` used for long polling
//!   ([`SubscribeResult`], [`LongPollResult`])

mod device;
mod exception;
mod json_rpc;

pub use device::Device;
pub use exception::JsonRestExceptionResponseEntity;
pub use json_rpc::{
    DeviceServiceData, JsonRpcError, JsonRpcRequest, JsonRpcResponse, LongPollResult,
    SubscribeResult,
};

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the bridge HTTP client using wiremock.

use std::time::Duration;

use boschshc::error::{BridgeError, Error, TransportError};
use boschshc::protocol::{BridgeAddress, BridgeHttpClient, ClientId, PairingCredential};
use boschshc::response::Device;
use reqwest::Method;
use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CERT: &str = include_str!("fixtures/client-cert.pem");
const KEY: &str = include_str!("fixtures/client-key.pem");

fn credential() -> PairingCredential {
    PairingCredential::from_pem(ClientId::new("oss_test").unwrap(), CERT, KEY).unwrap()
}

fn client_for(port: u16) -> BridgeHttpClient {
    let address = BridgeAddress::new("127.0.0.1")
        .unwrap()
        .with_ports(port, port)
        .with_plain_http();
    BridgeHttpClient::builder(address)
        .timeout(Duration::from_secs(2))
        .build(&credential())
        .unwrap()
}

fn client(server: &MockServer) -> BridgeHttpClient {
    client_for(server.address().port())
}

/// A client for a port nothing listens on.
fn unreachable_client() -> BridgeHttpClient {
    client_for(1)
}

// ============================================================================
// Pairing
// ============================================================================

mod pairing {
    use super::*;

    #[tokio::test]
    async fn pairing_succeeds_on_created() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/smarthome/clients"))
            .and(header("Systempassword", "c2VjcmV0"))
            .and(body_partial_json(json!({
                "@type": "client",
                "id": "oss_test",
                "name": "oss_test",
                "primaryRole": "ROLE_RESTRICTED_CLIENT"
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        assert!(client(&server).do_pairing("secret").await.unwrap());
    }

    #[tokio::test]
    async fn pairing_sends_certificate() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/smarthome/clients"))
            .and(body_partial_json(json!({"certificate": CERT.trim()})))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        assert!(client(&server).do_pairing("secret").await.unwrap());
    }

    #[tokio::test]
    async fn pairing_refused_returns_false() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/smarthome/clients"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "@type": "JsonRestExceptionResponseEntity",
                "errorCode": "PAIRING_MODE_NOT_ACTIVE",
                "statusCode": 401
            })))
            .mount(&server)
            .await;

        assert!(!client(&server).do_pairing("secret").await.unwrap());
    }

    #[tokio::test]
    async fn pairing_with_unreachable_bridge_returns_false() {
        assert!(!unreachable_client().do_pairing("secret").await.unwrap());
    }
}

// ============================================================================
// Access check
// ============================================================================

mod access {
    use super::*;

    #[tokio::test]
    async fn access_possible_when_devices_are_readable() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/smarthome/devices"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        assert!(client(&server).is_access_possible().await);
    }

    #[tokio::test]
    async fn access_denied_for_unknown_client() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/smarthome/devices"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        assert!(!client(&server).is_access_possible().await);
    }

    #[tokio::test]
    async fn access_not_possible_for_unreachable_bridge() {
        assert!(!unreachable_client().is_access_possible().await);
    }
}

// ============================================================================
// Requests
// ============================================================================

mod requests {
    use super::*;

    #[tokio::test]
    async fn send_request_decodes_devices() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/smarthome/devices"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "@type": "device",
                    "id": "hdm:HomeMaticIP:3014F711A0001916D859A8A9",
                    "name": "Kitchen window",
                    "deviceModel": "SWD",
                    "deviceServiceIds": ["ShutterContact", "BatteryLevel"]
                },
                {
                    "@type": "device",
                    "id": "hdm:ZigBee:70ac08fffefead2d",
                    "name": "Hall light",
                    "deviceModel": "BSM",
                    "deviceServiceIds": ["PowerSwitch"]
                }
            ])))
            .mount(&server)
            .await;

        let client = client(&server);
        let request = client.create_request(&client.smart_home_url("devices"), Method::GET);
        let devices: Vec<Device> = client.send_request(&request).await.unwrap();

        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].name, "Kitchen window");
        assert!(devices[0].has_service("ShutterContact"));
        assert_eq!(devices[1].device_model.as_deref(), Some("BSM"));
    }

    #[tokio::test]
    async fn service_state_round_trip() {
        let server = MockServer::start().await;
        let state_path = "/smarthome/devices/hdm:ZigBee:70ac08fffefead2d/services/PowerSwitch/state";

        Mock::given(method("PUT"))
            .and(path(state_path))
            .and(body_json(json!({"@type": "powerSwitchState", "switchState": "ON"})))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        let url = client.service_url("PowerSwitch", "hdm:ZigBee:70ac08fffefead2d");
        let request = client.create_request_with_body(
            &url,
            Method::PUT,
            json!({"@type": "powerSwitchState", "switchState": "ON"}),
        );

        client.send_command(&request).await.unwrap();
    }

    #[tokio::test]
    async fn rejected_request_carries_error_entity() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/smarthome/devices/unknown/services/ShutterContact/state"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "@type": "JsonRestExceptionResponseEntity",
                "errorCode": "ENTITY_NOT_FOUND",
                "statusCode": 404
            })))
            .mount(&server)
            .await;

        let client = client(&server);
        let request = client.create_request(&client.service_url("ShutterContact", "unknown"), Method::GET);
        let err = client.send_request::<serde_json::Value>(&request).await.unwrap_err();

        match err {
            Error::Bridge(BridgeError::Rejected { status, entity }) => {
                assert_eq!(status, 404);
                assert_eq!(entity.unwrap().error_code, "ENTITY_NOT_FOUND");
            }
            other => panic!("expected rejected request, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unexpected_body_is_a_decode_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/smarthome/devices"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let client = client(&server);
        let request = client.create_request(&client.smart_home_url("devices"), Method::GET);
        let err = client.send_request::<Vec<Device>>(&request).await.unwrap_err();

        assert!(err.is_decode());
        assert!(!err.is_transport());
    }

    #[tokio::test]
    async fn unreachable_bridge_is_a_transport_error() {
        let client = unreachable_client();
        let request = client.create_request(&client.smart_home_url("devices"), Method::GET);
        let err = client.send_request::<Vec<Device>>(&request).await.unwrap_err();

        assert!(err.is_transport());
        assert!(!err.is_decode());
    }

    #[tokio::test]
    async fn per_request_timeout_applies() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/smarthome/devices"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([]))
                    .set_delay(Duration::from_secs(1)),
            )
            .mount(&server)
            .await;

        let client = client(&server);
        let request = client
            .create_request(&client.smart_home_url("devices"), Method::GET)
            .with_timeout(Duration::from_millis(100));
        let err = client.send_request::<Vec<Device>>(&request).await.unwrap_err();

        match err {
            Error::Transport(e @ TransportError::Http(_)) => assert!(e.is_timeout()),
            other => panic!("expected timeout, got {other:?}"),
        }
    }
}

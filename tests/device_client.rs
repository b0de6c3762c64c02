// MIT License - Copyright (c) 2026 Peter Wright
// ISAPI client tests against a mock device

use std::time::Duration;

use wiremock::matchers::{basic_auth, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use hikax_bridge::{BridgeError, DeviceConfig, DeviceKind, HikAxClient, StatusSource};

fn client_for(server: &MockServer) -> HikAxClient {
    let address = server.address();
    HikAxClient::new(DeviceConfig {
        host: address.ip().to_string(),
        port: address.port(),
        username: "admin".to_string(),
        password: "secret".to_string(),
        request_timeout: Duration::from_secs(2),
    })
    .unwrap()
}

#[tokio::test]
async fn fetches_and_normalizes_zones() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ISAPI/SecurityCP/status/zones"))
        .and(query_param("format", "json"))
        .and(basic_auth("admin", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"ZoneList": [
                {"Zone": {"id": 1, "name": "Front Door", "status": "online",
                          "chargeValue": 90, "signal": 8, "realSignal": 50,
                          "temperature": 20}},
                {"Zone": {"id": 2, "name": "Hallway"}}
            ]}"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let zones = client_for(&server).fetch_zone_statuses().await.unwrap();
    assert_eq!(zones.len(), 2);

    let record = zones[0].to_record();
    assert_eq!(record.kind, DeviceKind::Zone);
    assert_eq!(record.id, 1);
    assert_eq!(record.name, "Front Door");
    assert_eq!(record.signal, 50);
    assert_eq!(record.charge_value, 90);

    // The wired zone parses with zeroed radio fields.
    assert_eq!(zones[1].to_record().signal, 0);
}

#[tokio::test]
async fn fetches_sirens_from_ex_dev_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ISAPI/SecurityCP/status/exDevStatus"))
        .and(query_param("format", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"ExDevStatus": {
                "OutputList": [],
                "SirenList": [
                    {"Siren": {"id": 1, "name": "Garden Siren", "chargeValue": 100,
                               "realSignal": 72, "temperature": 18,
                               "model": "DS-PS1-E-WE"}}
                ],
                "KeypadList": []
            }}"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let sirens = client_for(&server).fetch_aux_device_statuses().await.unwrap();
    assert_eq!(sirens.len(), 1);
    assert_eq!(sirens[0].to_record().kind, DeviceKind::Siren);
    assert_eq!(sirens[0].to_record().name, "Garden Siren");
}

#[tokio::test]
async fn rejected_credentials_surface_as_authentication_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ISAPI/SecurityCP/status/zones"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client_for(&server).fetch_zone_statuses().await.unwrap_err();
    assert!(matches!(err, BridgeError::Authentication));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn server_error_carries_endpoint_and_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ISAPI/SecurityCP/status/exDevStatus"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .fetch_aux_device_statuses()
        .await
        .unwrap_err();
    match err {
        BridgeError::DeviceStatus { ref endpoint, status } => {
            assert!(endpoint.contains("exDevStatus"));
            assert_eq!(status, 503);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.is_transient());
}

#[tokio::test]
async fn malformed_body_is_an_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ISAPI/SecurityCP/status/zones"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("<html>login page</html>", "text/html"),
        )
        .mount(&server)
        .await;

    let err = client_for(&server).fetch_zone_statuses().await.unwrap_err();
    match err {
        BridgeError::InvalidResponse { details } => {
            assert!(details.contains("body preview"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn unreachable_device_is_a_transport_error() {
    // Bind-and-drop to get a port nothing listens on.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let client = HikAxClient::new(DeviceConfig {
        host: "127.0.0.1".to_string(),
        port,
        username: "admin".to_string(),
        password: "secret".to_string(),
        request_timeout: Duration::from_secs(1),
    })
    .unwrap();

    let err = client.fetch_zone_statuses().await.unwrap_err();
    assert!(matches!(err, BridgeError::Transport(_)));
    assert!(err.is_transient());
}

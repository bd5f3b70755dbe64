#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;

use serde_json::{json, Value};

use ccsbridge_core::protocol::envelope::{Data, OutboundMessage};
use ccsbridge_gateway::config;
use ccsbridge_gateway::dispatch::CcsDispatcher;
use ccsbridge_gateway::obs::BridgeMetrics;
use ccsbridge_gateway::policy::AckPolicy;
use ccsbridge_gateway::session::ConnectionSession;
use ccsbridge_gateway::transport::LoopbackConnector;
use ccsbridge_gateway::app_state::BridgeState;

async fn dispatcher() -> (Arc<LoopbackConnector>, CcsDispatcher) {
    let connector = Arc::new(LoopbackConnector::new());
    connector.accept_login("proj123@gcm.googleapis.com", "key-abc");
    let metrics = Arc::new(BridgeMetrics::default());
    let session = Arc::new(ConnectionSession::new(
        connector.clone(),
        "key-abc",
        "gcm.googleapis.com",
        5235,
        Arc::clone(&metrics),
    ));
    session.connect("proj123").await.unwrap();
    (connector, CcsDispatcher::new(session, AckPolicy::default(), metrics))
}

fn sent(connector: &LoopbackConnector) -> Vec<Value> {
    connector
        .last_connection()
        .unwrap()
        .sent_json()
        .iter()
        .map(|s| serde_json::from_str(s).unwrap())
        .collect()
}

#[tokio::test]
async fn dispatch_fills_defaults_and_generates_an_id() {
    let (connector, d) = dispatcher().await;

    let id = d.dispatch_message(OutboundMessage::new("dev1")).await.unwrap();
    assert!(uuid_like(&id), "id={id}");

    let out = sent(&connector);
    assert_eq!(
        out,
        vec![json!({
            "to": "dev1",
            "message_id": id,
            "delay_while_idle": false,
            "time_to_live": 2419200
        })]
    );
}

#[tokio::test]
async fn dispatch_keeps_caller_fields() {
    let (connector, d) = dispatcher().await;

    let mut data = Data::new();
    data.insert("score".into(), json!("5x1"));
    let msg = OutboundMessage::new("dev1")
        .message_id("m-42")
        .data(data)
        .delay_while_idle(true)
        .time_to_live(600);

    assert_eq!(d.dispatch_message(msg).await.unwrap(), "m-42");
    assert_eq!(
        sent(&connector)[0],
        json!({
            "to": "dev1",
            "message_id": "m-42",
            "data": {"score": "5x1"},
            "delay_while_idle": true,
            "time_to_live": 600
        })
    );
}

#[tokio::test]
async fn generated_ids_differ_per_message() {
    let (_connector, d) = dispatcher().await;
    let a = d.dispatch_message(OutboundMessage::new("dev1")).await.unwrap();
    let b = d.dispatch_message(OutboundMessage::new("dev1")).await.unwrap();
    assert_ne!(a, b);
}

#[tokio::test]
async fn manual_ack_carries_only_target_fields() {
    let (connector, d) = dispatcher().await;
    d.acknowledge_message("dev2", "m2").await.unwrap();

    let raw = connector.last_connection().unwrap().sent_json();
    assert_eq!(raw, vec![r#"{"to":"dev2","message_id":"m2"}"#.to_string()]);
}

#[tokio::test]
async fn dispatch_after_disconnect_fails() {
    let (_connector, d) = dispatcher().await;
    d.session().disconnect().await;

    let err = d.dispatch_message(OutboundMessage::new("dev1")).await.unwrap_err();
    assert_eq!(err.kind().as_str(), "SEND_FAILURE");
    let err = d.acknowledge_message("dev1", "m1").await.unwrap_err();
    assert_eq!(err.kind().as_str(), "SEND_FAILURE");
}

#[tokio::test]
async fn bridge_state_wires_config_into_session_and_policy() {
    let cfg = config::load_from_str(
        r#"
version: 1
sender_id: "proj123"
api_key: "key-abc"
ccs:
  host: relay.test
  port: 15235
  auto_ack: true
"#,
    )
    .unwrap();

    let connector = Arc::new(LoopbackConnector::new());
    connector.accept_login("proj123@gcm.googleapis.com", "key-abc");
    let state = BridgeState::new(cfg, connector.clone()).unwrap();

    state.connect().await.unwrap();
    assert!(state.session().is_connected());
    assert!(state.dispatcher().policy().auto_ack);
    assert_eq!(state.metrics().connected.get(&[]), 1);

    let conn = connector.last_connection().unwrap();
    assert_eq!(conn.config().host, "relay.test");
    assert_eq!(conn.config().port, 15235);

    state.session().disconnect().await;
    assert_eq!(state.metrics().connected.get(&[]), 0);
}

fn uuid_like(s: &str) -> bool {
    let parts: Vec<&str> = s.split('-').collect();
    parts.iter().map(|p| p.len()).collect::<Vec<_>>() == [8, 4, 4, 4, 12]
        && parts.iter().all(|p| p.chars().all(|c| c.is_ascii_hexdigit()))
}

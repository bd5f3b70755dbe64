#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use ccsbridge::gateway::transport::LoopbackConnector;
use ccsbridge::prelude::*;

#[tokio::test]
async fn loopback_round_trip_through_the_facade() {
    let yaml = "version: 1\nsender_id: proj123\napi_key: key-abc\nccs: { auto_ack: true }\n";
    let cfg = load_from_str(yaml).unwrap();
    let connector = Arc::new(LoopbackConnector::new());
    connector.accept_login("proj123@gcm.googleapis.com", "key-abc");

    let bridge = BridgeState::new(cfg, connector.clone()).unwrap();
    bridge.connect().await.unwrap();
    let mut inbound = bridge.dispatcher().receive().unwrap();

    let id = bridge
        .dispatcher()
        .dispatch_message(OutboundMessage::new("dev1").message_id("out-1"))
        .await
        .unwrap();
    assert_eq!(id, "out-1");

    let conn = connector.last_connection().unwrap();
    conn.deliver_json("p1", r#"{"message_id":"m2","from":"dev2"}"#).await.unwrap();

    let env = inbound.recv().await.unwrap();
    assert_eq!(classify(&env), Classification::Data);
    assert_eq!(conn.sent_json().len(), 2);
}

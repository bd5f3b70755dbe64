//! Connect / disconnect / send contract of the streaming session.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;

use ccsbridge_core::protocol::envelope::RequestEnvelope;
use ccsbridge_gateway::obs::BridgeMetrics;
use ccsbridge_gateway::session::ConnectionSession;
use ccsbridge_gateway::transport::{LoopbackConnector, SecurityMode, StreamConnection};

fn session_with(connector: &Arc<LoopbackConnector>, api_key: &str) -> ConnectionSession {
    ConnectionSession::new(
        connector.clone(),
        api_key,
        "gcm.googleapis.com",
        5235,
        Arc::new(BridgeMetrics::default()),
    )
}

#[tokio::test]
async fn connect_logs_in_with_sender_identity() {
    let connector = Arc::new(LoopbackConnector::new());
    connector.accept_login("proj123@gcm.googleapis.com", "key-abc");
    let session = session_with(&connector, "key-abc");

    session.connect("proj123").await.unwrap();

    assert!(session.is_connected());
    assert_eq!(session.login_user().as_deref(), Some("proj123@gcm.googleapis.com"));

    let conn = connector.last_connection().unwrap();
    assert_eq!(conn.login_attempts(), vec!["proj123@gcm.googleapis.com".to_string()]);

    let cfg = conn.config();
    assert_eq!(cfg.host, "gcm.googleapis.com");
    assert_eq!(cfg.port, 5235);
    assert_eq!(cfg.security_mode, SecurityMode::Enabled);
    assert!(cfg.reconnection_allowed);
    assert!(!cfg.roster_loaded_at_login);
    assert!(!cfg.send_presence);
}

#[tokio::test]
async fn rejected_login_is_invalid_credentials() {
    let connector = Arc::new(LoopbackConnector::new());
    connector.accept_login("proj123@gcm.googleapis.com", "key-abc");
    let session = session_with(&connector, "wrong");

    let err = session.connect("proj123").await.unwrap_err();
    assert_eq!(err.kind().as_str(), "INVALID_CREDENTIALS");
    assert!(!session.is_connected());
    assert!(!connector.last_connection().unwrap().is_connected());
}

#[tokio::test]
async fn unreachable_relay_is_reported_before_login() {
    let connector = Arc::new(LoopbackConnector::new());
    connector.set_reachable(false);
    let session = session_with(&connector, "key-abc");

    let err = session.connect("proj123").await.unwrap_err();
    assert_eq!(err.kind().as_str(), "UNREACHABLE");
    assert!(connector.last_connection().is_none());
    assert!(!session.is_connected());
}

#[tokio::test]
async fn liveness_is_checked_after_login() {
    let connector = Arc::new(LoopbackConnector::new());
    connector.accept_login("proj123@gcm.googleapis.com", "key-abc");
    connector.set_drop_after_login(true);
    let session = session_with(&connector, "key-abc");

    let err = session.connect("proj123").await.unwrap_err();
    assert_eq!(err.kind().as_str(), "UNREACHABLE");
    assert!(!session.is_connected());
}

#[tokio::test]
async fn disconnect_is_idempotent() {
    let connector = Arc::new(LoopbackConnector::new());
    connector.accept_login("proj123@gcm.googleapis.com", "key-abc");
    let session = session_with(&connector, "key-abc");

    session.disconnect().await;
    assert!(!session.is_connected());

    session.connect("proj123").await.unwrap();
    session.disconnect().await;
    assert!(!session.is_connected());
    session.disconnect().await;
    assert!(!session.is_connected());
    assert!(session.sender_id().is_none());
}

#[tokio::test]
async fn reconnect_uses_a_fresh_handle() {
    let connector = Arc::new(LoopbackConnector::new());
    connector.accept_login("proj123@gcm.googleapis.com", "key-abc");
    let session = session_with(&connector, "key-abc");

    session.connect("proj123").await.unwrap();
    session.disconnect().await;
    session.connect("proj123").await.unwrap();

    let conns = connector.connections();
    assert_eq!(conns.len(), 2);
    assert!(!conns[0].is_connected());
    assert!(conns[1].is_connected());
    assert!(session.is_connected());
}

#[tokio::test]
async fn connect_while_connected_replaces_the_handle() {
    let connector = Arc::new(LoopbackConnector::new());
    connector.accept_login("proj123@gcm.googleapis.com", "key-abc");
    let session = session_with(&connector, "key-abc");

    session.connect("proj123").await.unwrap();
    session.connect("proj123").await.unwrap();

    let conns = connector.connections();
    assert_eq!(conns.len(), 2);
    assert!(!conns[0].is_connected());
    assert!(session.is_connected());
}

#[tokio::test]
async fn severed_link_reports_not_connected() {
    let connector = Arc::new(LoopbackConnector::new());
    connector.accept_login("proj123@gcm.googleapis.com", "key-abc");
    let session = session_with(&connector, "key-abc");
    session.connect("proj123").await.unwrap();

    connector.last_connection().unwrap().sever();
    assert!(!session.is_connected());
}

#[tokio::test]
async fn send_wraps_json_in_gcm_extension() {
    let connector = Arc::new(LoopbackConnector::new());
    connector.accept_login("proj123@gcm.googleapis.com", "key-abc");
    let session = session_with(&connector, "key-abc");
    session.connect("proj123").await.unwrap();

    session.send(&RequestEnvelope::ack("dev1", "m1")).await.unwrap();

    let conn = connector.last_connection().unwrap();
    let packets = conn.sent_packets();
    assert_eq!(packets.len(), 1);
    let xml = String::from_utf8(packets[0].to_xml().to_vec()).unwrap();
    assert_eq!(
        xml,
        concat!(
            "<message><gcm xmlns='google:mobile:data'>",
            "{&quot;to&quot;:&quot;dev1&quot;,&quot;message_id&quot;:&quot;m1&quot;}",
            "</gcm></message>"
        )
    );
}

#[tokio::test]
async fn send_without_connection_is_a_send_failure() {
    let connector = Arc::new(LoopbackConnector::new());
    let session = session_with(&connector, "key-abc");

    let err = session.send(&RequestEnvelope::ack("dev1", "m1")).await.unwrap_err();
    assert_eq!(err.kind().as_str(), "SEND_FAILURE");
}

#[tokio::test]
async fn transport_write_errors_propagate_without_retry() {
    let connector = Arc::new(LoopbackConnector::new());
    connector.accept_login("proj123@gcm.googleapis.com", "key-abc");
    let session = session_with(&connector, "key-abc");
    session.connect("proj123").await.unwrap();

    let conn = connector.last_connection().unwrap();
    conn.set_reject_sends(true);

    let err = session.send(&RequestEnvelope::ack("dev1", "m1")).await.unwrap_err();
    assert_eq!(err.kind().as_str(), "SEND_FAILURE");
    assert!(conn.sent_packets().is_empty());
    assert_eq!(connector.connect_attempts(), 1);
}

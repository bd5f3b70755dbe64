#![allow(clippy::unwrap_used)]

use ccsbridge_gateway::obs::BridgeMetrics;

#[test]
fn render_lists_labelled_series() {
    let m = BridgeMetrics::default();
    m.inbound_messages.inc(&[("class", "DATA")]);
    m.inbound_messages.inc(&[("class", "DATA")]);
    m.auto_acks.inc(&[("outcome", "error")]);
    m.connected.set(&[], 1);

    let out = m.render();
    assert!(out.contains("# TYPE ccsbridge_inbound_messages_total counter"));
    assert!(out.contains("ccsbridge_inbound_messages_total{class=\"DATA\"} 2"));
    assert!(out.contains("ccsbridge_auto_acks_total{outcome=\"error\"} 1"));
    assert!(out.contains("# TYPE ccsbridge_connected gauge"));
    assert!(out.contains("ccsbridge_connected{} 1"));
}

#[test]
fn label_order_does_not_split_series() {
    let m = BridgeMetrics::default();
    m.outbound_sends.inc(&[("outcome", "ok"), ("lane", "ccs")]);
    m.outbound_sends.inc(&[("lane", "ccs"), ("outcome", "ok")]);
    assert_eq!(m.outbound_sends.get(&[("outcome", "ok"), ("lane", "ccs")]), 2);
}

#[test]
fn tracing_init_tolerates_repeated_calls() {
    ccsbridge_gateway::obs::init_tracing();
    ccsbridge_gateway::obs::init_tracing();
    tracing::info!("subscriber installed");
}

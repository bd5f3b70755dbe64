//! Observability: tracing setup and lightweight in-process metrics.
//!
//! Metrics are stored as atomics and rendered in Prometheus text format by
//! `BridgeMetrics::render`; no exporter crate is pulled in.

pub mod metrics;

pub use metrics::BridgeMetrics;

use tracing_subscriber::{fmt, EnvFilter};

/// Install a fmt subscriber filtered by `RUST_LOG`.
///
/// Safe to call more than once (tests); later calls are ignored.
pub fn init_tracing() {
    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}

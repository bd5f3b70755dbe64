//! ccsbridge gateway library entry.
//!
//! Wires the streaming session, acknowledgment policy, dispatch facade, HTTP
//! client, and observability into one bridge. Consumed through the
//! `ccsbridge` facade crate and by integration tests.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod app_state;
pub mod config;
pub mod dispatch;
pub mod http;
pub mod obs;
pub mod policy;
pub mod session;
pub mod transport;

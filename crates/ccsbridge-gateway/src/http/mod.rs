//! HTTP lane: synchronous send and notification-key management.
//!
//! Shares the JSON envelope contract with the streaming lane but none of its
//! state. Requests go through `HttpTransport`, implemented with `ureq`.

pub mod client;
pub mod transport;

pub use client::GcmHttpClient;
pub use transport::{HttpResponse, HttpTransport, UreqTransport};

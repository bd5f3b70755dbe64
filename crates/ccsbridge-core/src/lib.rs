//! ccsbridge core: transport-agnostic protocol primitives and the error surface.
//!
//! This crate defines the `gcm` extension codec, the JSON envelopes exchanged
//! with the relay (streaming and HTTP), and the inbound message classifier. It
//! carries no transport or runtime dependencies so the gateway, tests, and
//! tooling can share it.
//!
//! # Failure model
//! Relay traffic is untrusted: a bad extension or envelope comes back as a
//! `BridgeError` carrying a stable `ErrorKind`. `panic!`, `unwrap`, and
//! `expect` are denied by clippy in this crate.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

pub use error::{BridgeError, ErrorKind, Result};

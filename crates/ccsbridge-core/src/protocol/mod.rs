//! Protocol modules (streaming extension + JSON envelopes + HTTP bodies).
//!
//! - `extension`: the `gcm` extension block that carries JSON inside a
//!   streaming-protocol message, with its XML escaping.
//! - `envelope`: request/response envelopes exchanged over the streaming lane.
//! - `classify`: DATA / ACK / NACK labelling of inbound envelopes.
//! - `http`: request/response bodies of the HTTP send and notification-key APIs.
//!
//! All parsers are panic-free: malformed input is reported as `BridgeError`.

pub mod classify;
pub mod envelope;
pub mod extension;
pub mod http;

//! Single-crate entry point for ccsbridge.
//!
//! `core` carries the wire codec, envelopes, and errors; `gateway` carries the
//! session, dispatch facade, HTTP client, and loopback transport. Most
//! applications only need the [`prelude`].

pub mod core {
    pub use ccsbridge_core::*;
}

pub mod gateway {
    pub use ccsbridge_gateway::*;
}

/// Types needed to connect, send, and receive.
pub mod prelude {
    pub use ccsbridge_core::protocol::classify::{classify, Classification};
    pub use ccsbridge_core::protocol::envelope::{
        Data, MessageType, OutboundMessage, RequestEnvelope, ResponseEnvelope,
    };
    pub use ccsbridge_core::protocol::http::HttpMessage;
    pub use ccsbridge_core::{BridgeError, ErrorKind, Result};
    pub use ccsbridge_gateway::app_state::BridgeState;
    pub use ccsbridge_gateway::config::{load_from_file, load_from_str, BridgeConfig};
    pub use ccsbridge_gateway::dispatch::{CcsDispatcher, InboundHandler, InboundStream};
    pub use ccsbridge_gateway::policy::AckPolicy;
    pub use ccsbridge_gateway::session::ConnectionSession;
    pub use ccsbridge_gateway::transport::{StreamConnection, StreamConnector};
}

//! Dispatch facade: outbound sends, manual acks, and the inbound pipeline.
//!
//! Re-exports the facade and the application-side traits so downstream
//! consumers can depend on this module directly.

pub mod dispatcher;
pub mod inbound;

pub use dispatcher::CcsDispatcher;
pub use inbound::{InboundHandler, InboundStream};

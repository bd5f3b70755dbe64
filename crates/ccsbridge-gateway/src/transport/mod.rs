//! Streaming transport boundary.
//!
//! The session talks to the relay only through these traits. A connector is
//! handed the session's extension provider at connect time, so extension
//! decoding is scoped to that connection rather than registered globally.
//! Inbound traffic reaches the session through `Subscription`s: a filter
//! deciding which packets to accept, paired with the listener that handles them.

pub mod loopback;
pub mod packet;

use std::sync::Arc;

use async_trait::async_trait;

use ccsbridge_core::error::Result;
use ccsbridge_core::protocol::extension::{GcmExtension, RawExtension};

pub use loopback::{LoopbackConnection, LoopbackConnector};
pub use packet::{Packet, PacketExtension, PacketKind};

/// Transport-level security negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityMode {
    Required,
    Enabled,
    Disabled,
}

/// Settings the session asks the transport to connect with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub security_mode: SecurityMode,
    pub reconnection_allowed: bool,
    pub roster_loaded_at_login: bool,
    pub send_presence: bool,
}

impl ConnectionConfig {
    /// Machine-to-machine relay link: TLS on, auto-reconnect on, no roster, no presence.
    pub fn relay(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            security_mode: SecurityMode::Enabled,
            reconnection_allowed: true,
            roster_loaded_at_login: false,
            send_presence: false,
        }
    }
}

/// Decodes one extension element into a typed block.
pub trait ExtensionProvider: Send + Sync {
    fn element_name(&self) -> &str;
    fn namespace(&self) -> &str;
    fn parse_extension(&self, raw: &RawExtension) -> Result<GcmExtension>;
}

/// Packet predicate of a subscription.
pub trait PacketFilter: Send + Sync {
    fn accept(&self, packet: &Packet) -> bool;
}

/// Handler of a subscription. May be invoked concurrently.
#[async_trait]
pub trait PacketListener: Send + Sync {
    async fn process_packet(&self, packet: Packet);
}

/// Accepts only message packets.
#[derive(Debug, Default, Clone, Copy)]
pub struct MessageFilter;

impl PacketFilter for MessageFilter {
    fn accept(&self, packet: &Packet) -> bool {
        packet.kind() == PacketKind::Message
    }
}

/// Filter + listener pair registered on a connection.
#[derive(Clone)]
pub struct Subscription {
    filter: Arc<dyn PacketFilter>,
    listener: Arc<dyn PacketListener>,
}

impl Subscription {
    pub fn new(filter: Arc<dyn PacketFilter>, listener: Arc<dyn PacketListener>) -> Self {
        Self { filter, listener }
    }

    pub fn matches(&self, packet: &Packet) -> bool {
        self.filter.accept(packet)
    }

    pub fn listener(&self) -> Arc<dyn PacketListener> {
        Arc::clone(&self.listener)
    }
}

/// Opens streaming connections to the relay.
#[async_trait]
pub trait StreamConnector: Send + Sync {
    async fn connect(
        &self,
        cfg: &ConnectionConfig,
        provider: Arc<dyn ExtensionProvider>,
    ) -> Result<Arc<dyn StreamConnection>>;
}

/// One live streaming connection.
#[async_trait]
pub trait StreamConnection: Send + Sync {
    /// Whether the transport reports the link as live.
    fn is_connected(&self) -> bool;
    async fn login(&self, username: &str, password: &str) -> Result<()>;
    async fn send_packet(&self, packet: Packet) -> Result<()>;
    fn add_subscription(&self, sub: Subscription);
    async fn disconnect(&self);
}

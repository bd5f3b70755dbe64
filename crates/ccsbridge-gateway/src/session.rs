//! Authenticated streaming session to the relay.
//!
//! State is an explicit tag: `Disconnected` or `Connected { handle }`. The
//! lock only guards swapping or cloning the handle and is never held across an
//! await, so acks sent from inbound handling and application sends only
//! serialize at the transport.

use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info, warn};

use ccsbridge_core::error::{BridgeError, Result};
use ccsbridge_core::protocol::envelope::RequestEnvelope;
use ccsbridge_core::protocol::extension::{
    decode, encode, GcmExtension, RawExtension, GCM_ELEMENT, GCM_NAMESPACE,
};

use crate::config::BridgeConfig;
use crate::obs::BridgeMetrics;
use crate::transport::{
    ConnectionConfig, ExtensionProvider, MessageFilter, Packet, PacketListener, StreamConnection,
    StreamConnector, Subscription,
};

/// Domain appended to the sender id to form the login identity.
pub const LOGIN_DOMAIN: &str = "gcm.googleapis.com";

/// Login identity for a sender id: `{sender_id}@gcm.googleapis.com`.
pub fn login_user(sender_id: &str) -> String {
    format!("{sender_id}@{LOGIN_DOMAIN}")
}

/// Extension provider handed to each connection this session opens.
#[derive(Debug, Default, Clone, Copy)]
pub struct GcmExtensionProvider;

impl ExtensionProvider for GcmExtensionProvider {
    fn element_name(&self) -> &str {
        GCM_ELEMENT
    }

    fn namespace(&self) -> &str {
        GCM_NAMESPACE
    }

    fn parse_extension(&self, raw: &RawExtension) -> Result<GcmExtension> {
        decode(raw).map(GcmExtension::new)
    }
}

enum SessionState {
    Disconnected,
    Connected {
        sender_id: String,
        handle: Arc<dyn StreamConnection>,
    },
}

pub struct ConnectionSession {
    connector: Arc<dyn StreamConnector>,
    api_key: String,
    host: String,
    port: u16,
    state: RwLock<SessionState>,
    metrics: Arc<BridgeMetrics>,
}

impl ConnectionSession {
    pub fn new(
        connector: Arc<dyn StreamConnector>,
        api_key: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        metrics: Arc<BridgeMetrics>,
    ) -> Self {
        Self {
            connector,
            api_key: api_key.into(),
            host: host.into(),
            port,
            state: RwLock::new(SessionState::Disconnected),
            metrics,
        }
    }

    pub fn from_config(
        cfg: &BridgeConfig,
        connector: Arc<dyn StreamConnector>,
        metrics: Arc<BridgeMetrics>,
    ) -> Self {
        Self::new(connector, cfg.api_key.clone(), cfg.ccs.host.clone(), cfg.ccs.port, metrics)
    }

    /// Connect and authenticate as `{sender_id}@gcm.googleapis.com`.
    ///
    /// Any previous handle is torn down first; a connect never reuses a link.
    pub async fn connect(&self, sender_id: &str) -> Result<()> {
        self.disconnect().await;

        let cfg = ConnectionConfig::relay(&self.host, self.port);
        let handle = self
            .connector
            .connect(&cfg, Arc::new(GcmExtensionProvider))
            .await
            .map_err(|e| {
                BridgeError::Unreachable(format!(
                    "connection to {}:{} failed: {e}",
                    cfg.host, cfg.port
                ))
            })?;

        if !handle.is_connected() {
            handle.disconnect().await;
            return Err(BridgeError::Unreachable(format!(
                "connection to {}:{} is not live",
                cfg.host, cfg.port
            )));
        }

        let user = login_user(sender_id);
        if let Err(e) = handle.login(&user, &self.api_key).await {
            handle.disconnect().await;
            return Err(match e {
                BridgeError::Unreachable(_) => e,
                other => BridgeError::InvalidCredentials(other.to_string()),
            });
        }

        if !handle.is_connected() {
            handle.disconnect().await;
            return Err(BridgeError::Unreachable(format!("connection lost after login as {user}")));
        }

        let previous = std::mem::replace(
            &mut *self.state.write().unwrap_or_else(PoisonError::into_inner),
            SessionState::Connected { sender_id: sender_id.to_string(), handle },
        );
        if let SessionState::Connected { handle: stale, .. } = previous {
            // lost a race with a concurrent connect
            stale.disconnect().await;
        }

        self.metrics.connected.set(&[], 1);
        info!(sender_id, user = %user, host = %cfg.host, port = cfg.port, "connected to relay");
        Ok(())
    }

    /// Idempotent. Clears the state before closing so concurrent senders see
    /// `Disconnected` rather than a dying handle.
    pub async fn disconnect(&self) {
        let previous = std::mem::replace(
            &mut *self.state.write().unwrap_or_else(PoisonError::into_inner),
            SessionState::Disconnected,
        );
        if let SessionState::Connected { sender_id, handle } = previous {
            handle.disconnect().await;
            self.metrics.connected.set(&[], 0);
            info!(sender_id = %sender_id, "disconnected from relay");
        }
    }

    pub fn is_connected(&self) -> bool {
        self.handle().map(|h| h.is_connected()).unwrap_or(false)
    }

    /// Sender id of the live session.
    pub fn sender_id(&self) -> Option<String> {
        match &*self.state.read().unwrap_or_else(PoisonError::into_inner) {
            SessionState::Connected { sender_id, .. } => Some(sender_id.clone()),
            SessionState::Disconnected => None,
        }
    }

    /// Login identity of the live session.
    pub fn login_user(&self) -> Option<String> {
        self.sender_id().map(|s| login_user(&s))
    }

    fn handle(&self) -> Option<Arc<dyn StreamConnection>> {
        match &*self.state.read().unwrap_or_else(PoisonError::into_inner) {
            SessionState::Connected { handle, .. } => Some(Arc::clone(handle)),
            SessionState::Disconnected => None,
        }
    }

    /// Serialize, wrap, and write one envelope. No retry.
    pub async fn send(&self, env: &RequestEnvelope) -> Result<()> {
        let json = env.to_json()?;
        let packet = Packet::message(encode(&json));

        let Some(handle) = self.handle() else {
            self.metrics.outbound_sends.inc(&[("outcome", "not_connected")]);
            return Err(BridgeError::SendFailure("not connected".into()));
        };

        match handle.send_packet(packet).await {
            Ok(()) => {
                self.metrics.outbound_sends.inc(&[("outcome", "ok")]);
                debug!(to = %env.to, message_id = %env.message_id, "envelope sent");
                Ok(())
            }
            Err(e) => {
                self.metrics.outbound_sends.inc(&[("outcome", "error")]);
                warn!(
                    to = %env.to,
                    message_id = %env.message_id,
                    error = %e,
                    "envelope send failed"
                );
                Err(match e {
                    BridgeError::SendFailure(_) => e,
                    other => BridgeError::SendFailure(other.to_string()),
                })
            }
        }
    }

    /// Register one listener for message packets on the live connection.
    pub fn subscribe(&self, listener: Arc<dyn PacketListener>) -> Result<()> {
        let handle = self.handle().ok_or(BridgeError::NotConnected)?;
        handle.add_subscription(Subscription::new(Arc::new(MessageFilter), listener));
        Ok(())
    }
}

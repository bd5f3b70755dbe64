//! In-process transport.
//!
//! Stands in for the relay in tests and local tooling: it checks credentials,
//! records what the session sends, and lets callers inject inbound stanzas.
//! Deliveries run one tokio task per matching subscription, the way a real
//! transport invokes listeners from its own pool.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::task::JoinHandle;

use ccsbridge_core::error::{BridgeError, Result};
use ccsbridge_core::protocol::extension::parse_extension_xml;

use super::{
    ConnectionConfig, ExtensionProvider, Packet, PacketExtension, PacketKind, StreamConnection,
    StreamConnector, Subscription,
};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Connector producing [`LoopbackConnection`]s.
pub struct LoopbackConnector {
    reachable: AtomicBool,
    drop_after_login: AtomicBool,
    credentials: Arc<DashMap<String, String>>,
    connections: Mutex<Vec<Arc<LoopbackConnection>>>,
    attempts: AtomicUsize,
}

impl Default for LoopbackConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopbackConnector {
    pub fn new() -> Self {
        Self {
            reachable: AtomicBool::new(true),
            drop_after_login: AtomicBool::new(false),
            credentials: Arc::new(DashMap::new()),
            connections: Mutex::new(Vec::new()),
            attempts: AtomicUsize::new(0),
        }
    }

    /// Accept `username` / `password` at login.
    pub fn accept_login(&self, username: impl Into<String>, password: impl Into<String>) {
        self.credentials.insert(username.into(), password.into());
    }

    pub fn set_reachable(&self, on: bool) {
        self.reachable.store(on, Ordering::SeqCst);
    }

    /// Make the link die right after a successful login.
    pub fn set_drop_after_login(&self, on: bool) {
        self.drop_after_login.store(on, Ordering::SeqCst);
    }

    pub fn connect_attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn connections(&self) -> Vec<Arc<LoopbackConnection>> {
        lock(&self.connections).clone()
    }

    pub fn last_connection(&self) -> Option<Arc<LoopbackConnection>> {
        lock(&self.connections).last().cloned()
    }
}

#[async_trait]
impl StreamConnector for LoopbackConnector {
    async fn connect(
        &self,
        cfg: &ConnectionConfig,
        provider: Arc<dyn ExtensionProvider>,
    ) -> Result<Arc<dyn StreamConnection>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if !self.reachable.load(Ordering::SeqCst) {
            return Err(BridgeError::Unreachable(format!(
                "connection refused: {}:{}",
                cfg.host, cfg.port
            )));
        }

        let conn = Arc::new(LoopbackConnection {
            config: cfg.clone(),
            provider,
            credentials: Arc::clone(&self.credentials),
            drop_after_login: self.drop_after_login.load(Ordering::SeqCst),
            connected: AtomicBool::new(true),
            reject_sends: AtomicBool::new(false),
            logins: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            subscriptions: Mutex::new(Vec::new()),
        });
        lock(&self.connections).push(Arc::clone(&conn));
        Ok(conn)
    }
}

/// One in-process link.
pub struct LoopbackConnection {
    config: ConnectionConfig,
    provider: Arc<dyn ExtensionProvider>,
    credentials: Arc<DashMap<String, String>>,
    drop_after_login: bool,
    connected: AtomicBool,
    reject_sends: AtomicBool,
    logins: Mutex<Vec<String>>,
    sent: Mutex<Vec<Packet>>,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl LoopbackConnection {
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Usernames of every login attempt, in order.
    pub fn login_attempts(&self) -> Vec<String> {
        lock(&self.logins).clone()
    }

    pub fn sent_packets(&self) -> Vec<Packet> {
        lock(&self.sent).clone()
    }

    /// JSON carried by every sent packet's `gcm` block.
    pub fn sent_json(&self) -> Vec<String> {
        lock(&self.sent)
            .iter()
            .filter_map(|p| p.gcm().map(|g| g.json().to_string()))
            .collect()
    }

    pub fn subscription_count(&self) -> usize {
        lock(&self.subscriptions).len()
    }

    /// Make subsequent writes fail.
    pub fn set_reject_sends(&self, on: bool) {
        self.reject_sends.store(on, Ordering::SeqCst);
    }

    /// Simulate the link going away underneath the session.
    pub fn sever(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    /// Build an inbound packet from serialized extension elements, decoding
    /// the ones the session's provider recognizes.
    pub fn inbound_packet(
        &self,
        kind: PacketKind,
        id: Option<&str>,
        extensions: &[&str],
    ) -> Result<Packet> {
        let mut parsed = Vec::with_capacity(extensions.len());
        for xml in extensions {
            let raw = parse_extension_xml(xml)?;
            let ext = if raw.matches(self.provider.element_name(), self.provider.namespace()) {
                match self.provider.parse_extension(&raw) {
                    Ok(ext) => PacketExtension::Gcm(ext),
                    Err(e) => PacketExtension::Malformed { raw, error: e.to_string() },
                }
            } else {
                PacketExtension::Unknown(raw)
            };
            parsed.push(ext);
        }
        Ok(Packet::new(kind, id.map(str::to_string), parsed))
    }

    /// Hand a packet to every matching subscription, one task each.
    pub fn dispatch(&self, packet: Packet) -> Vec<JoinHandle<()>> {
        let subs = lock(&self.subscriptions).clone();
        subs.into_iter()
            .filter(|s| s.matches(&packet))
            .map(|s| {
                let listener = s.listener();
                let packet = packet.clone();
                tokio::spawn(async move { listener.process_packet(packet).await })
            })
            .collect()
    }

    /// Inject a stanza and wait until every listener finished with it.
    pub async fn deliver(
        &self,
        kind: PacketKind,
        id: Option<&str>,
        extensions: &[&str],
    ) -> Result<()> {
        let packet = self.inbound_packet(kind, id, extensions)?;
        for handle in self.dispatch(packet) {
            handle
                .await
                .map_err(|e| BridgeError::Internal(format!("listener task failed: {e}")))?;
        }
        Ok(())
    }

    /// Shorthand for a message stanza carrying one `gcm` block with `json`.
    pub async fn deliver_json(&self, id: &str, json: &str) -> Result<()> {
        let ext = ccsbridge_core::protocol::extension::encode(json);
        self.deliver(PacketKind::Message, Some(id), &[ext.to_xml()]).await
    }
}

#[async_trait]
impl StreamConnection for LoopbackConnection {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn login(&self, username: &str, password: &str) -> Result<()> {
        lock(&self.logins).push(username.to_string());
        if !self.is_connected() {
            return Err(BridgeError::Unreachable("not connected".into()));
        }
        let accepted = self
            .credentials
            .get(username)
            .map(|p| p.value() == password)
            .unwrap_or(false);
        if !accepted {
            return Err(BridgeError::InvalidCredentials(format!(
                "SASL authentication failed for {username}"
            )));
        }
        if self.drop_after_login {
            self.sever();
        }
        Ok(())
    }

    async fn send_packet(&self, packet: Packet) -> Result<()> {
        if !self.is_connected() {
            return Err(BridgeError::SendFailure("connection closed".into()));
        }
        if self.reject_sends.load(Ordering::SeqCst) {
            return Err(BridgeError::SendFailure("write rejected".into()));
        }
        lock(&self.sent).push(packet);
        Ok(())
    }

    fn add_subscription(&self, sub: Subscription) {
        lock(&self.subscriptions).push(sub);
    }

    async fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
        lock(&self.subscriptions).clear();
    }
}

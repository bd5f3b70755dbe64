//! Inbound pipeline: extension -> envelope -> classify -> policy -> application.
//!
//! Each packet is handled on its own; a failure is logged with the packet id
//! and never escapes the listener.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures_util::{FutureExt, Stream};
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use ccsbridge_core::error::{BridgeError, Result};
use ccsbridge_core::protocol::classify::classify;
use ccsbridge_core::protocol::envelope::{MessageType, RequestEnvelope, ResponseEnvelope};
use ccsbridge_core::protocol::extension::{GCM_ELEMENT, GCM_NAMESPACE};

use crate::obs::BridgeMetrics;
use crate::policy::{AckPolicy, PolicyDecision};
use crate::session::ConnectionSession;
use crate::transport::{Packet, PacketExtension, PacketListener};

/// Application callback.
#[async_trait]
pub trait InboundHandler: Send + Sync {
    async fn on_message(&self, env: ResponseEnvelope) -> Result<()>;
}

// The connection owns its subscriptions, so the pipeline only holds a weak
// reference back to the session.
pub(crate) struct InboundPipeline {
    session: Weak<ConnectionSession>,
    policy: AckPolicy,
    handler: Arc<dyn InboundHandler>,
    metrics: Arc<BridgeMetrics>,
}

impl InboundPipeline {
    pub(crate) fn new(
        session: Weak<ConnectionSession>,
        policy: AckPolicy,
        handler: Arc<dyn InboundHandler>,
        metrics: Arc<BridgeMetrics>,
    ) -> Self {
        Self { session, policy, handler, metrics }
    }

    async fn handle(&self, packet: &Packet) -> Result<()> {
        let ext = match packet.find_extension(GCM_ELEMENT, GCM_NAMESPACE) {
            Some(PacketExtension::Gcm(ext)) => ext,
            Some(PacketExtension::Malformed { error, .. }) => {
                return Err(BridgeError::MalformedExtension(error.clone()));
            }
            Some(PacketExtension::Unknown(_)) | None => {
                self.metrics.dropped_packets.inc(&[("reason", "unsupported")]);
                warn!(
                    packet = %String::from_utf8_lossy(packet.to_xml()),
                    "dropping unsupported message"
                );
                return Ok(());
            }
        };

        let env = ResponseEnvelope::from_json(ext.json())?;
        if env.message_type() == MessageType::Control && env.ack_target().is_none() {
            self.metrics.dropped_packets.inc(&[("reason", "control")]);
            debug!(control_type = ?env.control_type, "dropping relay control message");
            return Ok(());
        }

        let class = classify(&env);
        self.metrics.inbound_messages.inc(&[("class", class.as_str())]);

        let decision = self.policy.decide(class);
        self.metrics.policy_decisions.inc(&[("decision", decision.as_str())]);

        match decision {
            PolicyDecision::Drop => {
                self.metrics.dropped_packets.inc(&[("reason", "receipt")]);
                debug!(
                    message_id = ?env.message_id(),
                    class = class.as_str(),
                    "dropping ack/nack message"
                );
                return Ok(());
            }
            PolicyDecision::AckThenForward => self.auto_ack(&env).await,
            PolicyDecision::Forward => {}
        }

        self.forward(env).await
    }

    /// Run the application callback. Errors and panics both surface as
    /// `ApplicationCallback`.
    async fn forward(&self, env: ResponseEnvelope) -> Result<()> {
        match AssertUnwindSafe(self.handler.on_message(env)).catch_unwind().await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e @ BridgeError::ApplicationCallback(_))) => Err(e),
            Ok(Err(other)) => Err(BridgeError::ApplicationCallback(other.to_string())),
            Err(panic) => Err(BridgeError::ApplicationCallback(format!(
                "handler panicked: {}",
                panic_message(&*panic)
            ))),
        }
    }

    async fn auto_ack(&self, env: &ResponseEnvelope) {
        let Some((to, message_id)) = env.ack_target() else {
            return;
        };
        let sent = match self.session.upgrade() {
            Some(session) => session.send(&RequestEnvelope::ack(to, message_id)).await,
            None => Err(BridgeError::SendFailure("session dropped".into())),
        };
        match sent {
            Ok(()) => {
                self.metrics.auto_acks.inc(&[("outcome", "ok")]);
            }
            Err(e) => {
                self.metrics.auto_acks.inc(&[("outcome", "error")]);
                warn!(to, message_id, error = %e, "auto-ack failed, delivering anyway");
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic payload>")
}

#[async_trait]
impl PacketListener for InboundPipeline {
    async fn process_packet(&self, packet: Packet) {
        let packet_id = packet.id().unwrap_or("-");
        debug!(packet_id, "received message");

        if let Err(e) = self.handle(&packet).await {
            self.metrics.inbound_failures.inc(&[("kind", e.kind().as_str())]);
            error!(
                packet_id,
                kind = e.kind().as_str(),
                error = %e,
                packet = %String::from_utf8_lossy(packet.to_xml()),
                "failed to handle inbound message"
            );
        }
    }
}

/// Forwards envelopes into an unbounded channel.
pub(crate) struct ChannelHandler {
    tx: mpsc::UnboundedSender<ResponseEnvelope>,
}

impl ChannelHandler {
    pub(crate) fn new(tx: mpsc::UnboundedSender<ResponseEnvelope>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl InboundHandler for ChannelHandler {
    async fn on_message(&self, env: ResponseEnvelope) -> Result<()> {
        self.tx
            .send(env)
            .map_err(|_| BridgeError::ApplicationCallback("inbound stream dropped".into()))
    }
}

/// Unbounded stream of accepted inbound envelopes.
pub struct InboundStream {
    rx: mpsc::UnboundedReceiver<ResponseEnvelope>,
}

impl InboundStream {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<ResponseEnvelope>) -> Self {
        Self { rx }
    }

    pub async fn recv(&mut self) -> Option<ResponseEnvelope> {
        self.rx.recv().await
    }

    /// Non-blocking poll; `None` when nothing is queued right now.
    pub fn try_recv(&mut self) -> Option<ResponseEnvelope> {
        self.rx.try_recv().ok()
    }
}

impl Stream for InboundStream {
    type Item = ResponseEnvelope;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;

use ccsbridge_core::error::Result;
use ccsbridge_core::protocol::envelope::{OutboundMessage, RequestEnvelope};

use crate::dispatch::inbound::{ChannelHandler, InboundHandler, InboundPipeline, InboundStream};
use crate::obs::BridgeMetrics;
use crate::policy::AckPolicy;
use crate::session::ConnectionSession;

/// Public operation surface of the streaming lane.
pub struct CcsDispatcher {
    session: Arc<ConnectionSession>,
    policy: AckPolicy,
    metrics: Arc<BridgeMetrics>,
}

impl CcsDispatcher {
    pub fn new(
        session: Arc<ConnectionSession>,
        policy: AckPolicy,
        metrics: Arc<BridgeMetrics>,
    ) -> Self {
        Self { session, policy, metrics }
    }

    pub fn session(&self) -> &Arc<ConnectionSession> {
        &self.session
    }

    pub fn policy(&self) -> AckPolicy {
        self.policy
    }

    /// Send a message to a device.
    ///
    /// Returns the message id used, generated when the caller gave none.
    /// Success means the transport took the write; the relay's ACK/NACK arrives
    /// later on the inbound path and correlating it is up to the caller.
    pub async fn dispatch_message(&self, msg: OutboundMessage) -> Result<String> {
        let env = msg.into_envelope();
        debug!(to = %env.to, message_id = %env.message_id, "dispatching message");
        self.session.send(&env).await?;
        Ok(env.message_id)
    }

    /// Acknowledge a message manually.
    pub async fn acknowledge_message(&self, to: &str, message_id: &str) -> Result<()> {
        self.session.send(&RequestEnvelope::ack(to, message_id)).await
    }

    /// Deliver inbound envelopes to `handler`, one call per accepted envelope.
    pub fn receive_with(&self, handler: Arc<dyn InboundHandler>) -> Result<()> {
        let pipeline = InboundPipeline::new(
            Arc::downgrade(&self.session),
            self.policy,
            handler,
            Arc::clone(&self.metrics),
        );
        self.session.subscribe(Arc::new(pipeline))
    }

    /// Inbound envelopes as a stream.
    ///
    /// The stream ends when the connection it was registered on goes away;
    /// call again after reconnecting.
    pub fn receive(&self) -> Result<InboundStream> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.receive_with(Arc::new(ChannelHandler::new(tx)))?;
        Ok(InboundStream::new(rx))
    }
}

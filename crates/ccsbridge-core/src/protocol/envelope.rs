//! Streaming-lane JSON envelopes.
//!
//! `RequestEnvelope` is what we send (application messages and acks);
//! `ResponseEnvelope` is what the relay delivers. Unset optional fields are
//! never serialized, so an ack carries only `to` and `message_id`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{BridgeError, Result};
use crate::protocol::classify::{classify, Classification};

/// Default storage time on the relay for offline devices (28 days).
pub const DEFAULT_TIME_TO_LIVE_SECS: u32 = 2_419_200;

/// Payload key/value pairs.
pub type Data = Map<String, Value>;

/// Fresh unique message id (UUID v4, hyphenated).
pub fn generate_message_id() -> String {
    Uuid::new_v4().to_string()
}

/// Outbound envelope (application message or acknowledgment).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    /// Destination registration id.
    pub to: String,
    pub message_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Data>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_while_idle: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_to_live: Option<u32>,
}

impl RequestEnvelope {
    /// Minimal acknowledgment envelope.
    pub fn ack(to: impl Into<String>, message_id: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            message_id: message_id.into(),
            data: None,
            delay_while_idle: None,
            time_to_live: None,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| BridgeError::Serialization(format!("request encode failed: {e}")))
    }
}

/// Builder for an outbound application message.
///
/// ```
/// use ccsbridge_core::protocol::envelope::OutboundMessage;
///
/// let env = OutboundMessage::new("device-1").time_to_live(60).into_envelope();
/// assert_eq!(env.to, "device-1");
/// assert!(!env.message_id.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    to: String,
    message_id: Option<String>,
    data: Option<Data>,
    delay_while_idle: bool,
    time_to_live: u32,
}

impl OutboundMessage {
    pub fn new(to: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            message_id: None,
            data: None,
            delay_while_idle: false,
            time_to_live: DEFAULT_TIME_TO_LIVE_SECS,
        }
    }

    /// Caller-supplied id. Blank ids are replaced by a generated one.
    pub fn message_id(mut self, id: impl Into<String>) -> Self {
        self.message_id = Some(id.into());
        self
    }

    pub fn data(mut self, data: Data) -> Self {
        self.data = Some(data);
        self
    }

    pub fn delay_while_idle(mut self, on: bool) -> Self {
        self.delay_while_idle = on;
        self
    }

    pub fn time_to_live(mut self, secs: u32) -> Self {
        self.time_to_live = secs;
        self
    }

    /// Resolve defaults: message id is always populated, empty data is dropped.
    pub fn into_envelope(self) -> RequestEnvelope {
        let message_id = match self.message_id {
            Some(id) if !id.trim().is_empty() => id,
            _ => generate_message_id(),
        };
        RequestEnvelope {
            to: self.to,
            message_id,
            data: self.data.filter(|d| !d.is_empty()),
            delay_while_idle: Some(self.delay_while_idle),
            time_to_live: Some(self.time_to_live),
        }
    }
}

/// `message_type` values sent by the relay. Absent means a data message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Data,
    Ack,
    Nack,
    Control,
    #[serde(other)]
    Unknown,
}

/// Inbound envelope delivered by the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Sender registration id (acknowledgment target for data messages).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message_type: Option<MessageType>,
    /// Error code (NACK).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Data>,
}

impl ResponseEnvelope {
    /// Decode and validate an inbound envelope.
    ///
    /// Data messages must name both the sender and the message id, since they
    /// are the acknowledgment target. Relay control messages carry neither.
    pub fn from_json(json: &str) -> Result<Self> {
        let env: ResponseEnvelope = serde_json::from_str(json)
            .map_err(|e| BridgeError::Serialization(format!("invalid response json: {e}")))?;
        let is_message = classify(&env) == Classification::Data
            && env.message_type() != MessageType::Control;
        if is_message && env.ack_target().is_none() {
            return Err(BridgeError::Serialization(
                "data message requires non-empty from and message_id".into(),
            ));
        }
        Ok(env)
    }

    /// Message type, `Data` when the relay sent none.
    pub fn message_type(&self) -> MessageType {
        self.message_type.unwrap_or(MessageType::Data)
    }

    /// Sender registration id.
    pub fn sender(&self) -> Option<&str> {
        self.from.as_deref()
    }

    pub fn message_id(&self) -> Option<&str> {
        self.message_id.as_deref()
    }

    /// `(from, message_id)` when both are present and non-empty.
    pub fn ack_target(&self) -> Option<(&str, &str)> {
        let from = self.sender().filter(|s| !s.is_empty())?;
        let id = self.message_id().filter(|s| !s.is_empty())?;
        Some((from, id))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn blank_message_id_is_replaced() {
        let env = OutboundMessage::new("d").message_id("   ").into_envelope();
        assert!(Uuid::parse_str(&env.message_id).is_ok());
    }

    #[test]
    fn explicit_message_id_is_kept_verbatim() {
        let env = OutboundMessage::new("d").message_id("m-7").into_envelope();
        assert_eq!(env.message_id, "m-7");
    }

    #[test]
    fn empty_data_is_omitted() {
        let env = OutboundMessage::new("d").data(Data::new()).into_envelope();
        let json = env.to_json().unwrap();
        assert!(!json.contains("\"data\""));
    }

    #[test]
    fn control_message_needs_no_sender() {
        let env = ResponseEnvelope::from_json(
            r#"{"message_type":"control","control_type":"CONNECTION_DRAINING"}"#,
        )
        .unwrap();
        assert_eq!(env.message_type(), MessageType::Control);
        assert_eq!(env.control_type.as_deref(), Some("CONNECTION_DRAINING"));
        assert!(env.ack_target().is_none());
    }

    #[test]
    fn unknown_message_type_is_preserved_as_unknown() {
        let env =
            ResponseEnvelope::from_json(r#"{"message_type":"receipt","from":"a","message_id":"1"}"#)
                .unwrap();
        assert_eq!(env.message_type(), MessageType::Unknown);
    }
}

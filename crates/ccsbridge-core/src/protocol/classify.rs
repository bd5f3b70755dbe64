//! Inbound message classification.

use crate::protocol::envelope::{MessageType, ResponseEnvelope};

/// Category driving the acknowledgment policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    Data,
    Ack,
    Nack,
}

impl Classification {
    pub fn as_str(self) -> &'static str {
        match self {
            Classification::Data => "data",
            Classification::Ack => "ack",
            Classification::Nack => "nack",
        }
    }

    /// Delivery receipt (ACK or NACK) rather than an application message.
    pub fn is_receipt(self) -> bool {
        matches!(self, Classification::Ack | Classification::Nack)
    }
}

/// Label an inbound envelope. Only `ack`/`nack` are receipts; everything else is data.
pub fn classify(env: &ResponseEnvelope) -> Classification {
    classify_type(env.message_type())
}

pub fn classify_type(message_type: MessageType) -> Classification {
    match message_type {
        MessageType::Ack => Classification::Ack,
        MessageType::Nack => Classification::Nack,
        MessageType::Data | MessageType::Control | MessageType::Unknown => Classification::Data,
    }
}

use ccsbridge_core::protocol::classify::Classification;

/// Decision from policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyDecision {
    /// Receipt nobody asked for.
    Drop,
    Forward,
    /// Send an ack to the sender first, then forward. Ack failure does not cancel the forward.
    AckThenForward,
}

impl PolicyDecision {
    pub fn as_str(self) -> &'static str {
        match self {
            PolicyDecision::Drop => "drop",
            PolicyDecision::Forward => "forward",
            PolicyDecision::AckThenForward => "ack_then_forward",
        }
    }
}

/// The two independent switches. Both default to off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AckPolicy {
    pub deliver_ack_nack: bool,
    pub auto_ack: bool,
}

impl AckPolicy {
    pub fn new(deliver_ack_nack: bool, auto_ack: bool) -> Self {
        Self { deliver_ack_nack, auto_ack }
    }

    pub fn decide(&self, class: Classification) -> PolicyDecision {
        match class {
            Classification::Ack | Classification::Nack => {
                if self.deliver_ack_nack {
                    PolicyDecision::Forward
                } else {
                    PolicyDecision::Drop
                }
            }
            Classification::Data => {
                if self.auto_ack {
                    PolicyDecision::AckThenForward
                } else {
                    PolicyDecision::Forward
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_table() {
        use Classification::*;
        use PolicyDecision::*;

        let cases = [
            (Ack, false, false, Drop),
            (Nack, false, true, Drop),
            (Ack, true, false, Forward),
            (Nack, true, true, Forward),
            (Data, false, true, AckThenForward),
            (Data, true, true, AckThenForward),
            (Data, false, false, Forward),
            (Data, true, false, Forward),
        ];
        for (class, deliver, auto, want) in cases {
            let got = AckPolicy::new(deliver, auto).decide(class);
            assert_eq!(got, want, "class={class:?} deliver={deliver} auto={auto}");
        }
    }
}

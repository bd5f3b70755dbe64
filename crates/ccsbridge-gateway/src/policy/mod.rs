//! Acknowledgment policy.
//!
//! Decides, per classified inbound envelope, whether it is dropped, forwarded
//! to the application, or acknowledged and then forwarded.

pub mod engine;

pub use engine::{AckPolicy, PolicyDecision};

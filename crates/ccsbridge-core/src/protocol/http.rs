//! HTTP-lane bodies: downstream send and notification-key management.

use serde::{Deserialize, Serialize};

use crate::protocol::envelope::{Data, DEFAULT_TIME_TO_LIVE_SECS};

/// Body of a send request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HttpSendRequest {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub registration_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_key_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collapse_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Data>,
    pub delay_while_idle: bool,
    pub time_to_live: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restricted_package_name: Option<String>,
    pub dry_run: bool,
}

/// Builder for an HTTP send.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpMessage {
    req: HttpSendRequest,
}

impl HttpMessage {
    pub fn new<I, S>(registration_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            req: HttpSendRequest {
                registration_ids: registration_ids.into_iter().map(Into::into).collect(),
                notification_key: None,
                notification_key_name: None,
                collapse_key: None,
                data: None,
                delay_while_idle: false,
                time_to_live: DEFAULT_TIME_TO_LIVE_SECS,
                restricted_package_name: None,
                dry_run: false,
            },
        }
    }

    pub fn notification_key(mut self, key: impl Into<String>) -> Self {
        self.req.notification_key = Some(key.into());
        self
    }

    pub fn notification_key_name(mut self, name: impl Into<String>) -> Self {
        self.req.notification_key_name = Some(name.into());
        self
    }

    pub fn collapse_key(mut self, key: impl Into<String>) -> Self {
        self.req.collapse_key = Some(key.into());
        self
    }

    /// Attached only when non-empty.
    pub fn data(mut self, data: Data) -> Self {
        self.req.data = Some(data).filter(|d| !d.is_empty());
        self
    }

    pub fn delay_while_idle(mut self, on: bool) -> Self {
        self.req.delay_while_idle = on;
        self
    }

    pub fn time_to_live(mut self, secs: u32) -> Self {
        self.req.time_to_live = secs;
        self
    }

    pub fn restricted_package_name(mut self, name: impl Into<String>) -> Self {
        self.req.restricted_package_name = Some(name.into());
        self
    }

    pub fn dry_run(mut self, on: bool) -> Self {
        self.req.dry_run = on;
        self
    }

    pub fn into_request(self) -> HttpSendRequest {
        self.req
    }
}

/// Per-recipient outcome.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HttpSendResult {
    #[serde(default)]
    pub message_id: Option<String>,
    /// Canonical registration id the caller should switch to.
    #[serde(default)]
    pub registration_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Response of a send request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HttpSendResponse {
    #[serde(default)]
    pub multicast_id: i64,
    #[serde(default)]
    pub success: u32,
    #[serde(default)]
    pub failure: u32,
    #[serde(default)]
    pub canonical_ids: u32,
    #[serde(default)]
    pub results: Vec<HttpSendResult>,
}

/// Notification-key operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationOperation {
    Create,
    Add,
    Remove,
}

/// Body of a notification-key request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationRequest {
    pub operation: NotificationOperation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_key: Option<String>,
    pub notification_key_name: String,
    pub registration_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NotificationResponse {
    pub notification_key: String,
}

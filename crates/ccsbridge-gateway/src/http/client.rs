use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use ccsbridge_core::error::{BridgeError, Result};
use ccsbridge_core::protocol::http::{
    HttpMessage, HttpSendResponse, NotificationOperation, NotificationRequest,
    NotificationResponse,
};

use crate::config::BridgeConfig;
use crate::http::transport::{HttpTransport, UreqTransport};

const STATUS_OK: u16 = 200;

/// Client for the relay's HTTP endpoints.
pub struct GcmHttpClient<T: HttpTransport = UreqTransport> {
    transport: T,
    api_key: String,
    project_id: Option<String>,
    send_uri: String,
    notification_uri: String,
}

impl GcmHttpClient<UreqTransport> {
    pub fn from_config(cfg: &BridgeConfig) -> Self {
        Self::new(
            UreqTransport::default(),
            cfg.api_key.clone(),
            Some(cfg.sender_id.clone()),
            cfg.http.send_uri.clone(),
            cfg.http.notification_uri.clone(),
        )
    }
}

impl<T: HttpTransport> GcmHttpClient<T> {
    pub fn new(
        transport: T,
        api_key: impl Into<String>,
        project_id: Option<String>,
        send_uri: impl Into<String>,
        notification_uri: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            api_key: api_key.into(),
            project_id: project_id.filter(|p| !p.trim().is_empty()),
            send_uri: send_uri.into(),
            notification_uri: notification_uri.into(),
        }
    }

    /// Send a message to registration ids and/or a notification key.
    pub fn send_message(&self, msg: HttpMessage) -> Result<HttpSendResponse> {
        self.post_json(&self.send_uri, &msg.into_request())
    }

    /// Create a notification key grouping `registration_ids`.
    pub fn create_notification_key(
        &self,
        name: &str,
        registration_ids: &[String],
    ) -> Result<String> {
        self.notification_action(NotificationOperation::Create, None, name, registration_ids)
    }

    pub fn add_notification_registrations(
        &self,
        key: &str,
        name: &str,
        registration_ids: &[String],
    ) -> Result<()> {
        self.notification_action(NotificationOperation::Add, Some(key), name, registration_ids)
            .map(|_| ())
    }

    pub fn remove_notification_registrations(
        &self,
        key: &str,
        name: &str,
        registration_ids: &[String],
    ) -> Result<()> {
        self.notification_action(NotificationOperation::Remove, Some(key), name, registration_ids)
            .map(|_| ())
    }

    fn notification_action(
        &self,
        operation: NotificationOperation,
        key: Option<&str>,
        name: &str,
        registration_ids: &[String],
    ) -> Result<String> {
        let req = NotificationRequest {
            operation,
            notification_key: key.map(str::to_string),
            notification_key_name: name.to_string(),
            registration_ids: registration_ids.to_vec(),
        };
        let resp: NotificationResponse = self.post_json(&self.notification_uri, &req)?;
        Ok(resp.notification_key)
    }

    fn post_json<Req, Resp>(&self, uri: &str, req: &Req) -> Result<Resp>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let body = serde_json::to_string(req)
            .map_err(|e| BridgeError::Serialization(format!("request encode failed: {e}")))?;

        let mut headers = vec![
            ("Content-Type", "application/json".to_string()),
            ("Authorization", format!("key={}", self.api_key)),
        ];
        if let Some(project_id) = &self.project_id {
            headers.push(("project_id", project_id.clone()));
        }

        debug!(uri, "posting json");
        let resp = self.transport.post_json(uri, &body, &headers)?;
        if resp.status != STATUS_OK {
            return Err(BridgeError::HttpStatus { status: resp.status, body: resp.body });
        }

        serde_json::from_str(&resp.body).map_err(|e| {
            BridgeError::Serialization(format!(
                "failed to deserialize response from {uri}: {e}; body: {}",
                resp.body
            ))
        })
    }
}

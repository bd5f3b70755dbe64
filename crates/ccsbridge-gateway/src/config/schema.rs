use std::fmt;

use serde::Deserialize;
use ccsbridge_core::error::{BridgeError, Result};

use crate::policy::AckPolicy;

pub const DEFAULT_RELAY_HOST: &str = "gcm.googleapis.com";
pub const DEFAULT_RELAY_PORT: u16 = 5235;
pub const DEFAULT_SEND_URI: &str = "https://android.googleapis.com/gcm/send";
pub const DEFAULT_NOTIFICATION_URI: &str = "https://android.googleapis.com/gcm/notification";

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BridgeConfig {
    pub version: u32,

    /// Project id (aka sender id).
    pub sender_id: String,

    pub api_key: String,

    #[serde(default)]
    pub ccs: CcsSection,

    #[serde(default)]
    pub http: HttpSection,
}

impl BridgeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(BridgeError::UnsupportedVersion);
        }
        if self.sender_id.trim().is_empty() {
            return Err(BridgeError::BadConfig("sender_id must not be empty".into()));
        }
        if self.api_key.trim().is_empty() {
            return Err(BridgeError::BadConfig("api_key must not be empty".into()));
        }

        self.ccs.validate()?;
        self.http.validate()?;

        Ok(())
    }
}

// api_key stays out of logs.
impl fmt::Debug for BridgeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeConfig")
            .field("version", &self.version)
            .field("sender_id", &self.sender_id)
            .field("api_key", &"<redacted>")
            .field("ccs", &self.ccs)
            .field("http", &self.http)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CcsSection {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Forward ACK/NACK receipts to the application instead of dropping them.
    #[serde(default)]
    pub deliver_ack_nack: bool,

    /// Acknowledge inbound data messages automatically.
    #[serde(default)]
    pub auto_ack: bool,
}

impl Default for CcsSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            deliver_ack_nack: false,
            auto_ack: false,
        }
    }
}

impl CcsSection {
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(BridgeError::BadConfig("ccs.host must not be empty".into()));
        }
        if self.port == 0 {
            return Err(BridgeError::BadConfig("ccs.port must be between 1 and 65535".into()));
        }
        Ok(())
    }

    pub fn policy(&self) -> AckPolicy {
        AckPolicy::new(self.deliver_ack_nack, self.auto_ack)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpSection {
    #[serde(default = "default_send_uri")]
    pub send_uri: String,

    #[serde(default = "default_notification_uri")]
    pub notification_uri: String,
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            send_uri: default_send_uri(),
            notification_uri: default_notification_uri(),
        }
    }
}

impl HttpSection {
    pub fn validate(&self) -> Result<()> {
        let uris = [
            ("http.send_uri", &self.send_uri),
            ("http.notification_uri", &self.notification_uri),
        ];
        for (name, uri) in uris {
            if !(uri.starts_with("https://") || uri.starts_with("http://")) {
                return Err(BridgeError::BadConfig(format!("{name} must be an http(s) uri")));
            }
        }
        Ok(())
    }
}

fn default_host() -> String {
    DEFAULT_RELAY_HOST.into()
}
fn default_port() -> u16 {
    DEFAULT_RELAY_PORT
}
fn default_send_uri() -> String {
    DEFAULT_SEND_URI.into()
}
fn default_notification_uri() -> String {
    DEFAULT_NOTIFICATION_URI.into()
}

use std::time::Duration;

use ccsbridge_core::error::{BridgeError, Result};

/// Status and body of a completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Blocking JSON POST. Non-2xx statuses are returned, not raised; the client
/// decides what counts as success.
pub trait HttpTransport: Send + Sync {
    fn post_json(&self, uri: &str, body: &str, headers: &[(&str, String)]) -> Result<HttpResponse>;
}

pub struct UreqTransport {
    agent: ureq::Agent,
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }
}

impl HttpTransport for UreqTransport {
    fn post_json(&self, uri: &str, body: &str, headers: &[(&str, String)]) -> Result<HttpResponse> {
        let mut req = self.agent.post(uri);
        for (name, value) in headers {
            req = req.set(name, value);
        }

        match req.send_string(body) {
            Ok(resp) => {
                let status = resp.status();
                let body = resp
                    .into_string()
                    .map_err(|e| BridgeError::Http(format!("read body failed: {e}")))?;
                Ok(HttpResponse { status, body })
            }
            Err(ureq::Error::Status(status, resp)) => Ok(HttpResponse {
                status,
                body: resp.into_string().unwrap_or_default(),
            }),
            Err(e) => Err(BridgeError::Http(format!("POST {uri} failed: {e}"))),
        }
    }
}

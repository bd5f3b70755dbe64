//! Shared bridge state: config, session, dispatcher, HTTP client, metrics.
//!
//! Built once from a validated config plus the streaming connector to use;
//! cheap to clone and share across tasks.

use std::sync::Arc;

use ccsbridge_core::error::Result;

use crate::config::BridgeConfig;
use crate::dispatch::CcsDispatcher;
use crate::http::GcmHttpClient;
use crate::obs::BridgeMetrics;
use crate::session::ConnectionSession;
use crate::transport::StreamConnector;

#[derive(Clone)]
pub struct BridgeState {
    inner: Arc<BridgeStateInner>,
}

struct BridgeStateInner {
    cfg: BridgeConfig,
    session: Arc<ConnectionSession>,
    dispatcher: CcsDispatcher,
    http: GcmHttpClient,
    metrics: Arc<BridgeMetrics>,
}

impl BridgeState {
    /// Build bridge state. Re-validates the config so hand-built configs get
    /// the same checks as loaded ones.
    pub fn new(cfg: BridgeConfig, connector: Arc<dyn StreamConnector>) -> Result<Self> {
        cfg.validate()?;

        let metrics = Arc::new(BridgeMetrics::default());
        let session = Arc::new(ConnectionSession::from_config(
            &cfg,
            connector,
            Arc::clone(&metrics),
        ));
        let dispatcher =
            CcsDispatcher::new(Arc::clone(&session), cfg.ccs.policy(), Arc::clone(&metrics));
        let http = GcmHttpClient::from_config(&cfg);

        Ok(Self {
            inner: Arc::new(BridgeStateInner { cfg, session, dispatcher, http, metrics }),
        })
    }

    pub fn cfg(&self) -> &BridgeConfig {
        &self.inner.cfg
    }

    /// Connect the streaming session with the configured sender id.
    pub async fn connect(&self) -> Result<()> {
        self.inner.session.connect(&self.inner.cfg.sender_id).await
    }

    pub fn session(&self) -> Arc<ConnectionSession> {
        Arc::clone(&self.inner.session)
    }

    pub fn dispatcher(&self) -> &CcsDispatcher {
        &self.inner.dispatcher
    }

    pub fn http(&self) -> &GcmHttpClient {
        &self.inner.http
    }

    pub fn metrics(&self) -> Arc<BridgeMetrics> {
        Arc::clone(&self.inner.metrics)
    }
}

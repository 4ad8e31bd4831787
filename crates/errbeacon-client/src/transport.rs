//! HTTP transport
//!
//! Posts rendered event documents to the ingest endpoint derived from the
//! DSN. One delivery attempt per event, bounded by a short timeout; retry
//! policy is deliberately absent since reports are best-effort.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use errbeacon_core::ports::{DeliveryResponse, Transport};

use crate::dsn::Dsn;

const SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Transport backed by a shared [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    store_url: String,
    auth_header: String,
}

impl HttpTransport {
    pub fn new(dsn: &Dsn) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(SEND_TIMEOUT).build()?;
        Ok(HttpTransport {
            client,
            store_url: dsn.store_url(),
            auth_header: dsn.auth_header(),
        })
    }

    /// Points the transport at an explicit URL. Used by tests to target a
    /// local mock server.
    pub fn with_endpoint(store_url: impl Into<String>, auth_header: impl Into<String>) -> Self {
        HttpTransport {
            client: reqwest::Client::new(),
            store_url: store_url.into(),
            auth_header: auth_header.into(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, event: &Value) -> anyhow::Result<DeliveryResponse> {
        debug!(url = %self.store_url, "delivering event");
        let response = self
            .client
            .post(&self.store_url)
            .header("X-Sentry-Auth", &self.auth_header)
            .json(event)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Ok(DeliveryResponse { status, body })
    }
}

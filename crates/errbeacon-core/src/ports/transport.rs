//! Delivery transport port

use async_trait::async_trait;
use serde_json::Value;

/// Outcome of a delivery attempt that reached the remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryResponse {
    pub status: u16,
    pub body: String,
}

impl DeliveryResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends rendered event documents to the remote ingest endpoint.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, event: &Value) -> anyhow::Result<DeliveryResponse>;
}

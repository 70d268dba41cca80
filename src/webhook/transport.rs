//! Delivery transport trait and HTTP implementation

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::WebhookConfig;

/// Delivery-specific error type
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Webhook request failed: {0}")]
    Request(String),

    #[error("Webhook returned status {0}")]
    Status(u16),

    #[error("Delivery cancelled by shutdown")]
    Cancelled,
}

/// Result type for delivery operations
pub type DeliveryResult<T> = Result<T, DeliveryError>;

/// A one-shot delivery of a JSON payload to a URL.
///
/// The dispatcher retries around this seam, so implementations report every
/// failure and never retry internally.
#[async_trait]
pub trait DeliveryTransport: Send + Sync {
    async fn send(&self, url: &str, payload: &serde_json::Value) -> DeliveryResult<()>;
}

/// HTTP POST transport
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &WebhookConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { client }
    }
}

#[async_trait]
impl DeliveryTransport for HttpTransport {
    async fn send(&self, url: &str, payload: &serde_json::Value) -> DeliveryResult<()> {
        let response = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| DeliveryError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Status(status.as_u16()));
        }

        Ok(())
    }
}

//! Retry-aware webhook dispatcher

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;

use crate::retry::{Retrier, RetryError, RetryPolicy};

use super::transport::{DeliveryError, DeliveryResult, DeliveryTransport};

/// Statistics for the webhook dispatcher
#[derive(Debug, Default)]
pub struct DeliveryStats {
    /// Deliveries started
    pub attempted: AtomicU64,
    /// Deliveries that ended in success
    pub delivered: AtomicU64,
    /// Extra attempts spent beyond each delivery's first
    pub retried: AtomicU64,
    /// Deliveries that exhausted their retries
    pub failed: AtomicU64,
    /// Deliveries halted by shutdown
    pub cancelled: AtomicU64,
}

/// Snapshot of delivery statistics for API responses
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryStatsSnapshot {
    pub attempted: u64,
    pub delivered: u64,
    pub retried: u64,
    pub failed: u64,
    pub cancelled: u64,
}

/// Outcome of a successful delivery
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryReceipt {
    /// Attempts spent, including the successful one
    pub attempts: u32,
}

/// Delivers JSON payloads to webhook URLs, retrying failures with
/// exponential backoff.
///
/// Each delivery subscribes to the dispatcher's shutdown channel, so an
/// in-flight backoff wait aborts when the service shuts down.
pub struct WebhookDispatcher {
    transport: Arc<dyn DeliveryTransport>,
    policy: RetryPolicy,
    shutdown: broadcast::Sender<()>,
    stats: DeliveryStats,
}

impl WebhookDispatcher {
    pub fn new(transport: Arc<dyn DeliveryTransport>, policy: RetryPolicy) -> Self {
        let (shutdown, _) = broadcast::channel(1);
        Self {
            transport,
            policy,
            shutdown,
            stats: DeliveryStats::default(),
        }
    }

    /// Sender half of the shutdown channel; firing it aborts pending waits
    pub fn shutdown_signal(&self) -> broadcast::Sender<()> {
        self.shutdown.clone()
    }

    /// Deliver `payload` to `url`, retrying per the configured policy.
    ///
    /// Exhaustion surfaces the final transport error unchanged; shutdown
    /// surfaces `DeliveryError::Cancelled`.
    pub async fn deliver(
        &self,
        url: &str,
        payload: &serde_json::Value,
    ) -> DeliveryResult<DeliveryReceipt> {
        self.stats.attempted.fetch_add(1, Ordering::Relaxed);

        let attempts = Arc::new(AtomicU32::new(0));
        let mut retrier = Retrier::with_cancel(self.policy.clone(), self.shutdown.subscribe());

        let transport = self.transport.clone();
        let counter = attempts.clone();
        let result = retrier
            .run("webhook_delivery", move || {
                let transport = transport.clone();
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::Relaxed);
                    transport.send(url, payload).await
                }
            })
            .await;

        let attempts = attempts.load(Ordering::Relaxed);
        self.stats
            .retried
            .fetch_add(attempts.saturating_sub(1) as u64, Ordering::Relaxed);

        match result {
            Ok(()) => {
                self.stats.delivered.fetch_add(1, Ordering::Relaxed);
                tracing::info!(url = url, attempts = attempts, "Webhook delivered");
                Ok(DeliveryReceipt { attempts })
            }
            Err(RetryError::Exhausted(e)) => {
                self.stats.failed.fetch_add(1, Ordering::Relaxed);
                Err(e)
            }
            Err(RetryError::Cancelled) => {
                self.stats.cancelled.fetch_add(1, Ordering::Relaxed);
                Err(DeliveryError::Cancelled)
            }
        }
    }

    pub fn stats(&self) -> DeliveryStatsSnapshot {
        DeliveryStatsSnapshot {
            attempted: self.stats.attempted.load(Ordering::Relaxed),
            delivered: self.stats.delivered.load(Ordering::Relaxed),
            retried: self.stats.retried.load(Ordering::Relaxed),
            failed: self.stats.failed.load(Ordering::Relaxed),
            cancelled: self.stats.cancelled.load(Ordering::Relaxed),
        }
    }
}

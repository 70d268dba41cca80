//! Webhook delivery.
//!
//! Rendered messages go out as JSON POSTs through a `DeliveryTransport`;
//! the dispatcher wraps each send in the retry orchestrator and keeps
//! delivery counters for the stats endpoint.

mod dispatcher;
mod transport;

pub use dispatcher::{DeliveryReceipt, DeliveryStatsSnapshot, WebhookDispatcher};
pub use transport::{DeliveryError, DeliveryResult, DeliveryTransport, HttpTransport};

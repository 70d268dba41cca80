use std::sync::Arc;
use std::time::Instant;

use crate::config::Settings;
use crate::template::{create_template_store, TemplateStore};
use crate::webhook::{DeliveryTransport, HttpTransport, WebhookDispatcher};

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub template_store: Arc<TemplateStore>,
    pub dispatcher: Arc<WebhookDispatcher>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let transport = Arc::new(HttpTransport::new(&settings.webhook));
        Self::with_transport(settings, transport)
    }

    /// Build state around a custom delivery transport (used by tests)
    pub fn with_transport(settings: Settings, transport: Arc<dyn DeliveryTransport>) -> Self {
        let template_store = create_template_store();
        let dispatcher = Arc::new(WebhookDispatcher::new(transport, settings.retry.clone()));

        Self {
            settings: Arc::new(settings),
            template_store,
            dispatcher,
            start_time: Instant::now(),
        }
    }
}

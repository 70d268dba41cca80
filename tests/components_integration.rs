//! Cross-component integration tests
//!
//! These tests verify interactions between multiple system components
//! without requiring actual server startup: template storage feeding the
//! rendering engine, and rendered messages flowing through the retry-aware
//! webhook dispatcher.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Mutex;

use message_template_service::config::{ServerConfig, Settings, WebhookConfig};
use message_template_service::retry::RetryPolicy;
use message_template_service::server::AppState;
use message_template_service::template::{CreateTemplateRequest, Template, TemplateStore};
use message_template_service::webhook::{
    DeliveryError, DeliveryResult, DeliveryTransport, WebhookDispatcher,
};

fn create_template(store: &TemplateStore, id: &str, content: &str) -> Template {
    let request = CreateTemplateRequest {
        id: id.to_string(),
        name: format!("Template {}", id),
        content: content.to_string(),
        description: None,
    };
    store.create(request.into()).unwrap()
}

fn variables(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
    match value {
        serde_json::Value::Object(map) => map,
        _ => unreachable!("test variables must be an object"),
    }
}

/// Transport that records payloads and fails a scripted number of times
struct RecordingTransport {
    failures_remaining: AtomicU32,
    payloads: Mutex<Vec<(String, serde_json::Value)>>,
}

impl RecordingTransport {
    fn new(failures: u32) -> Self {
        Self {
            failures_remaining: AtomicU32::new(failures),
            payloads: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl DeliveryTransport for RecordingTransport {
    async fn send(&self, url: &str, payload: &serde_json::Value) -> DeliveryResult<()> {
        let remaining = self.failures_remaining.load(Ordering::Relaxed);
        if remaining > 0 {
            self.failures_remaining.store(remaining - 1, Ordering::Relaxed);
            return Err(DeliveryError::Status(503));
        }

        self.payloads
            .lock()
            .await
            .push((url.to_string(), payload.clone()));
        Ok(())
    }
}

fn fast_policy(max_retries: u32) -> RetryPolicy {
    RetryPolicy {
        max_retries,
        base_delay_ms: 20,
        max_delay_ms: 100,
    }
}

// =============================================================================
// Store + engine integration
// =============================================================================

#[test]
fn store_derives_and_tracks_variables_across_updates() {
    let store = TemplateStore::new();

    let created = create_template(&store, "boas-vindas", "Oi {{nome}}, bem-vindo!");
    assert_eq!(created.variables, vec!["nome"]);

    let updated = store
        .update(
            "boas-vindas",
            message_template_service::template::UpdateTemplateRequest {
                name: None,
                content: Some("Oi {{nome}}, seu codigo: {{codigo}}".to_string()),
                description: None,
            },
        )
        .unwrap();
    assert_eq!(updated.variables, vec!["nome", "codigo"]);

    let rendered = store
        .render(
            "boas-vindas",
            &variables(json!({"nome": "Ana", "codigo": "1234"})),
        )
        .unwrap();
    assert_eq!(rendered.content, "Oi Ana, seu codigo: 1234");
}

#[test]
fn render_leaves_missing_keys_intact_end_to_end() {
    let store = TemplateStore::new();
    create_template(&store, "parcial", "Oi {{nome}}, pedido {{pedido}}");

    let rendered = store
        .render("parcial", &variables(json!({"nome": "Ana"})))
        .unwrap();
    assert_eq!(rendered.content, "Oi Ana, pedido {{pedido}}");
}

#[test]
fn soft_delete_lifecycle() {
    let store = TemplateStore::new();
    create_template(&store, "efemero", "texto");

    store.delete("efemero").unwrap();
    assert!(store.render("efemero", &serde_json::Map::new()).is_err());

    store.restore("efemero").unwrap();
    assert!(store.render("efemero", &serde_json::Map::new()).is_ok());
}

// =============================================================================
// Rendered message -> dispatcher integration
// =============================================================================

#[tokio::test]
async fn rendered_message_is_delivered_after_retries() {
    let store = TemplateStore::new();
    create_template(&store, "pedido-enviado", "Pedido {{pedido}} enviado");

    let transport = Arc::new(RecordingTransport::new(2));
    let dispatcher = WebhookDispatcher::new(transport.clone(), fast_policy(3));

    let rendered = store
        .render("pedido-enviado", &variables(json!({"pedido": "ORD-9"})))
        .unwrap();
    let payload = json!({
        "template_id": rendered.template_id,
        "content": rendered.content,
    });

    let start = Instant::now();
    let receipt = dispatcher
        .deliver("http://example.test/hook", &payload)
        .await
        .unwrap();

    // Two failures, then success: waits of 20ms and 40ms
    assert_eq!(receipt.attempts, 3);
    assert!(start.elapsed() >= Duration::from_millis(60));

    let payloads = transport.payloads.lock().await;
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0].0, "http://example.test/hook");
    assert_eq!(payloads[0].1["content"], "Pedido ORD-9 enviado");

    let stats = dispatcher.stats();
    assert_eq!(stats.attempted, 1);
    assert_eq!(stats.delivered, 1);
    assert_eq!(stats.retried, 2);
}

#[tokio::test]
async fn exhausted_delivery_reports_transport_error() {
    let transport = Arc::new(RecordingTransport::new(u32::MAX));
    let dispatcher = WebhookDispatcher::new(transport, fast_policy(2));

    let result = dispatcher
        .deliver("http://example.test/hook", &json!({"content": "oi"}))
        .await;

    assert!(matches!(result, Err(DeliveryError::Status(503))));

    let stats = dispatcher.stats();
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.delivered, 0);
    // max_retries = 2 means 3 attempts, 2 of them retries
    assert_eq!(stats.retried, 2);
}

#[tokio::test]
async fn app_state_wires_store_and_dispatcher() {
    let settings = Settings {
        server: ServerConfig::default(),
        retry: fast_policy(3),
        webhook: WebhookConfig::default(),
    };
    let transport = Arc::new(RecordingTransport::new(1));
    let state = AppState::with_transport(settings, transport.clone());

    create_template(&state.template_store, "aviso", "Aviso para {{nome}}");

    let rendered = state
        .template_store
        .render("aviso", &variables(json!({"nome": "Ana"})))
        .unwrap();
    let payload = json!({
        "template_id": rendered.template_id,
        "content": rendered.content,
    });

    let receipt = state
        .dispatcher
        .deliver("http://example.test/hook", &payload)
        .await
        .unwrap();
    assert_eq!(receipt.attempts, 2);

    let payloads = transport.payloads.lock().await;
    assert_eq!(payloads[0].1["content"], "Aviso para Ana");
}

#[tokio::test]
async fn shutdown_cancels_inflight_delivery() {
    let transport = Arc::new(RecordingTransport::new(u32::MAX));
    let policy = RetryPolicy {
        max_retries: 5,
        base_delay_ms: 5_000,
        max_delay_ms: 30_000,
    };
    let dispatcher = Arc::new(WebhookDispatcher::new(transport, policy));
    let shutdown = dispatcher.shutdown_signal();

    let worker = dispatcher.clone();
    let handle = tokio::spawn(async move {
        worker
            .deliver("http://example.test/hook", &json!({"content": "oi"}))
            .await
    });

    // First attempt fails fast, then the dispatcher sits in its backoff wait
    tokio::time::sleep(Duration::from_millis(50)).await;
    shutdown.send(()).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("shutdown should end the delivery promptly")
        .expect("task should not panic");

    assert!(matches!(result, Err(DeliveryError::Cancelled)));
    assert_eq!(dispatcher.stats().cancelled, 1);
}

//! Dashboard API served over a session talking to a live backend.

use super::common::{monitor_config, start_session, wait_until, PlantBackend};
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use cgh_common::{MonitorConfig, Registry};
use cgh_web_ui::WebUiServer;
use serde_json::Value;
use std::time::Duration;
use tower::ServiceExt;

struct Stack {
    backend: PlantBackend,
    server: WebUiServer,
}

impl Stack {
    async fn start(interval: Duration, auto_start: bool) -> Self {
        let backend = PlantBackend::start().await;
        let config = monitor_config(&backend, interval, auto_start);
        let session = start_session(&config, Registry::builtin(), config.selection.clone());
        let server = WebUiServer::new(session, &config).unwrap();
        Self { backend, server }
    }
}

async fn call(app: &Router, method: &str, uri: &str) -> (StatusCode, String) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

async fn call_json(app: &Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let (status, body) = call(app, method, uri).await;
    (status, serde_json::from_str(&body).unwrap())
}

fn entry<'a>(view: &'a Value, panel: &str, name: &str) -> &'a Value {
    view["panels"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["title"] == panel)
        .and_then(|p| p["entries"].as_array())
        .and_then(|entries| entries.iter().find(|e| e["name"] == name))
        .unwrap()
}

#[tokio::test]
async fn test_refresh_reflects_backend_values() {
    let stack = Stack::start(Duration::from_secs(5), false).await;
    let app = stack.server.router();

    let (_, view) = call_json(&app, "GET", "/api/state").await;
    assert_eq!(view["initial_load"], true);
    assert_eq!(view["plant"], "CGH Aparecida");
    assert_eq!(view["selection"], "CGH Aparecida - UG-01 (principal)");

    let (status, view) = call_json(&app, "POST", "/api/refresh").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["plant_status"], "Normal");
    assert_eq!(entry(&view, "Temperaturas", "MED_750450_AR1_RTD1")["display"], "48.30");

    stack.backend.set_value("UHLM_PressaoOleo", 90.0);
    let (_, view) = call_json(&app, "POST", "/api/refresh").await;
    assert_eq!(view["plant_status"], "Attention");

    stack.backend.set_value("MED_750450_AR1_RTD1", 92.0);
    let (_, view) = call_json(&app, "POST", "/api/refresh").await;
    assert_eq!(view["plant_status"], "Alert");
    let rtd1 = entry(&view, "Temperaturas", "MED_750450_AR1_RTD1");
    assert_eq!(rtd1["display"], "92.00");
    assert_eq!(rtd1["status"], "critical");

    assert_eq!(stack.backend.requests(), 3);
}

#[tokio::test]
async fn test_outage_is_reported_without_losing_panels() {
    let stack = Stack::start(Duration::from_secs(5), false).await;
    let app = stack.server.router();
    let (_, first) = call_json(&app, "POST", "/api/refresh").await;

    stack.backend.set_offline(true);
    let (status, view) = call_json(&app, "POST", "/api/refresh").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["error"]["kind"], "protocol");
    assert_eq!(view["error"]["status"], 503);
    assert_eq!(view["panels"], first["panels"]);
    assert_eq!(view["last_update"], first["last_update"]);
}

#[tokio::test]
async fn test_pause_and_resume_over_http() {
    let stack = Stack::start(Duration::from_millis(100), true).await;
    let app = stack.server.router();
    assert!(wait_until(Duration::from_secs(5), || stack.backend.requests() >= 2).await);

    let (status, body) = call_json(&app, "POST", "/api/polling/stop").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["active"], false);

    let (_, view) = call_json(&app, "GET", "/api/state").await;
    assert_eq!(view["active"], false);
    assert!(view["last_update"].is_string());

    tokio::time::sleep(Duration::from_millis(300)).await;
    let paused_at = stack.backend.requests();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(stack.backend.requests(), paused_at);

    let (_, body) = call_json(&app, "POST", "/api/polling/start").await;
    assert_eq!(body["active"], true);
    assert_eq!(body["interval_ms"], 100);
    assert!(wait_until(Duration::from_secs(5), || stack.backend.requests() > paused_at).await);
}

#[tokio::test]
async fn test_metrics_track_live_fetches() {
    let stack = Stack::start(Duration::from_secs(5), false).await;
    let metrics = stack.server.metrics();
    let _bridge = stack.server.spawn_bridge();
    let app = stack.server.router();

    call_json(&app, "POST", "/api/refresh").await;
    stack.backend.set_offline(true);
    call_json(&app, "POST", "/api/refresh").await;

    assert!(
        wait_until(Duration::from_secs(2), || {
            metrics.fetch_failures_total.with_label_values(&["protocol"]).get() == 1
        })
        .await
    );

    let (status, text) = call(&app, "GET", "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(text.contains("cgh_fetches_total 1"));
    assert!(text.contains("cgh_fetch_failures_total{kind=\"protocol\"} 1"));
    assert!(text.contains("MED_750450_AR1_RTD1"));
}

#[tokio::test]
async fn test_dashboard_page_served() {
    let stack = Stack::start(Duration::from_secs(5), false).await;
    let (status, html) = call(&stack.server.router(), "GET", "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("CGH Monitor"));
}

#[test]
fn test_default_config_targets_builtin_controller() {
    let config = MonitorConfig::default();
    let registry = Registry::builtin();
    assert!(registry.resolve_selection(&config.selection).is_ok());
}

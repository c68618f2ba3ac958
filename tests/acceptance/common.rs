//! Common utilities for acceptance tests.
//!
//! Provides:
//! - `PlantBackend`: an HTTP backend double that answers with a value for
//!   every register named in the request, like the real gateway does
//! - Helpers to build configurations and sessions against it

#![allow(dead_code)]

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use cgh_common::{MonitorConfig, PollingConfig, Registry, Selection};
use cgh_poller::{HttpFetcher, PollingSession};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

#[derive(Default)]
struct BackendState {
    values: Mutex<BTreeMap<String, f64>>,
    offline: AtomicBool,
    requests: AtomicUsize,
    last_request: Mutex<Option<Value>>,
}

/// Backend double serving `POST /readclp`.
pub struct PlantBackend {
    addr: SocketAddr,
    state: Arc<BackendState>,
    handle: JoinHandle<()>,
}

impl PlantBackend {
    /// Start on an ephemeral port with typical UG-01 readings.
    pub async fn start() -> Self {
        let state = Arc::new(BackendState::default());
        *state.values.lock().unwrap() = typical_readings();

        let app = Router::new()
            .route("/readclp", post(read_registers))
            .with_state(Arc::clone(&state));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    /// Read endpoint URL.
    pub fn url(&self) -> String {
        format!("http://{}/readclp", self.addr)
    }

    /// Set one register value.
    pub fn set_value(&self, name: &str, value: f64) {
        self.state
            .values
            .lock()
            .unwrap()
            .insert(name.to_string(), value);
    }

    /// Answer 503 to every request while offline.
    pub fn set_offline(&self, offline: bool) {
        self.state.offline.store(offline, Ordering::SeqCst);
    }

    /// Requests received so far.
    pub fn requests(&self) -> usize {
        self.state.requests.load(Ordering::SeqCst)
    }

    /// Body of the most recent request.
    pub fn last_request(&self) -> Option<Value> {
        self.state.last_request.lock().unwrap().clone()
    }
}

impl Drop for PlantBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Values of a unit running normally.
pub fn typical_readings() -> BTreeMap<String, f64> {
    [
        ("UHLM_PressaoOleo", 128.0),
        ("UHLM_VazaoOleo", 12.4),
        ("UHRV_PressaoOleo", 131.5),
        ("Turbina_MontanteBorboleta", 18.2),
        ("Turbina_PosicaoDistribuidor", 71.25),
        ("Gerador_FaseAB", 6612.4),
        ("Gerador_FaseBC", 6608.9),
        ("Gerador_FaseCA", 6615.0),
        ("MED_750450_AR1_RTD1", 48.3),
        ("MED_750450_AR1_RTD2", 51.0),
        ("QCC_NivelMontante_Grade", 404.2),
        ("QCC_NivelJusante_Grade", 398.7),
        ("Turbina_Velocidade", 514.0),
    ]
    .into_iter()
    .map(|(name, value)| (name.to_string(), value))
    .collect()
}

async fn read_registers(
    State(state): State<Arc<BackendState>>,
    Json(body): Json<Value>,
) -> Response {
    state.requests.fetch_add(1, Ordering::SeqCst);
    *state.last_request.lock().unwrap() = Some(body.clone());

    if state.offline.load(Ordering::SeqCst) {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }

    let values = state.values.lock().unwrap().clone();
    let mut response = Map::new();
    for group in ["REAL", "INT", "DINT", "TIME"] {
        let mut readings = Map::new();
        let requested = body["leituras"][group].as_array().cloned().unwrap_or_default();
        for read in requested {
            if let Some(name) = read["nome"].as_str() {
                let value = values.get(name).map_or(Value::Null, |v| Value::from(*v));
                readings.insert(name.to_string(), value);
            }
        }
        response.insert(group.to_string(), Value::Object(readings));
    }
    Json(Value::Object(response)).into_response()
}

/// Configuration pointing at `backend`.
pub fn monitor_config(backend: &PlantBackend, interval: Duration, auto_start: bool) -> MonitorConfig {
    let mut config = MonitorConfig::default();
    config.backend.url = backend.url();
    config.backend.timeout = Duration::from_secs(2);
    config.polling = PollingConfig {
        interval,
        auto_start,
        ..PollingConfig::default()
    };
    config
}

/// Session for `selection` against the configured backend.
pub fn start_session(config: &MonitorConfig, registry: Registry, selection: Selection) -> Arc<PollingSession> {
    let fetcher = HttpFetcher::new(&config.backend).unwrap();
    Arc::new(PollingSession::spawn(
        selection,
        registry,
        fetcher,
        config.polling.clone(),
    ))
}

/// Poll `condition` every 10 ms until it holds or `limit` elapses.
pub async fn wait_until(limit: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

//! Prometheus metrics for backend polling.
//!
//! Exposes polling and reading metrics in Prometheus text format at `/metrics`.

use axum::{
    extract::Extension,
    http::{header::CONTENT_TYPE, StatusCode},
    response::IntoResponse,
};
use cgh_common::error::MonitorError;
use cgh_common::snapshot::ReadingSnapshot;
use cgh_common::status::PlantStatus;
use prometheus::{
    core::Collector, Gauge, GaugeVec, Histogram, HistogramOpts, IntCounter, IntCounterVec,
    IntGauge, Opts, Registry, TextEncoder,
};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Prometheus metrics registry and collectors.
pub struct MonitorMetrics {
    registry: Registry,

    /// Fetches that returned a snapshot.
    pub fetches_total: IntCounter,

    /// Failed fetches by error kind.
    pub fetch_failures_total: IntCounterVec,

    /// Round-trip time of backend requests.
    pub fetch_duration: Histogram,

    /// 1 while the automatic timer is scheduled.
    pub polling_active: IntGauge,

    /// Unix time of the last successful fetch.
    pub last_success_timestamp: Gauge,

    /// Plant status (0=Normal, 1=Attention, 2=Alert).
    pub plant_status: IntGauge,

    /// Numeric readings by group and register.
    pub readings: GaugeVec,

    /// Number of connected WebSocket clients.
    pub websocket_clients: IntGauge,
}

impl MonitorMetrics {
    /// Create the collectors in a fresh registry.
    ///
    /// # Errors
    ///
    /// Returns an error if a collector cannot be created or registered.
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let fetches_total = register(
            &registry,
            IntCounter::new(
                "cgh_fetches_total",
                "Total number of successful backend fetches",
            )?,
        )?;

        let fetch_failures_total = register(
            &registry,
            IntCounterVec::new(
                Opts::new(
                    "cgh_fetch_failures_total",
                    "Total number of failed fetches by error kind",
                ),
                &["kind"],
            )?,
        )?;

        let fetch_duration = register(
            &registry,
            Histogram::with_opts(
                HistogramOpts::new(
                    "cgh_fetch_duration_seconds",
                    "Histogram of backend request durations in seconds",
                )
                .buckets(vec![0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
            )?,
        )?;

        let polling_active = register(
            &registry,
            IntGauge::new("cgh_polling_active", "Automatic polling scheduled (0/1)")?,
        )?;

        let last_success_timestamp = register(
            &registry,
            Gauge::new(
                "cgh_last_success_timestamp_seconds",
                "Unix time of the last successful fetch",
            )?,
        )?;

        let plant_status = register(
            &registry,
            IntGauge::new(
                "cgh_plant_status",
                "Plant status (0=Normal, 1=Attention, 2=Alert)",
            )?,
        )?;

        let readings = register(
            &registry,
            GaugeVec::new(
                Opts::new("cgh_reading", "Last numeric reading by group and register"),
                &["group", "register"],
            )?,
        )?;

        let websocket_clients = register(
            &registry,
            IntGauge::new(
                "cgh_websocket_clients",
                "Number of connected WebSocket clients",
            )?,
        )?;

        Ok(Self {
            registry,
            fetches_total,
            fetch_failures_total,
            fetch_duration,
            polling_active,
            last_success_timestamp,
            plant_status,
            readings,
            websocket_clients,
        })
    }

    /// Record a successful fetch and export its numeric readings.
    pub fn record_success(&self, elapsed: Duration, snapshot: &ReadingSnapshot) {
        self.fetches_total.inc();
        self.fetch_duration.observe(elapsed.as_secs_f64());

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        self.last_success_timestamp.set(now);

        // Registers missing from this snapshot must not keep stale values
        self.readings.reset();
        for (kind, name, value) in snapshot.iter() {
            if let Some(v) = value.as_f64() {
                self.readings
                    .with_label_values(&[kind.as_str(), name])
                    .set(v);
            }
        }
    }

    /// Record a failed fetch. `elapsed` is `None` when no request was sent.
    pub fn record_failure(&self, error: &MonitorError, elapsed: Option<Duration>) {
        self.fetch_failures_total
            .with_label_values(&[error.kind_name()])
            .inc();
        if let Some(elapsed) = elapsed {
            self.fetch_duration.observe(elapsed.as_secs_f64());
        }
    }

    /// Set the polling gauge.
    pub fn set_polling_active(&self, active: bool) {
        self.polling_active.set(i64::from(active));
    }

    /// Set the plant status gauge.
    pub fn set_plant_status(&self, status: PlantStatus) {
        self.plant_status.set(match status {
            PlantStatus::Normal => 0,
            PlantStatus::Attention => 1,
            PlantStatus::Alert => 2,
        });
    }

    /// Render all metrics in Prometheus text format.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder.encode_to_string(&metric_families)
    }
}

fn register<C>(registry: &Registry, collector: C) -> prometheus::Result<C>
where
    C: Collector + Clone + 'static,
{
    registry.register(Box::new(collector.clone()))?;
    Ok(collector)
}

/// Serve metrics in Prometheus text format.
///
/// GET /metrics
pub async fn metrics_handler(Extension(metrics): Extension<Arc<MonitorMetrics>>) -> impl IntoResponse {
    match metrics.render() {
        Ok(body) => (
            StatusCode::OK,
            [(CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to render metrics: {e}"),
        )
            .into_response(),
    }
}

//! REST API handlers for the web UI.

use crate::state::{DashboardView, SharedState};
use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use cgh_common::registry::SelectionOption;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Always `"ok"`.
    pub status: &'static str,
    /// Crate version.
    pub version: &'static str,
}

/// Health check endpoint.
///
/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Current dashboard view.
///
/// GET /api/state
pub async fn get_state(Extension(state): Extension<Arc<SharedState>>) -> Json<DashboardView> {
    Json(state.view())
}

/// Every selectable controller.
///
/// GET /api/options
pub async fn get_options(
    Extension(state): Extension<Arc<SharedState>>,
) -> Json<Vec<SelectionOption>> {
    Json(state.session().registry().options())
}

/// Fetch now and return the resulting view.
///
/// POST /api/refresh
pub async fn refresh(Extension(state): Extension<Arc<SharedState>>) -> Json<DashboardView> {
    info!("Manual refresh requested");
    state.session().fetch_now().await;
    Json(state.view())
}

/// Polling status returned by the start/stop routes.
#[derive(Debug, Serialize)]
pub struct PollingStatus {
    /// True while the automatic timer is scheduled.
    pub active: bool,
    /// Refresh interval in milliseconds.
    pub interval_ms: u64,
}

/// Resume automatic polling.
///
/// POST /api/polling/start
pub async fn start_polling(
    Extension(state): Extension<Arc<SharedState>>,
) -> Result<Json<PollingStatus>, ApiError> {
    let session = state.session();
    if session.polling().interval.is_zero() {
        return Err(ApiError {
            error: "automatic polling is disabled (interval is zero)".into(),
            code: StatusCode::CONFLICT.as_u16(),
        });
    }
    session.start();
    Ok(Json(polling_status(&state)))
}

/// Pause automatic polling.
///
/// POST /api/polling/stop
pub async fn stop_polling(Extension(state): Extension<Arc<SharedState>>) -> Json<PollingStatus> {
    state.session().stop();
    Json(polling_status(&state))
}

fn polling_status(state: &SharedState) -> PollingStatus {
    let session = state.session();
    PollingStatus {
        active: session.is_active(),
        interval_ms: u64::try_from(session.polling().interval.as_millis()).unwrap_or(u64::MAX),
    }
}

/// API error response.
#[derive(Debug, Serialize)]
pub struct ApiError {
    /// Error message.
    pub error: String,
    /// HTTP status code.
    pub code: u16,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

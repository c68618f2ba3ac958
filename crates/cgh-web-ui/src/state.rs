//! Shared state for the web UI.
//!
//! The polling session owns the poll state; this module turns it into the
//! dashboard view served by the REST API and pushed to WebSocket clients.

use crate::MonitorMetrics;
use cgh_common::config::{MonitorConfig, PlantStatusRules, Thresholds};
use cgh_common::panels::{build_panels, Panel};
use cgh_common::state::PollState;
use cgh_common::status::PlantStatus;
use cgh_poller::{PollEvent, PollingSession};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Everything the dashboard renders.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    /// Plant display name.
    pub plant: String,
    /// Display label of the monitored controller.
    pub selection: String,
    /// Raw poll state (snapshot, flags, error, timestamps).
    #[serde(flatten)]
    pub poll: PollState,
    /// Human-readable form of `error`.
    pub error_message: Option<String>,
    /// Plant-wide status badge.
    pub plant_status: PlantStatus,
    /// Readings grouped into cards.
    pub panels: Vec<Panel>,
    /// Automatic refresh interval in milliseconds, 0 when manual-only.
    pub interval_ms: u64,
}

/// WebSocket message.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum StateUpdate {
    /// Full dashboard view.
    #[serde(rename = "full")]
    Full(Box<DashboardView>),
    /// A fetch was issued.
    #[serde(rename = "loading")]
    Loading {
        /// Always true.
        loading: bool,
    },
}

/// Session plus presentation settings, shared by all handlers.
pub struct SharedState {
    session: Arc<PollingSession>,
    thresholds: Thresholds,
    plant_status: PlantStatusRules,
}

impl SharedState {
    /// Wrap a session with the presentation settings from `config`.
    pub fn new(session: Arc<PollingSession>, config: &MonitorConfig) -> Self {
        Self {
            session,
            thresholds: config.thresholds,
            plant_status: config.plant_status.clone(),
        }
    }

    /// The polling session.
    pub fn session(&self) -> &PollingSession {
        &self.session
    }

    /// Build the current dashboard view.
    pub fn view(&self) -> DashboardView {
        let poll = self.session.state();
        let selection = self.session.selection();
        let registry = self.session.registry();

        let plant = selection
            .plant
            .as_deref()
            .and_then(|id| registry.plant_name(id))
            .unwrap_or("-")
            .to_string();

        DashboardView {
            plant,
            selection: registry.label(selection),
            error_message: poll.error.as_ref().map(ToString::to_string),
            plant_status: PlantStatus::derive(&poll.snapshot, &self.plant_status),
            panels: build_panels(&poll.snapshot, &self.thresholds),
            interval_ms: u64::try_from(self.session.polling().interval.as_millis())
                .unwrap_or(u64::MAX),
            poll,
        }
    }
}

/// Forwards session events to metrics and WebSocket subscribers.
pub struct StateBridge {
    state: Arc<SharedState>,
    events: broadcast::Receiver<PollEvent>,
    broadcast_tx: broadcast::Sender<StateUpdate>,
    metrics: Arc<MonitorMetrics>,
}

impl StateBridge {
    pub(crate) fn new(
        state: Arc<SharedState>,
        broadcast_tx: broadcast::Sender<StateUpdate>,
        metrics: Arc<MonitorMetrics>,
    ) -> Self {
        // Subscribe now so no event between construction and `run` is lost
        let events = state.session().subscribe();
        Self {
            state,
            events,
            broadcast_tx,
            metrics,
        }
    }

    /// Run until the session's event channel closes.
    pub async fn run(mut self) {
        self.sync_gauges(&self.state.view());

        loop {
            match self.events.recv().await {
                Ok(event) => self.apply(&event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(dropped = n, "State bridge lagged, resending full state");
                    let view = self.broadcast_full();
                    self.sync_gauges(&view);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        debug!("State bridge stopped");
    }

    fn apply(&self, event: &PollEvent) {
        match event {
            PollEvent::FetchStarted => {
                let _ = self
                    .broadcast_tx
                    .send(StateUpdate::Loading { loading: true });
                return;
            }
            PollEvent::Activated => self.metrics.set_polling_active(true),
            PollEvent::Paused => self.metrics.set_polling_active(false),
            PollEvent::Updated { elapsed } => {
                let poll = self.state.session().state();
                self.metrics.record_success(*elapsed, &poll.snapshot);
            }
            PollEvent::Failed { error, elapsed } => {
                self.metrics.record_failure(error, *elapsed);
            }
        }

        let view = self.broadcast_full();
        self.metrics.set_plant_status(view.plant_status);
    }

    /// Gauges that can be read back from the view.
    fn sync_gauges(&self, view: &DashboardView) {
        self.metrics.set_polling_active(view.poll.active);
        self.metrics.set_plant_status(view.plant_status);
    }

    fn broadcast_full(&self) -> DashboardView {
        let view = self.state.view();
        let _ = self
            .broadcast_tx
            .send(StateUpdate::Full(Box::new(view.clone())));
        view
    }
}

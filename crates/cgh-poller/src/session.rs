//! Polling session: poll state, refresh cadence, and start/stop control.
//!
//! A session monitors one (plant, server, controller) selection. It owns its
//! [`PollState`] and at most one repeating timer task. Every automatic tick
//! spawns its fetch as a separate task, so cancelling the timer never
//! cancels a request that is already on the wire.
//!
//! Manual and automatic fetches may overlap. `loading` stays true while any
//! of them is outstanding, and the one that settles last decides the final
//! snapshot and error (unless [`OverlapPolicy::Skip`] drops overlapping
//! ticks).

use crate::fetcher::DataFetcher;
use cgh_common::config::{OverlapPolicy, PollingConfig};
use cgh_common::error::MonitorError;
use cgh_common::registry::{Registry, Selection};
use cgh_common::state::PollState;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::{Duration, Instant, SystemTime};
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Capacity of the event channel.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Notification published after every state transition.
#[derive(Debug, Clone, PartialEq)]
pub enum PollEvent {
    /// The automatic timer was scheduled.
    Activated,
    /// The automatic timer was cancelled.
    Paused,
    /// A fetch was issued.
    FetchStarted,
    /// A fetch succeeded and replaced the snapshot.
    Updated {
        /// Request duration.
        elapsed: Duration,
    },
    /// A fetch failed, or could not be issued.
    Failed {
        /// Failure cause.
        error: MonitorError,
        /// Request duration, `None` when no request was sent.
        elapsed: Option<Duration>,
    },
}

/// Timer handle plus a generation that invalidates stale ticks.
#[derive(Debug, Default)]
struct TimerSlot {
    handle: Option<JoinHandle<()>>,
    generation: u64,
}

struct Inner {
    selection: Selection,
    registry: Registry,
    fetcher: Box<dyn DataFetcher>,
    polling: PollingConfig,
    runtime: Handle,
    state: RwLock<PollState>,
    timer: Mutex<TimerSlot>,
    events: broadcast::Sender<PollEvent>,
}

/// Polling controller for one controller selection.
pub struct PollingSession {
    inner: Arc<Inner>,
}

impl PollingSession {
    /// Create a session and, if `polling.auto_start` is set, issue one fetch
    /// immediately and schedule the timer.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn spawn<F>(
        selection: Selection,
        registry: Registry,
        fetcher: F,
        polling: PollingConfig,
    ) -> Self
    where
        F: DataFetcher + 'static,
    {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let auto_start = polling.auto_start;

        let session = Self {
            inner: Arc::new(Inner {
                selection,
                registry,
                fetcher: Box::new(fetcher),
                polling,
                runtime: Handle::current(),
                state: RwLock::new(PollState::new(false)),
                timer: Mutex::new(TimerSlot::default()),
                events,
            }),
        };

        info!(
            selection = %session.inner.selection,
            interval = ?session.inner.polling.interval,
            auto_start,
            "Polling session created"
        );

        if auto_start {
            session.bootstrap();
        }

        session
    }

    /// Issue one fetch immediately and schedule the timer.
    ///
    /// `spawn` does this itself when `polling.auto_start` is set; callers
    /// that need to subscribe first spawn with it cleared and call this.
    pub fn bootstrap(&self) {
        let inner = Arc::clone(&self.inner);
        self.inner.runtime.spawn(async move {
            inner.fetch_now().await;
        });
        self.start();
    }

    /// Fetch once, now, regardless of the timer.
    ///
    /// Never fails: the outcome lands in [`PollState::error`] or
    /// [`PollState::snapshot`].
    pub async fn fetch_now(&self) {
        self.inner.fetch_now().await;
    }

    /// Schedule the repeating timer. Calling it while active is a no-op.
    pub fn start(&self) {
        let interval = self.inner.polling.interval;
        if interval.is_zero() {
            warn!("Polling interval is zero, automatic updates stay disabled");
            return;
        }

        // `active` is only written under the timer lock
        let mut slot = self.inner.lock_timer();
        if slot.handle.as_ref().is_some_and(|h| !h.is_finished()) {
            let was_active = self.inner.update(|s| std::mem::replace(&mut s.active, true));
            drop(slot);
            debug!("Polling already active");
            if !was_active {
                self.inner.emit(PollEvent::Activated);
            }
            return;
        }

        slot.generation += 1;
        let generation = slot.generation;
        let inner = Arc::clone(&self.inner);
        slot.handle = Some(self.inner.runtime.spawn(run_timer(inner, generation)));
        self.inner.update(|s| s.set_active(true));
        drop(slot);

        info!(interval = ?interval, "Polling started");
        self.inner.emit(PollEvent::Activated);
    }

    /// Cancel the timer.
    ///
    /// Once this returns no further automatic fetch is issued. Fetches
    /// already in flight still complete and update the state.
    pub fn stop(&self) {
        let was_running = self.inner.cancel_timer();

        if was_running {
            info!("Polling stopped");
            self.inner.emit(PollEvent::Paused);
        }
    }

    /// Copy of the current poll state.
    #[must_use]
    pub fn state(&self) -> PollState {
        self.inner.read(Clone::clone)
    }

    /// True while the timer is scheduled.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.inner.read(|s| s.active)
    }

    /// The monitored selection.
    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.inner.selection
    }

    /// The registry used to resolve the selection.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    /// Polling configuration.
    #[must_use]
    pub fn polling(&self) -> &PollingConfig {
        &self.inner.polling
    }

    /// Subscribe to state transitions.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PollEvent> {
        self.inner.events.subscribe()
    }
}

impl Drop for PollingSession {
    fn drop(&mut self) {
        self.inner.cancel_timer();
    }
}

impl Inner {
    async fn fetch_now(&self) {
        let descriptor = match self.registry.resolve_selection(&self.selection) {
            Ok(descriptor) => descriptor,
            Err(error) => {
                warn!(selection = %self.selection, %error, "Cannot fetch readings");
                self.update(|s| s.reject(error.clone()));
                self.emit(PollEvent::Failed {
                    error,
                    elapsed: None,
                });
                return;
            }
        };

        let in_flight = InFlight::begin(self);
        self.emit(PollEvent::FetchStarted);

        let started = Instant::now();
        let result = self.fetcher.fetch(&descriptor).await;
        let elapsed = started.elapsed();

        match result {
            Ok(snapshot) => {
                debug!(readings = snapshot.len(), ?elapsed, "Snapshot updated");
                in_flight.settle(|s| s.apply_success(snapshot, SystemTime::now()));
                self.emit(PollEvent::Updated { elapsed });
            }
            Err(error) => {
                warn!(%error, ?elapsed, "Fetch failed, keeping previous snapshot");
                in_flight.settle(|s| s.apply_failure(error.clone()));
                self.emit(PollEvent::Failed {
                    error,
                    elapsed: Some(elapsed),
                });
            }
        }
    }

    /// Decide under the timer lock whether a tick may fetch.
    ///
    /// Returns false once the generation is stale.
    fn on_tick(self: &Arc<Self>, generation: u64) -> bool {
        let slot = self.lock_timer();
        if slot.generation != generation {
            return false;
        }

        if self.polling.overlap == OverlapPolicy::Skip && self.read(PollState::in_flight) > 0 {
            debug!("Previous fetch still outstanding, skipping tick");
            return true;
        }

        let inner = Arc::clone(self);
        self.runtime.spawn(async move {
            inner.fetch_now().await;
        });
        true
    }

    /// Abort the timer task, invalidate its pending ticks and clear
    /// `active`, all under the timer lock.
    fn cancel_timer(&self) -> bool {
        let mut slot = self.lock_timer();
        slot.generation += 1;
        let was_running = match slot.handle.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        };
        self.update(|s| s.set_active(false));
        was_running
    }

    fn lock_timer(&self) -> MutexGuard<'_, TimerSlot> {
        self.timer
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn update<T>(&self, f: impl FnOnce(&mut PollState) -> T) -> T {
        let mut guard = self
            .state
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&mut guard)
    }

    fn read<T>(&self, f: impl FnOnce(&PollState) -> T) -> T {
        let guard = self
            .state
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&guard)
    }

    fn emit(&self, event: PollEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

/// Outstanding-fetch marker. Dropping it unsettled (the fetch future was
/// cancelled) still clears the in-flight count.
struct InFlight<'a> {
    inner: &'a Inner,
    settled: bool,
}

impl<'a> InFlight<'a> {
    fn begin(inner: &'a Inner) -> Self {
        inner.update(PollState::begin_fetch);
        Self {
            inner,
            settled: false,
        }
    }

    /// Apply the outcome and release the in-flight slot in one write.
    fn settle(mut self, f: impl FnOnce(&mut PollState)) {
        self.inner.update(|s| {
            f(s);
            s.end_fetch();
        });
        self.settled = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.inner.update(PollState::end_fetch);
        }
    }
}

async fn run_timer(inner: Arc<Inner>, generation: u64) {
    let period = inner.polling.interval;
    let mut ticker = time::interval_at(time::Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if !inner.on_tick(generation) {
            break;
        }
    }
}

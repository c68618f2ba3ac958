//! OS signals for the monitor daemon.
//!
//! SIGTERM and SIGINT stop the daemon; SIGHUP asks for an immediate
//! refresh of the selected controller. Waiters are woken through [`Notify`].

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::{debug, info};

/// Signals the daemon reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    /// SIGTERM.
    Terminate,
    /// SIGINT (Ctrl+C).
    Interrupt,
    /// SIGHUP, refresh now.
    Hangup,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Terminate => "SIGTERM",
            Self::Interrupt => "SIGINT",
            Self::Hangup => "SIGHUP",
        })
    }
}

/// Flags and wakers shared between the listener task and the daemon.
#[derive(Debug, Default)]
pub struct SignalState {
    stopping: AtomicBool,
    received: AtomicU32,
    shutdown: Notify,
    refresh: Notify,
}

impl SignalState {
    /// True once a stop has been requested.
    #[inline]
    pub fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::Acquire)
    }

    /// Mark the daemon as stopping and wake every waiter.
    pub fn request_shutdown(&self) {
        self.stopping.store(true, Ordering::Release);
        self.shutdown.notify_waiters();
    }

    /// Ask for a refresh. At most one pending request is kept.
    pub fn request_refresh(&self) {
        self.refresh.notify_one();
    }

    fn on_signal(&self, kind: SignalKind) {
        self.received.fetch_add(1, Ordering::Relaxed);
        info!(signal = %kind, "Signal received");
        match kind {
            SignalKind::Terminate | SignalKind::Interrupt => self.request_shutdown(),
            SignalKind::Hangup => self.request_refresh(),
        }
    }

    /// Signals received since startup.
    pub fn received(&self) -> u32 {
        self.received.load(Ordering::Relaxed)
    }
}

/// Cloneable handle to the daemon's signal state.
#[derive(Clone, Default)]
pub struct SignalHandler {
    state: Arc<SignalState>,
}

impl SignalHandler {
    /// Register OS signal listeners on the current Tokio runtime.
    ///
    /// Unix listens for SIGTERM, SIGINT and SIGHUP; other platforms only
    /// for Ctrl+C.
    ///
    /// # Errors
    ///
    /// Returns an error if a listener cannot be registered.
    pub fn install() -> std::io::Result<Self> {
        let handler = Self::default();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind as UnixSignal};

            let mut term = signal(UnixSignal::terminate())?;
            let mut int = signal(UnixSignal::interrupt())?;
            let mut hup = signal(UnixSignal::hangup())?;
            let state = Arc::clone(&handler.state);

            tokio::spawn(async move {
                loop {
                    let kind = tokio::select! {
                        Some(()) = term.recv() => SignalKind::Terminate,
                        Some(()) = int.recv() => SignalKind::Interrupt,
                        Some(()) = hup.recv() => SignalKind::Hangup,
                        else => break,
                    };
                    state.on_signal(kind);
                }
            });
            debug!("Listening for SIGTERM, SIGINT and SIGHUP");
        }

        #[cfg(not(unix))]
        {
            let state = Arc::clone(&handler.state);
            tokio::spawn(async move {
                while tokio::signal::ctrl_c().await.is_ok() {
                    state.on_signal(SignalKind::Interrupt);
                }
            });
        }

        Ok(handler)
    }

    /// Stop without an OS signal.
    pub fn request_shutdown(&self) {
        info!("Shutdown requested");
        self.state.request_shutdown();
    }

    /// Resolve once a stop has been requested.
    pub async fn shutdown_signaled(&self) {
        loop {
            // Registered before the flag check so a concurrent request is not missed
            let notified = self.state.shutdown.notified();
            if self.state.is_stopping() {
                return;
            }
            notified.await;
        }
    }

    /// Resolve on the next refresh request.
    pub async fn refresh_requested(&self) {
        self.state.refresh.notified().await;
    }

    /// Shared flags.
    pub fn state(&self) -> &SignalState {
        &self.state
    }
}

//! Polling cadence against a live backend.
//!
//! Uses real time with short intervals; every wait is bounded.

use super::common::{monitor_config, start_session, wait_until, PlantBackend};
use cgh_common::{MonitorError, ReadingValue, Registry, Selection};
use std::time::Duration;

fn ug01() -> Selection {
    Selection::new("aparecida", "principal", "ug01")
}

#[tokio::test]
async fn test_auto_start_polls_repeatedly() {
    let backend = PlantBackend::start().await;
    let config = monitor_config(&backend, Duration::from_millis(100), true);
    let session = start_session(&config, Registry::builtin(), ug01());

    assert!(session.is_active());
    assert!(wait_until(Duration::from_secs(5), || backend.requests() >= 3).await);
    assert!(wait_until(Duration::from_secs(1), || session.state().success_count >= 3).await);

    let state = session.state();
    assert!(!state.initial_load);
    assert!(state.error.is_none());
    assert_eq!(
        state.snapshot.real.get("MED_750450_AR1_RTD1"),
        Some(&ReadingValue::Number(48.3))
    );
    assert!(state.last_update.is_some());
}

#[tokio::test]
async fn test_stop_halts_requests() {
    let backend = PlantBackend::start().await;
    let config = monitor_config(&backend, Duration::from_millis(100), true);
    let session = start_session(&config, Registry::builtin(), ug01());
    assert!(wait_until(Duration::from_secs(5), || backend.requests() >= 2).await);

    session.stop();
    assert!(!session.is_active());
    assert!(wait_until(Duration::from_secs(2), || !session.state().loading).await);

    let count = backend.requests();
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(backend.requests(), count);
}

#[tokio::test]
async fn test_manual_refresh_while_paused() {
    let backend = PlantBackend::start().await;
    let config = monitor_config(&backend, Duration::from_millis(100), false);
    let session = start_session(&config, Registry::builtin(), ug01());

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(backend.requests(), 0);
    assert!(session.state().initial_load);

    backend.set_value("UHLM_PressaoOleo", 140.0);
    session.fetch_now().await;

    assert_eq!(backend.requests(), 1);
    let state = session.state();
    assert!(!state.active);
    assert!(!state.loading);
    assert_eq!(
        state.snapshot.real.get("UHLM_PressaoOleo"),
        Some(&ReadingValue::Number(140.0))
    );
}

#[tokio::test]
async fn test_outage_keeps_last_snapshot() {
    let backend = PlantBackend::start().await;
    let config = monitor_config(&backend, Duration::from_millis(100), true);
    let session = start_session(&config, Registry::builtin(), ug01());
    assert!(wait_until(Duration::from_secs(5), || session.state().success_count >= 1).await);

    backend.set_offline(true);
    assert!(wait_until(Duration::from_secs(5), || session.state().failure_count >= 1).await);
    let before = session.state();
    assert!(!before.snapshot.is_empty());
    assert!(
        wait_until(Duration::from_secs(5), || {
            session.state().failure_count >= before.failure_count + 2
        })
        .await
    );

    let during = session.state();
    assert_eq!(during.error, Some(MonitorError::Protocol { status: 503 }));
    assert_eq!(during.snapshot, before.snapshot);
    assert_eq!(during.last_update, before.last_update);
    assert!(session.is_active());

    backend.set_offline(false);
    assert!(wait_until(Duration::from_secs(5), || session.state().error.is_none()).await);
    assert!(session.state().last_update > before.last_update);
}

#[tokio::test]
async fn test_restart_resumes_polling() {
    let backend = PlantBackend::start().await;
    let config = monitor_config(&backend, Duration::from_millis(100), true);
    let session = start_session(&config, Registry::builtin(), ug01());
    assert!(wait_until(Duration::from_secs(5), || backend.requests() >= 1).await);

    session.stop();
    assert!(wait_until(Duration::from_secs(2), || !session.state().loading).await);
    let paused_at = backend.requests();

    session.start();
    session.start();
    assert!(session.is_active());
    assert!(wait_until(Duration::from_secs(5), || backend.requests() >= paused_at + 3).await);
}

#[tokio::test]
async fn test_unknown_controller_never_reaches_backend() {
    let backend = PlantBackend::start().await;
    let config = monitor_config(&backend, Duration::from_millis(50), true);
    let session = start_session(
        &config,
        Registry::builtin(),
        Selection::new("aparecida", "principal", "ug09"),
    );

    assert!(wait_until(Duration::from_secs(5), || session.state().failure_count >= 2).await);
    assert!(matches!(
        session.state().error,
        Some(MonitorError::NotFound { .. })
    ));
    assert_eq!(backend.requests(), 0);
}

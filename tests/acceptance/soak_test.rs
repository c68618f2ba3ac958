//! Long-running polling under a flapping backend.
//!
//! Run with `cargo test --test acceptance_tests soak -- --ignored`.
//! `CGH_SOAK_SECS` overrides the default duration of 60 seconds.

use super::common::{monitor_config, start_session, wait_until, PlantBackend};
use cgh_common::{Registry, Selection};
use std::time::Duration;

fn soak_duration() -> Duration {
    std::env::var("CGH_SOAK_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .map_or(Duration::from_secs(60), Duration::from_secs)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[ignore = "long running"]
async fn soak_flapping_backend() {
    let backend = PlantBackend::start().await;
    let config = monitor_config(&backend, Duration::from_millis(50), true);
    let session = start_session(
        &config,
        Registry::builtin(),
        Selection::new("aparecida", "principal", "ug01"),
    );

    let deadline = tokio::time::Instant::now() + soak_duration();
    let mut round = 0u32;
    while tokio::time::Instant::now() < deadline {
        round += 1;
        backend.set_offline(round % 3 == 0);
        backend.set_value("MED_750450_AR1_RTD1", f64::from(round % 100));
        if round % 10 == 0 {
            session.stop();
            session.fetch_now().await;
            session.start();
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    }

    backend.set_offline(false);
    session.stop();
    assert!(wait_until(Duration::from_secs(5), || !session.state().loading).await);

    let state = session.state();
    assert_eq!(state.in_flight(), 0);
    assert!(state.success_count > 0);
    assert!(state.failure_count > 0);

    let settled = backend.requests();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(backend.requests(), settled);

    println!(
        "soak: {} requests, {} successes, {} failures",
        settled, state.success_count, state.failure_count
    );
}

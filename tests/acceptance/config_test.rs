//! Configuration files driving a live session.

use super::common::{start_session, PlantBackend};
use cgh_common::{IdentifierKind, MonitorConfig, MonitorError, ReadingValue};
use std::path::Path;
use std::time::Duration;

const REGISTRY: &str = r#"
[plants.outra]
name = "CGH Outra"
table = "cgh_outra"

[plants.outra.servers.principal]
ip = "100.110.213.100"
port = "8100"

[plants.outra.servers.principal.controllers.ug01]
id = 1
ug = "UG-01"
ip = "192.168.20.2"
port = 502

[plants.outra.servers.principal.controllers.ug01.readings]
REAL = [{ nome = "MED_750450_AR1_RTD1", addr = 14001 }]

[plants.outra.servers.principal.controllers.ug02]
id = 2
ug = "UG-02"
ip = "192.168.20.3"
port = "503"

[plants.outra.servers.principal.controllers.ug02.readings]
REAL = [
    { nome = "MED_750450_AR1_RTD1", addr = 14101 },
    { nome = "UHLM_PressaoOleo", addr = 14103 },
]
INT = [{ nome = "Turbina_Velocidade", addr = 14121 }]
"#;

fn write_config(dir: &Path, backend: &PlantBackend, controller: &str) -> MonitorConfig {
    let registry_path = dir.join("registry.toml");
    std::fs::write(&registry_path, REGISTRY).unwrap();

    let config_path = dir.join("monitor.toml");
    let content = format!(
        r#"
registry_file = "{registry}"

[backend]
url = "{url}"
timeout = "2s"

[polling]
interval = "1h"
auto_start = false

[selection]
plant = "outra"
server = "principal"
controller = "{controller}"
"#,
        registry = registry_path.display(),
        url = backend.url(),
    );
    std::fs::write(&config_path, content).unwrap();

    MonitorConfig::from_file(&config_path).unwrap()
}

#[tokio::test]
async fn test_custom_registry_reaches_backend() {
    let backend = PlantBackend::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &backend, "ug02");
    config.validate().unwrap();

    let registry = config.load_registry().unwrap();
    assert_eq!(registry.options().len(), 2);
    assert_eq!(registry.label(&config.selection), "CGH Outra - UG-02 (principal)");

    let session = start_session(&config, registry, config.selection.clone());
    assert!(!session.is_active());
    session.fetch_now().await;

    let request = backend.last_request().unwrap();
    assert_eq!(request["table"], "cgh_outra");
    assert_eq!(request["id"], 2);
    assert_eq!(request["ug"], "UG-02");
    assert_eq!(request["ip_servidor"], "100.110.213.100");
    assert_eq!(request["porta_servidor"], "8100");
    assert_eq!(request["ip_clp"], "192.168.20.3");
    assert_eq!(request["porta_clp"], "503");
    assert_eq!(request["leituras"]["REAL"].as_array().unwrap().len(), 2);
    assert_eq!(request["leituras"]["INT"][0]["addr"], 14121);

    let state = session.state();
    assert!(state.error.is_none());
    assert_eq!(
        state.snapshot.int.get("Turbina_Velocidade"),
        Some(&ReadingValue::Number(514.0))
    );
    assert_eq!(state.snapshot.real.len(), 2);
}

#[tokio::test]
async fn test_controller_missing_from_registry_file() {
    let backend = PlantBackend::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &backend, "ug03");

    let session = start_session(&config, config.load_registry().unwrap(), config.selection.clone());
    session.fetch_now().await;

    assert_eq!(
        session.state().error,
        Some(MonitorError::NotFound {
            kind: IdentifierKind::Controller,
            id: "ug03".into()
        })
    );
    assert_eq!(backend.requests(), 0);
}

#[tokio::test]
async fn test_incomplete_selection_is_reported() {
    let backend = PlantBackend::start().await;
    let dir = tempfile::tempdir().unwrap();
    let mut config = write_config(dir.path(), &backend, "ug01");
    config.selection.server = None;

    let session = start_session(&config, config.load_registry().unwrap(), config.selection.clone());
    session.fetch_now().await;

    let state = session.state();
    assert!(state.error.as_ref().is_some_and(MonitorError::is_config));
    assert!(!state.initial_load);
    assert_eq!(backend.requests(), 0);
}

#[test]
fn test_missing_registry_file_is_an_error() {
    let config = MonitorConfig {
        registry_file: Some("/nonexistent/registry.toml".into()),
        ..MonitorConfig::default()
    };
    assert!(config.load_registry().is_err());
}

#[test]
fn test_zero_timeout_rejected() {
    let mut config = MonitorConfig::default();
    config.backend.timeout = Duration::ZERO;
    assert!(config.validate().is_err());
}

#[test]
fn test_shipped_default_config_matches_builtin() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/default.toml");
    let config = MonitorConfig::from_file(&path).unwrap();
    config.validate().unwrap();

    let builtin = MonitorConfig::default();
    assert_eq!(config.backend.url, builtin.backend.url);
    assert_eq!(config.polling.interval, builtin.polling.interval);
    assert_eq!(config.selection, builtin.selection);
    assert_eq!(config.thresholds, builtin.thresholds);
    assert_eq!(config.plant_status, builtin.plant_status);
    assert_eq!(config.web.bind_addr, builtin.web.bind_addr);
}

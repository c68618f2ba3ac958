//! CGH Monitor daemon entry point.
//!
//! Loads the configuration, starts the polling session for the selected
//! controller and serves the dashboard until a shutdown signal arrives.

mod report;
mod signals;

use anyhow::{bail, Context, Result};
use cgh_common::config::MonitorConfig;
use cgh_common::registry::Registry;
use cgh_poller::{HttpFetcher, PollingSession};
use cgh_web_ui::WebUiServer;
use clap::Parser;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::signals::SignalHandler;

/// CGH Monitor command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "cgh-daemon",
    about = "CGH Monitor - hydro plant PLC dashboard",
    version,
    long_about = None
)]
struct Args {
    /// Path to a configuration file (TOML).
    #[arg(long, short = 'c', value_name = "FILE")]
    config: Option<PathBuf>,

    /// Plant identifier (overrides config file).
    #[arg(long, short = 'p')]
    plant: Option<String>,

    /// Intermediary server identifier (overrides config file).
    #[arg(long, short = 's')]
    server: Option<String>,

    /// Controller identifier (overrides config file).
    #[arg(long)]
    controller: Option<String>,

    /// Backend read endpoint URL (overrides config file).
    #[arg(long, value_name = "URL")]
    backend_url: Option<String>,

    /// Polling interval, e.g. "5s" or "500ms"; "0s" disables automatic polling.
    #[arg(long, short = 'i', value_parser = humantime::parse_duration)]
    interval: Option<Duration>,

    /// Do not start automatic polling at startup.
    #[arg(long)]
    no_auto_start: bool,

    /// Web UI bind address (overrides config file).
    #[arg(long, short = 'b', value_name = "ADDR")]
    bind: Option<SocketAddr>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,

    /// Print the selectable controllers and exit.
    #[arg(long)]
    list: bool,

    /// Fetch once, print the panels and exit.
    #[arg(long, conflicts_with = "list")]
    once: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level);

    let mut config = load_config(args.config.as_deref())?;
    apply_overrides(&mut config, &args);
    config.validate().context("Invalid configuration")?;

    let registry = config
        .load_registry()
        .context("Failed to load controller registry")?;

    if args.list {
        print!("{}", report::options_table(&registry));
        return Ok(());
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        selection = %config.selection,
        backend = %config.backend.url,
        interval = ?config.polling.interval,
        "Starting CGH Monitor"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build Tokio runtime")?;

    if args.once {
        runtime.block_on(run_once(config, registry))
    } else {
        runtime.block_on(run_daemon(config, registry))
    }
}

/// Initialize logging with the specified log level.
fn init_logging(level: &str) {
    let filter = format!(
        "cgh_daemon={level},cgh_poller={level},cgh_web_ui={level},cgh_common={level}"
    );

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&filter)),
        )
        .with_target(true)
        .init();
}

/// Load configuration from file or use defaults.
///
/// Resolution priority (first existing file wins):
/// 1. Command-line `--config` argument
/// 2. `CGH_CONFIG_PATH` environment variable
/// 3. `/etc/cgh-monitor/config.toml` (system path)
/// 4. `config/default.toml` (local development)
/// 5. Built-in defaults
fn load_config(cli_path: Option<&Path>) -> Result<MonitorConfig> {
    if let Some(config_path) = cli_path {
        info!(?config_path, "Loading config from command-line argument");
        return MonitorConfig::from_file(config_path)
            .with_context(|| format!("Failed to load config from {config_path:?}"));
    }

    if let Ok(env_path) = std::env::var("CGH_CONFIG_PATH") {
        let config_path = PathBuf::from(&env_path);
        if config_path.exists() {
            info!(?config_path, "Loading config from CGH_CONFIG_PATH");
            return MonitorConfig::from_file(&config_path).with_context(|| {
                format!("Failed to load config from CGH_CONFIG_PATH={env_path:?}")
            });
        }
        warn!(
            path = %env_path,
            "CGH_CONFIG_PATH set but file does not exist, checking other locations"
        );
    }

    for candidate in ["/etc/cgh-monitor/config.toml", "config/default.toml"] {
        let config_path = Path::new(candidate);
        if config_path.exists() {
            info!(?config_path, "Loading config file");
            return MonitorConfig::from_file(config_path)
                .with_context(|| format!("Failed to load config from {config_path:?}"));
        }
    }

    info!("No config file found, using built-in defaults");
    Ok(MonitorConfig::default())
}

/// Apply command-line overrides on top of the loaded file.
fn apply_overrides(config: &mut MonitorConfig, args: &Args) {
    let selection = &mut config.selection;
    for (slot, value) in [
        (&mut selection.plant, &args.plant),
        (&mut selection.server, &args.server),
        (&mut selection.controller, &args.controller),
    ] {
        if let Some(value) = value {
            *slot = Some(value.clone());
        }
    }

    if let Some(url) = &args.backend_url {
        config.backend.url.clone_from(url);
    }
    if let Some(interval) = args.interval {
        config.polling.interval = interval;
    }
    if args.no_auto_start {
        config.polling.auto_start = false;
    }
    if let Some(bind) = args.bind {
        config.web.bind_addr = bind;
    }
}

fn build_session(config: &MonitorConfig, registry: Registry) -> Result<PollingSession> {
    let fetcher = HttpFetcher::new(&config.backend).context("Failed to create backend client")?;
    Ok(PollingSession::spawn(
        config.selection.clone(),
        registry,
        fetcher,
        config.polling.clone(),
    ))
}

/// Single fetch for scripting and diagnostics.
async fn run_once(mut config: MonitorConfig, registry: Registry) -> Result<()> {
    config.polling.auto_start = false;
    let title = registry.label(&config.selection);
    let session = build_session(&config, registry)?;

    session.fetch_now().await;
    let state = session.state();
    print!(
        "{}",
        report::panels_report(&title, &state, &config.thresholds, &config.plant_status)
    );

    match state.error {
        Some(error) => bail!("fetch failed: {error}"),
        None => Ok(()),
    }
}

/// Main daemon loop.
async fn run_daemon(mut config: MonitorConfig, registry: Registry) -> Result<()> {
    let signals = SignalHandler::install().context("Failed to set up signal handlers")?;

    if let Err(error) = registry.resolve_selection(&config.selection) {
        warn!(%error, "Selected controller cannot be resolved, fetches will fail until reconfigured");
    }

    // Bootstrap only once the web UI is subscribed to session events
    let auto_start = std::mem::replace(&mut config.polling.auto_start, false);
    let session = Arc::new(build_session(&config, registry)?);
    let server = WebUiServer::new(Arc::clone(&session), &config)?;
    if auto_start {
        session.bootstrap();
    }

    let refresher = {
        let session = Arc::clone(&session);
        let signals = signals.clone();
        tokio::spawn(async move {
            loop {
                signals.refresh_requested().await;
                info!("Refresh requested by signal");
                session.fetch_now().await;
            }
        })
    };

    let shutdown = {
        let signals = signals.clone();
        async move { signals.shutdown_signaled().await }
    };
    let served = server.start_with_shutdown(shutdown).await;

    info!("Shutting down...");
    refresher.abort();
    session.stop();

    let state = session.state();
    info!(
        fetches = state.success_count,
        failures = state.failure_count,
        signals = signals.state().received(),
        "Daemon shutdown complete"
    );

    served
}

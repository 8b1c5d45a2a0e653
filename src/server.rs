//! Server initialization and startup logic for Cadence.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cadence_api::{AppState, InterfaceConfig, InterfaceServer};
use cadence_config::{Config, ConfigLoader, ConfigValidator, LoggingConfig};
use cadence_core::{ReconcileReport, SettingsStore, Supervisor};
use cadence_daemon::{ServiceLoop, SignalHandler};
use cadence_runloop::CommandLauncher;

use crate::register::build_registry;

/// Initialize tracing with console output and, when `log_dir` is set,
/// a daily rolling file.
///
/// `RUST_LOG` wins over the configured level.
pub(crate) fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = match &logging.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir))?;

            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("cadence")
                .filename_suffix("log")
                .max_log_files(30)
                .build(dir)?;

            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            // The guard flushes buffered lines on drop and must outlive the program.
            static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
                std::sync::OnceLock::new();
            let _ = GUARD.set(guard);

            Some(fmt::layer().with_writer(non_blocking).with_ansi(false))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_ansi(true))
        .with(file_layer)
        .try_init()?;

    Ok(())
}

/// Load the configuration file, falling back to defaults when it is missing.
pub(crate) fn load_config(path: &Path) -> anyhow::Result<Config> {
    let config = ConfigLoader::load_or_default(path.exists().then_some(path))
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    Ok(config)
}

/// Log validation findings and fail on errors.
pub(crate) fn ensure_valid(config: &Config) -> anyhow::Result<()> {
    let result = ConfigValidator::validate(config);
    for warning in &result.warnings {
        warn!("Config warning: {}", warning);
    }
    if !result.is_valid() {
        for err in &result.errors {
            error!("Config error: {}", err);
        }
        anyhow::bail!("Invalid configuration ({} error(s))", result.errors.len());
    }
    Ok(())
}

/// Build the supervisor for `config`.
///
/// Process-kind jobs re-execute this binary with the same config file.
pub(crate) fn build_supervisor(config_path: &Path, config: &Config) -> anyhow::Result<Supervisor> {
    let registry = build_registry(config)?;
    let settings = Arc::new(SettingsStore::open(
        config.supervisor.settings_path(),
        registry.default_settings(),
    ));

    let config_arg = std::fs::canonicalize(config_path).unwrap_or_else(|_| config_path.to_path_buf());
    let launcher = CommandLauncher::current_exe()?
        .with_args(["--config".to_string(), config_arg.display().to_string()]);

    Ok(Supervisor::new(registry, settings)
        .with_grace_period(config.supervisor.grace_period())
        .with_launcher(Arc::new(launcher)))
}

/// Run the supervisor and HTTP server in foreground until shutdown.
pub(crate) async fn run_server(config_path: &Path, config: Config) -> anyhow::Result<()> {
    info!("Starting Cadence v{}", env!("CARGO_PKG_VERSION"));
    ensure_valid(&config)?;

    let supervisor = Arc::new(build_supervisor(config_path, &config)?);
    info!("Settings file: {}", supervisor.settings().path().display());

    let state = Arc::new(AppState::new(supervisor.clone()));
    let signals = SignalHandler::new();
    signals.install_os_signals()?;

    // POST /workers/shutdown lands here.
    {
        let signals = signals.clone();
        let notify = state.shutdown_notify.clone();
        tokio::spawn(async move {
            notify.notified().await;
            signals.request_shutdown();
        });
    }

    let interface_config = InterfaceConfig::new(config.server.host.clone(), config.server.port);
    let server = InterfaceServer::new(interface_config, state.clone());
    let server_signals = signals.clone();
    let server_task = tokio::spawn(async move {
        if let Err(e) = server.run().await {
            error!("Interface server failed: {}", e);
            server_signals.request_shutdown();
        }
    });

    if config.supervisor.reconcile_on_start {
        let report = supervisor.reconcile().await;
        state.set_startup_error(startup_error(&report));
    } else {
        info!("Startup reconcile disabled");
    }
    state.mark_ready();

    info!("Cadence ready:");
    info!("  API Server:    http://{}:{}", config.server.host, config.server.port);
    info!("  Jobs:          {}", supervisor.registry().names().join(", "));

    let stopped = ServiceLoop::new(supervisor, signals)
        .with_reconcile_on_start(false)
        .run()
        .await;
    info!("Stopped {} job(s)", stopped.len());

    server_task.abort();
    info!("Shutting down...");
    Ok(())
}

/// Summarize the jobs a startup reconcile could not bring up.
fn startup_error(report: &ReconcileReport) -> Option<String> {
    if report.is_clean() {
        return None;
    }
    let mut parts = Vec::new();
    if !report.precondition_failed.is_empty() {
        parts.push(format!(
            "precondition failed: {}",
            report.precondition_failed.join(", ")
        ));
    }
    if !report.failed.is_empty() {
        parts.push(format!("failed to start: {}", report.failed.join(", ")));
    }
    Some(parts.join("; "))
}

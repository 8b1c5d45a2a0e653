//! `status`, `check` and `worker` command handlers.

use std::path::Path;

use cadence_config::{Config, ConfigValidator};
use cadence_core::{Settings, SettingsStore};
use cadence_daemon::{run_worker, SignalHandler};
use tracing::info;

use crate::register::build_registry;

/// Print the persisted enabled flags, with defaults for unseen jobs.
pub(crate) fn handle_status_command(config: &Config) -> anyhow::Result<()> {
    let settings = persisted_settings(config)?;
    if settings.is_empty() {
        println!("No workers configured.");
        return Ok(());
    }
    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}

pub(crate) fn persisted_settings(config: &Config) -> anyhow::Result<Settings> {
    let registry = build_registry(config)?;
    let store = SettingsStore::open(config.supervisor.settings_path(), registry.default_settings());
    Ok(store.snapshot())
}

/// Print validation findings. Fails when the config has errors.
pub(crate) fn handle_check_command(config_path: &Path, config: &Config) -> anyhow::Result<()> {
    let result = ConfigValidator::validate(config);

    for warning in &result.warnings {
        println!("warning: {}", warning);
    }
    for err in &result.errors {
        println!("error: {}", err);
    }

    if !result.is_valid() {
        anyhow::bail!(
            "{} is invalid ({} error(s))",
            config_path.display(),
            result.errors.len()
        );
    }
    println!(
        "{} is valid ({} job(s), {} warning(s))",
        config_path.display(),
        config.jobs.len(),
        result.warnings.len()
    );
    Ok(())
}

/// Host one job loop until SIGTERM or SIGINT.
pub(crate) async fn handle_worker_command(config: &Config, name: &str) -> anyhow::Result<()> {
    let registry = build_registry(config)?;
    let signals = SignalHandler::new();
    signals.install_os_signals()?;

    let cycles = run_worker(&registry, name, &signals).await?;
    info!("Job {} ran {} cycle(s)", name, cycles);
    Ok(())
}

//! Job registration from configuration.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use cadence_config::{Config, JobConfig, JobKind};
use cadence_core::{JobRegistry, SupervisorError};
use cadence_runloop::{ExecutionKind, JobDescriptor};

use crate::jobs::ShellCommand;

/// Build the job registry from every `[[jobs]]` entry in `config`.
pub(crate) fn build_registry(config: &Config) -> Result<JobRegistry, SupervisorError> {
    let registry = JobRegistry::new();
    for job in &config.jobs {
        registry.register(descriptor_for(job))?;
        debug!(job = %job.name, kind = %job.kind, "Registered job");
    }
    info!("Registered {} job(s)", registry.len());
    Ok(registry)
}

/// Translate one job's configuration into a descriptor.
pub(crate) fn descriptor_for(job: &JobConfig) -> JobDescriptor {
    let command = Arc::new(
        ShellCommand::new(&job.name, &job.command)
            .with_working_dir(job.working_dir.as_ref().map(PathBuf::from)),
    );

    let descriptor = match job.kind {
        JobKind::Thread => JobDescriptor::blocking(&job.name, job.interval(), move |token| {
            command.run_blocking(token)
        }),
        JobKind::Task | JobKind::Process => {
            JobDescriptor::asynchronous(&job.name, job.interval(), move |token| {
                let command = command.clone();
                async move { command.run_async(token).await }
            })
        }
    };

    let descriptor = descriptor
        .with_kind(execution_kind(job.kind))
        .with_default_enabled(job.default_enabled);

    if job.requires.is_empty() {
        return descriptor;
    }
    let requires: Vec<PathBuf> = job.requires.iter().map(PathBuf::from).collect();
    descriptor.with_precondition(move || requires_present(&requires))
}

fn execution_kind(kind: JobKind) -> ExecutionKind {
    match kind {
        JobKind::Thread => ExecutionKind::Thread,
        JobKind::Process => ExecutionKind::Process,
        JobKind::Task => ExecutionKind::Task,
    }
}

fn requires_present(paths: &[PathBuf]) -> bool {
    match paths.iter().find(|path| !path.exists()) {
        Some(missing) => {
            info!("Required path {} is missing", missing.display());
            false
        }
        None => true,
    }
}

//! Worker control endpoints.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use cadence_core::{JobStatus, Settings, StartOutcome, StopOutcome};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ApiError;
use crate::state::AppState;

/// Body of `POST /workers/{name}`.
#[derive(Debug, Deserialize)]
pub struct WorkerToggle {
    pub enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub message: String,
    pub outcome: String,
}

#[derive(Debug, Serialize)]
pub struct WorkersResponse {
    pub settings: Settings,
    pub status: BTreeMap<String, bool>,
}

#[derive(Debug, Serialize)]
pub struct SystemStatusResponse {
    pub infra_ready: bool,
    pub infra_error: Option<String>,
    pub ui_initialized: bool,
    pub workers: BTreeMap<String, bool>,
}

#[derive(Debug, Serialize)]
pub struct ShutdownResponse {
    pub message: String,
    pub reload: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_seconds: u64,
}

async fn running_map(state: &AppState) -> BTreeMap<String, bool> {
    state
        .supervisor
        .status()
        .await
        .into_iter()
        .map(|(name, status)| (name, status.running))
        .collect()
}

/// `GET /workers` - persisted settings and live running flags.
pub async fn list_workers(State(state): State<Arc<AppState>>) -> Json<WorkersResponse> {
    let status = running_map(&state).await;
    let settings = state.supervisor.settings().snapshot();
    Json(WorkersResponse { settings, status })
}

/// `GET /workers/status` - detailed per-job status.
pub async fn worker_details(
    State(state): State<Arc<AppState>>,
) -> Json<BTreeMap<String, JobStatus>> {
    Json(state.supervisor.status().await)
}

/// `POST /workers/{name}` - enable (start) or disable (stop) a worker.
pub async fn toggle_worker(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(payload): Json<WorkerToggle>,
) -> Result<Json<ToggleResponse>, ApiError> {
    let supervisor = &state.supervisor;

    if payload.enabled {
        let outcome = supervisor.enable(&name).await?;
        let message = match outcome {
            StartOutcome::Started => format!("Worker {} enabled", name),
            StartOutcome::AlreadyRunning => format!("Worker {} already running", name),
            StartOutcome::PreconditionFailed => {
                warn!("Refusing to enable worker {}: precondition not met", name);
                return Err(ApiError::PreconditionFailed(name));
            }
        };
        info!("Worker {} enable requested via API: {:?}", name, outcome);
        Ok(Json(ToggleResponse {
            message,
            outcome: outcome.as_str().to_string(),
        }))
    } else {
        let outcome = supervisor.disable(&name).await?;
        info!("Worker {} disable requested via API: {:?}", name, outcome);
        Ok(Json(ToggleResponse {
            message: format!("Worker {} disabled", name),
            outcome: outcome.as_str().to_string(),
        }))
    }
}

/// `POST /workers/shutdown` - reply, then drain workers and exit.
pub async fn shutdown(State(state): State<Arc<AppState>>) -> Json<ShutdownResponse> {
    warn!("Shutdown endpoint called, the service will terminate");
    state.request_shutdown();
    Json(ShutdownResponse {
        message: "Shutdown initiated, the service will exit in a few seconds".to_string(),
        reload: true,
    })
}

/// `GET /status` - readiness plus running flags for every known worker.
pub async fn system_status(State(state): State<Arc<AppState>>) -> Json<SystemStatusResponse> {
    Json(SystemStatusResponse {
        infra_ready: state.is_ready(),
        infra_error: state.startup_error(),
        ui_initialized: state.is_serving(),
        workers: running_map(&state).await,
    })
}

/// `GET /health`
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_seconds: state.uptime().as_secs(),
    })
}

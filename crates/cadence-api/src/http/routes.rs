//! HTTP route definitions.
//!
//! ```text
//! GET    /health            - Liveness and uptime
//! GET    /status            - Readiness and running flag per worker
//! GET    /workers           - Persisted settings and running flags
//! GET    /workers/status    - Detailed status per worker
//! POST   /workers/shutdown  - Drain workers and exit
//! POST   /workers/{name}    - Enable or disable a worker ({"enabled": bool})
//! ```

use std::sync::Arc;

use axum::{
    http::Method,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::http::workers;
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(workers::health))
        .route("/status", get(workers::system_status))
        .route("/workers", get(workers::list_workers))
        .route("/workers/status", get(workers::worker_details))
        .route("/workers/shutdown", post(workers::shutdown))
        .route("/workers/{name}", post(workers::toggle_worker))
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
#[path = "routes_tests.rs"]
mod tests;

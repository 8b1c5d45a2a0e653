//! # Cadence API
//!
//! Thin HTTP layer over the [`Supervisor`](cadence_core::Supervisor).
//! Handlers only translate requests into supervisor calls and outcomes
//! into status codes.

mod error;
pub mod http;
mod server;
mod state;

pub use error::ApiError;
pub use http::routes::create_router;
pub use server::{InterfaceConfig, InterfaceServer};
pub use state::AppState;

//! HTTP interface module.
//!
//! - Worker listing, toggling and shutdown
//! - Aggregated status for UIs
//! - Health check

pub mod routes;

pub(crate) mod workers;

//! Admin HTTP API
//!
//! - `GET /health` liveness probe
//! - `GET /targets` pending targets and their claim state
//! - `POST /targets` register a connection for immediate refresh
//! - `GET /operators/metrics` refresh counters

mod error;
pub mod models;
mod server;
pub mod services;
pub mod state;

pub use error::ApiError;
pub use server::{router, serve};
pub use state::AppState;

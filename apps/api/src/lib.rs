//! # Arnica API
//!
//! The HTTP layer over `arnica-core` (decisions) and `arnica-db` (storage).
//!
//! ## Layering
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Request Lifecycle                              │
//! │                                                                         │
//! │  HTTP request ──► route handler ──► repositories (arnica-db)           │
//! │                        │                                                │
//! │                        ├──► pure decisions (arnica-core)               │
//! │                        │     checkout, review, interaction screen      │
//! │                        │                                                │
//! │                        └──► ApiError ◄── CoreError / DbError           │
//! │                                                                         │
//! │  Handlers gather facts and write outcomes; they never decide.          │
//! │  The one orchestration with real sequencing (checkout) lives in        │
//! │  `services::checkout`.                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod jobs;
pub mod routes;
pub mod services;
pub mod uploads;

#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Arc;

use arnica_db::Database;

use crate::config::ApiConfig;

/// Shared application state, one `Arc` behind every handler.
pub struct AppState {
    pub db: Database,
    pub config: ApiConfig,
}

/// The handle handlers receive from axum.
pub type SharedState = Arc<AppState>;

/// Builds the full application router over the shared state.
pub fn app(state: SharedState) -> axum::Router {
    routes::api_router(state)
}

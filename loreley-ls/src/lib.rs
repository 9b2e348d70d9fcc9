//! loreley-ls library interface
//!
//! Exposes the lyrics engine (models, parsers, providers, services) and the
//! HTTP application assembly for integration testing.

pub mod api;
pub mod db;
pub mod error;
pub mod models;
pub mod parsers;
pub mod providers;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use loreley_common::events::EventBus;
use std::sync::Arc;

use crate::services::SelectionController;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Lyrics selection controller
    pub controller: Arc<SelectionController>,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Service start time, for health reporting
    pub startup_time: DateTime<Utc>,
    /// Registered provider count, for health reporting
    pub provider_count: usize,
}

impl AppState {
    pub fn new(
        controller: Arc<SelectionController>,
        event_bus: EventBus,
        provider_count: usize,
    ) -> Self {
        Self {
            controller,
            event_bus,
            startup_time: Utc::now(),
            provider_count,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .merge(api::lyrics_routes())
        .route("/lyrics/events", get(api::lyrics_event_stream))
        .merge(api::health_routes())
        .with_state(state)
}

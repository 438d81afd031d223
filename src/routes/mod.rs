// ABOUTME: Route module organization for the Magenta HTTP surface
// ABOUTME: Merges domain routers and applies request tracing and timeout layers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Magenta Agent Runtime

//! HTTP routes
//!
//! Each domain module contains only route definitions and thin handlers
//! that delegate to the service layer.

/// Conversation, turn submission, and status routes
pub mod chat;
/// Liveness and readiness probes
pub mod health;

pub use chat::ChatRoutes;
pub use health::HealthRoutes;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::resources::ServerResources;

/// Upper bound for a single HTTP request; turns run in the background
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Full application router
pub fn router(resources: Arc<ServerResources>) -> Router {
    Router::new()
        .merge(HealthRoutes::routes(Arc::clone(&resources)))
        .merge(ChatRoutes::routes(resources))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(REQUEST_TIMEOUT_SECS)))
}

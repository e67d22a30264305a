// ABOUTME: Health check route handlers for service monitoring
// ABOUTME: Liveness plus a readiness probe that exercises the database

// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use crate::constants::SERVER_VERSION;
use crate::resources::ServerResources;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;

/// Health routes implementation
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create all health check routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/health", get(Self::health))
            .route("/ready", get(Self::ready))
            .with_state(resources)
    }

    /// Liveness probe
    async fn health() -> Json<serde_json::Value> {
        Json(serde_json::json!({
            "status": "healthy",
            "version": SERVER_VERSION,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }))
    }

    /// Readiness probe; degrades when the database is unreachable
    async fn ready(State(resources): State<Arc<ServerResources>>) -> Json<serde_json::Value> {
        let database_ok = sqlx::query("SELECT 1")
            .fetch_one(resources.database.pool())
            .await
            .is_ok();

        Json(serde_json::json!({
            "status": if database_ok { "ready" } else { "degraded" },
            "database": if database_ok { "ok" } else { "unavailable" },
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }))
    }
}

//! Health check endpoints for liveness and readiness probes.

use axum::{extract::State, Json};
use mongodb::bson::doc;
use serde::Serialize;

use crate::errors::ApiResponse;
use crate::AppState;

/// Readiness probe detail.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub database: String,
    pub documents: String,
}

/// Liveness probe: always returns OK if the process is running.
pub async fn live() -> &'static str {
    "OK"
}

/// Readiness probe: checks PostgreSQL and MongoDB connectivity.
pub async fn ready(State(state): State<AppState>) -> Json<ApiResponse<HealthStatus>> {
    let database = match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => "connected",
        Err(e) => {
            tracing::warn!(error = %e, "Database health check failed");
            "error"
        }
    };

    let documents = match state.docs.run_command(doc! { "ping": 1 }).await {
        Ok(_) => "connected",
        Err(e) => {
            tracing::warn!(error = %e, "Document store health check failed");
            "error"
        }
    };

    let status = if database == "connected" && documents == "connected" {
        "ok"
    } else {
        "degraded"
    };

    ApiResponse::success(HealthStatus {
        status: status.to_string(),
        database: database.to_string(),
        documents: documents.to_string(),
    })
}

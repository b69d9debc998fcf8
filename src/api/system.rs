use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::sync::Arc;

use super::AppState;

#[derive(Debug, Serialize)]
pub struct HomeResponse {
    pub message: &'static str,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct TestDbResponse {
    pub status: &'static str,
    pub message: String,
}

/// GET /
/// Service banner.
pub async fn home() -> impl IntoResponse {
    Json(HomeResponse {
        message: "Clinical Trial API",
        status: "running",
    })
}

/// GET /testdb
/// Diagnostic round-trip through the store.
pub async fn testdb(State(state): State<Arc<AppState>>) -> Response {
    match state.store().ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(TestDbResponse {
                status: "success",
                message: format!(
                    "Connected to database: {}",
                    state.config().general.database_path
                ),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Database connectivity check failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(TestDbResponse {
                    status: "error",
                    message: "Database connection failed".to_string(),
                }),
            )
                .into_response()
        }
    }
}

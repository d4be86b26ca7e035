use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::routes::AppState;

/// GET /health - Liveness probe, also reporting the sync mode
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let mode = state.planner.mode().to_string().to_lowercase();

    (StatusCode::OK, Json(json!({"status": "ok", "mode": mode})))
}

use axum::Json;
use chrono::Local;
use serde_json::{json, Value};

/// GET /
pub async fn root_handler() -> Json<Value> {
    Json(json!({
        "message": "Resume processor API is running!",
        "status": "healthy"
    }))
}

/// GET /health
/// Liveness probe with the server's local time.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "message": "Resume processor API is working correctly",
        "timestamp": Local::now().to_rfc3339()
    }))
}

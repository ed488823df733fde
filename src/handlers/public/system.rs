use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ApiError;

/// GET / - service info
pub async fn root(State(state): State<AppState>) -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "name": "Social Media API",
        "version": version,
        "environment": format!("{:?}", state.config.environment).to_lowercase(),
        "endpoints": {
            "posts": "/posts[/:id] (reads public, writes protected)",
            "comments": "/comments[/:id] (protected)",
            "likes": "/likes[/:id] (protected, no update)",
            "health": "/health (public)",
        }
    }))
}

/// GET /health - 200 when the store answers a ping, 503 otherwise
pub async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    state.store.ping().await.map_err(|e| {
        tracing::warn!("Health check failed: {}", e);
        ApiError::service_unavailable("Database unavailable")
    })?;

    Ok(Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
        "database": "ok"
    })))
}

use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};
use tracing::warn;

use crate::state::AppState;

/// GET /health
/// Reports the service version and whether the job store can be read.
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let (status, store) = match state.store.get_all_job_names().await {
        Ok(names) => (StatusCode::OK, json!({ "status": "ok", "jobs": names.len() })),
        Err(e) => {
            warn!("Health check could not read the job store: {e}");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({ "status": "unavailable", "error": e.to_string() }),
            )
        }
    };
    let overall = if status == StatusCode::OK { "ok" } else { "degraded" };

    (
        status,
        Json(json!({
            "status": overall,
            "version": env!("CARGO_PKG_VERSION"),
            "service": "analyser-api",
            "store": store
        })),
    )
}

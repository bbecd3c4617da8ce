pub mod health;

use axum::{
    routing::{get, patch, post, put},
    Router,
};

use crate::jobs::handlers as jobs;
use crate::sheets::handlers as sheets;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Jobs API
        .route(
            "/api/v1/jobs",
            get(jobs::handle_list_jobs).post(jobs::handle_create_job),
        )
        .route("/api/v1/jobs/by-name/:name", get(jobs::handle_get_job_by_name))
        .route(
            "/api/v1/jobs/:id",
            put(jobs::handle_update_job).delete(jobs::handle_delete_job),
        )
        // Sheets API
        .route("/api/v1/sheets", get(sheets::handle_list_sheets))
        .route(
            "/api/v1/sheets/:sheet_name/candidates",
            post(sheets::handle_append_candidate),
        )
        .route(
            "/api/v1/sheets/:sheet_name/candidates/:candidate_name/analysis",
            patch(sheets::handle_update_analysis),
        )
        .with_state(state)
}

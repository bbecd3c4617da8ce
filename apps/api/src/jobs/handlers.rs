//! Axum route handlers for the Jobs API: the Create / Edit / Delete actions plus
//! the lookups the edit and delete screens need.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::errors::AppError;
use crate::jobs::factory::{CreateJobRequest, JobCreation};
use crate::models::job::{Job, JobFields};
use crate::state::AppState;
use crate::store::DeleteSummary;

/// GET /api/v1/jobs
pub async fn handle_list_jobs(State(state): State<AppState>) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(state.store.get_all_job_names().await?))
}

/// GET /api/v1/jobs/by-name/:name
pub async fn handle_get_job_by_name(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Job>, AppError> {
    state
        .store
        .get_job_by_name(&name)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Job '{name}' not found")))
}

/// POST /api/v1/jobs
///
/// Generates criteria, provisions the job's sheet and stores the job.
/// A sheet that could not be created is reported through `sheet_warning`.
pub async fn handle_create_job(
    State(state): State<AppState>,
    Json(request): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<JobCreation>), AppError> {
    let created = state.factory.create(request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /api/v1/jobs/:id
///
/// Replaces the editable fields; generated criteria are kept as they were.
pub async fn handle_update_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(fields): Json<JobFields>,
) -> Result<Json<Job>, AppError> {
    fields.validate().map_err(AppError::Validation)?;

    let existing = state
        .store
        .get_job_by_id(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))?;

    let job = Job {
        name: fields.name.trim().to_string(),
        main_activities: fields.main_activities.trim().to_string(),
        prerequisites: fields.prerequisites.trim().to_string(),
        differentials: fields.differentials.trim().to_string(),
        sheet_name: fields.sheet_name.trim().to_string(),
        ..existing
    };
    state.store.update_job(job.clone()).await?;
    Ok(Json(job))
}

/// DELETE /api/v1/jobs/:id
///
/// Removes the job with its resumes, files and analyses. Records left behind by
/// an earlier delete of the same id are purged too; 404 only when nothing matched.
pub async fn handle_delete_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteSummary>, AppError> {
    let summary = state.store.delete_job_cascade(&id).await?;
    if !summary.touched_anything() {
        return Err(AppError::NotFound(format!("Job {id} not found")));
    }
    Ok(Json(summary))
}

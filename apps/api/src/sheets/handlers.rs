//! Axum route handlers for sheet-level operations.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::errors::AppError;
use crate::sheets::candidates::{AnalysisUpdate, CandidateRow};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// GET /api/v1/sheets
///
/// Distinct sheet names referenced by stored jobs.
pub async fn handle_list_sheets(
    State(state): State<AppState>,
) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(state.store.get_all_sheet_names().await?))
}

/// POST /api/v1/sheets/:sheet_name/candidates
pub async fn handle_append_candidate(
    State(state): State<AppState>,
    Path(sheet_name): Path<String>,
    Json(candidate): Json<CandidateRow>,
) -> Result<Json<SuccessResponse>, AppError> {
    if candidate.name.trim().is_empty() {
        return Err(AppError::Validation("name cannot be empty".to_string()));
    }
    let success = state.candidates.append(&sheet_name, &candidate).await;
    Ok(Json(SuccessResponse { success }))
}

/// PATCH /api/v1/sheets/:sheet_name/candidates/:candidate_name/analysis
pub async fn handle_update_analysis(
    State(state): State<AppState>,
    Path((sheet_name, candidate_name)): Path<(String, String)>,
    Json(analysis): Json<AnalysisUpdate>,
) -> Result<Json<SuccessResponse>, AppError> {
    let success = state
        .candidates
        .update_analysis(&sheet_name, &candidate_name, &analysis)
        .await;
    Ok(Json(SuccessResponse { success }))
}

//! Candidate Row Writer: appends candidates to a job's sheet and fills in analysis cells.
//!
//! Both operations report success as a plain bool. Service errors are logged and
//! reported as `false`; a missing sheet is never created here.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::sheets::columns::{cell, AI_ANALYSIS_COLUMN, SCORE_COLUMN, STATUS_COLUMN};
use crate::sheets::{SheetsError, SpreadsheetService};

fn default_pending() -> String {
    "Pendente".to_string()
}

fn default_analysed() -> String {
    "Analisado".to_string()
}

/// One candidate, in sheet column order A..N.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateRow {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub desired_position: String,
    pub experience_years: String,
    pub education: String,
    pub languages: String,
    pub skills: String,
    pub cv_link: String,
    pub file_id: String,
    #[serde(default = "default_pending")]
    pub analysis_status: String,
    pub final_score: String,
    pub inclusion_date: String,
    pub ai_analysis: String,
}

impl CandidateRow {
    /// Cells in column order. A blank inclusion date becomes `today`.
    pub fn to_row(&self, today: &str) -> Vec<String> {
        let inclusion_date = if self.inclusion_date.trim().is_empty() {
            today.to_string()
        } else {
            self.inclusion_date.clone()
        };
        vec![
            self.name.clone(),
            self.email.clone(),
            self.phone.clone(),
            self.desired_position.clone(),
            self.experience_years.clone(),
            self.education.clone(),
            self.languages.clone(),
            self.skills.clone(),
            self.cv_link.clone(),
            self.file_id.clone(),
            self.analysis_status.clone(),
            self.final_score.clone(),
            inclusion_date,
            self.ai_analysis.clone(),
        ]
    }
}

/// Result of analysing a candidate, written to the status, score and AI-analysis cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisUpdate {
    #[serde(default = "default_analysed")]
    pub status: String,
    #[serde(default)]
    pub score: String,
    #[serde(default)]
    pub ai_analysis: String,
}

/// 1-based row of the first row whose first cell equals `candidate_name`.
/// Names are not unique; later duplicates are never reached.
pub fn find_candidate_row(rows: &[Vec<String>], candidate_name: &str) -> Option<usize> {
    rows.iter()
        .position(|row| row.first().map(String::as_str) == Some(candidate_name))
        .map(|index| index + 1)
}

pub struct CandidateRowWriter {
    service: Arc<dyn SpreadsheetService>,
}

impl CandidateRowWriter {
    pub fn new(service: Arc<dyn SpreadsheetService>) -> Self {
        Self { service }
    }

    pub async fn append(&self, sheet_name: &str, candidate: &CandidateRow) -> bool {
        match self.try_append(sheet_name, candidate).await {
            Ok(appended) => appended,
            Err(SheetsError::NotFound(_)) => {
                warn!("Cannot add candidate: spreadsheet '{sheet_name}' not found");
                false
            }
            Err(e) => {
                warn!("Failed to add candidate to '{sheet_name}': {e}");
                false
            }
        }
    }

    pub async fn update_analysis(
        &self,
        sheet_name: &str,
        candidate_name: &str,
        analysis: &AnalysisUpdate,
    ) -> bool {
        match self.try_update_analysis(sheet_name, candidate_name, analysis).await {
            Ok(updated) => updated,
            Err(e) => {
                warn!("Failed to update analysis for {candidate_name} on '{sheet_name}': {e}");
                false
            }
        }
    }

    async fn try_append(
        &self,
        sheet_name: &str,
        candidate: &CandidateRow,
    ) -> Result<bool, SheetsError> {
        let sheet = self.service.open(sheet_name).await?;
        let today = chrono::Local::now().format("%d/%m/%Y").to_string();
        let updated_rows = self.service.append_row(&sheet, candidate.to_row(&today)).await?;
        if updated_rows == Some(0) {
            warn!("Append to '{sheet_name}' reported zero updated rows");
            return Ok(false);
        }
        info!("Added candidate {} to '{sheet_name}'", candidate.name);
        Ok(true)
    }

    async fn try_update_analysis(
        &self,
        sheet_name: &str,
        candidate_name: &str,
        analysis: &AnalysisUpdate,
    ) -> Result<bool, SheetsError> {
        let sheet = self.service.open(sheet_name).await?;
        let rows = self.service.get_all_values(&sheet).await?;

        let Some(row) = find_candidate_row(&rows, candidate_name) else {
            warn!("Candidate {candidate_name} not found in '{sheet_name}'");
            return Ok(false);
        };

        let updates = [
            (STATUS_COLUMN, &analysis.status),
            (SCORE_COLUMN, &analysis.score),
            (AI_ANALYSIS_COLUMN, &analysis.ai_analysis),
        ];
        for (column, value) in updates {
            self.service
                .update_values(&sheet, &cell(column, row), vec![vec![value.clone()]])
                .await?;
        }
        info!("Updated analysis for {candidate_name} on '{sheet_name}' row {row}");
        Ok(true)
    }
}

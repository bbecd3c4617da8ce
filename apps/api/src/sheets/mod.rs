//! Spreadsheet integration: provisioning a sheet per job and writing candidate rows.
//!
//! Everything above this module talks to the spreadsheet service through the
//! `SpreadsheetService` trait. `GoogleSheetsClient` is the production backend.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod auth;
pub mod candidates;
pub mod columns;
pub mod google;
pub mod handlers;
pub mod provisioner;

#[derive(Debug, Error)]
pub enum SheetsError {
    #[error("Spreadsheet '{0}' not found")]
    NotFound(String),

    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Service rejected request (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl SheetsError {
    /// True when the service answered and refused the request.
    /// Transport, credential and decoding failures are not refusals.
    pub fn is_refusal(&self) -> bool {
        matches!(
            self,
            SheetsError::NotFound(_) | SheetsError::QuotaExceeded(_) | SheetsError::Rejected { .. }
        )
    }
}

/// Identity a spreadsheet is created or accessed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreationContext {
    /// The workspace user impersonated through domain-wide delegation.
    User,
    ServiceAccount,
}

impl CreationContext {
    /// Any failure under the impersonated user leaves the service account to try next.
    pub fn falls_back(self) -> bool {
        matches!(self, CreationContext::User)
    }
}

/// First tab of a spreadsheet; every row operation targets it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Worksheet {
    pub id: i64,
    pub title: String,
}

impl Worksheet {
    /// Qualifies an A1 range with this worksheet's title, e.g. `'Sheet1'!A1:N1`.
    pub fn range(&self, a1: &str) -> String {
        format!("'{}'!{}", self.title.replace('\'', "''"), a1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spreadsheet {
    pub id: String,
    pub name: String,
    pub url: String,
    pub worksheet: Worksheet,
    /// Identity that found or created the spreadsheet; later calls reuse it.
    pub context: CreationContext,
}

/// The external spreadsheet/drive service.
#[async_trait]
pub trait SpreadsheetService: Send + Sync {
    /// Opens a spreadsheet by display name. `SheetsError::NotFound` when absent.
    async fn open(&self, name: &str) -> Result<Spreadsheet, SheetsError>;

    async fn create(&self, name: &str, context: CreationContext)
        -> Result<Spreadsheet, SheetsError>;

    /// Grants `email` writer access.
    async fn share(&self, sheet: &Spreadsheet, email: &str) -> Result<(), SheetsError>;

    /// Overwrites `range` (A1 notation, unqualified) on the first worksheet.
    async fn update_values(
        &self,
        sheet: &Spreadsheet,
        range: &str,
        rows: Vec<Vec<String>>,
    ) -> Result<(), SheetsError>;

    /// Styles the header row, sets column widths (pixels) and freezes row 1.
    async fn format_header(
        &self,
        sheet: &Spreadsheet,
        column_widths: &[u32],
    ) -> Result<(), SheetsError>;

    /// Appends a row after the last non-empty one. Returns the updated row count
    /// when the service reports it.
    async fn append_row(
        &self,
        sheet: &Spreadsheet,
        row: Vec<String>,
    ) -> Result<Option<u32>, SheetsError>;

    async fn get_all_values(&self, sheet: &Spreadsheet) -> Result<Vec<Vec<String>>, SheetsError>;
}

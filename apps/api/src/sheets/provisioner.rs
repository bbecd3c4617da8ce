//! Sheet Provisioner: obtains a spreadsheet for a job or a manual-creation fallback.
//!
//! The provisioning plan is an ordered list of steps evaluated in sequence:
//!
//! 1. `OpenExisting` (only when the caller prefers an existing sheet)
//! 2. `Create(context)` for each configured creation context, user first
//!
//! A quota refusal on any creation step switches to one last lookup by name; if that
//! finds nothing the result is `QuotaExceeded`. When every creation step is refused
//! for another reason the result is `CreationFailed`. Any failure in the user context
//! moves on to the service account; transport and credential failures under the
//! service account propagate to the caller.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use url::form_urlencoded::byte_serialize;

use crate::sheets::columns::{column_widths_px, header_row, HEADER_RANGE};
use crate::sheets::{CreationContext, SheetsError, Spreadsheet, SpreadsheetService};

const MANUAL_CREATE_URL: &str = "https://docs.google.com/spreadsheets/create?title=";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisionOutcome {
    Created,
    Existing,
    QuotaExceeded,
    CreationFailed,
}

impl ProvisionOutcome {
    /// The caller has to create the spreadsheet by hand.
    pub fn needs_manual_creation(self) -> bool {
        matches!(
            self,
            ProvisionOutcome::QuotaExceeded | ProvisionOutcome::CreationFailed
        )
    }
}

/// Result of a provisioning attempt, echoed back to the client once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetDescriptor {
    pub name: String,
    pub url: Option<String>,
    pub id: Option<String>,
    pub worksheet_id: Option<i64>,
    pub outcome: ProvisionOutcome,
}

impl SheetDescriptor {
    fn live(sheet: &Spreadsheet, name: &str, outcome: ProvisionOutcome) -> Self {
        Self {
            name: name.to_string(),
            url: Some(sheet.url.clone()),
            id: Some(sheet.id.clone()),
            worksheet_id: Some(sheet.worksheet.id),
            outcome,
        }
    }

    fn manual(name: &str, outcome: ProvisionOutcome) -> Self {
        Self {
            name: name.to_string(),
            url: Some(manual_creation_url(name)),
            id: None,
            worksheet_id: None,
            outcome,
        }
    }
}

/// "Currículos - {job_name}", used both to look up and to create the sheet.
pub fn canonical_sheet_name(job_name: &str) -> String {
    format!("Currículos - {job_name}")
}

/// Link that opens a new spreadsheet pre-titled with `sheet_name`.
/// The title is form-encoded: spaces become `+`, reserved characters are escaped.
pub fn manual_creation_url(sheet_name: &str) -> String {
    let title: String = byte_serialize(sheet_name.as_bytes()).collect();
    format!("{MANUAL_CREATE_URL}{title}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    OpenExisting,
    Create(CreationContext),
}

pub struct SheetProvisioner {
    service: Arc<dyn SpreadsheetService>,
    creation_contexts: Vec<CreationContext>,
}

impl SheetProvisioner {
    /// `with_user_context` puts a user-owned creation attempt ahead of the
    /// service-account one.
    pub fn new(service: Arc<dyn SpreadsheetService>, with_user_context: bool) -> Self {
        let mut creation_contexts = Vec::with_capacity(2);
        if with_user_context {
            creation_contexts.push(CreationContext::User);
        }
        creation_contexts.push(CreationContext::ServiceAccount);
        Self {
            service,
            creation_contexts,
        }
    }

    fn plan(&self, prefer_existing: bool) -> Vec<Step> {
        let mut steps = Vec::with_capacity(self.creation_contexts.len() + 1);
        if prefer_existing {
            steps.push(Step::OpenExisting);
        }
        steps.extend(self.creation_contexts.iter().copied().map(Step::Create));
        steps
    }

    pub async fn provision(
        &self,
        job_name: &str,
        share_with: &str,
        prefer_existing: bool,
    ) -> Result<SheetDescriptor, SheetsError> {
        let name = canonical_sheet_name(job_name);

        for step in self.plan(prefer_existing) {
            match step {
                Step::OpenExisting => match self.service.open(&name).await {
                    Ok(sheet) => {
                        info!("Using existing spreadsheet '{name}'");
                        return Ok(SheetDescriptor::live(&sheet, &name, ProvisionOutcome::Existing));
                    }
                    Err(e) if e.is_refusal() => {
                        warn!("Spreadsheet '{name}' not available ({e}), creating a new one");
                    }
                    Err(e) => return Err(e),
                },
                Step::Create(context) => match self.service.create(&name, context).await {
                    Ok(sheet) => {
                        info!("Created spreadsheet '{name}' as {context:?}");
                        self.prepare(&sheet, share_with).await;
                        return Ok(SheetDescriptor::live(&sheet, &name, ProvisionOutcome::Created));
                    }
                    Err(SheetsError::QuotaExceeded(msg)) => {
                        warn!("Quota exceeded creating '{name}' as {context:?}: {msg}");
                        return self.after_quota(&name).await;
                    }
                    Err(e) if e.is_refusal() => {
                        warn!("Creating '{name}' as {context:?} was refused: {e}");
                    }
                    Err(e) if context.falls_back() => {
                        warn!("Creating '{name}' as {context:?} failed, trying next context: {e}");
                    }
                    Err(e) => return Err(e),
                },
            }
        }

        warn!("Could not create spreadsheet '{name}'; manual creation required");
        Ok(SheetDescriptor::manual(&name, ProvisionOutcome::CreationFailed))
    }

    async fn after_quota(&self, name: &str) -> Result<SheetDescriptor, SheetsError> {
        match self.service.open(name).await {
            Ok(sheet) => {
                info!("Quota exceeded but spreadsheet '{name}' already exists");
                Ok(SheetDescriptor::live(&sheet, name, ProvisionOutcome::Existing))
            }
            Err(e) if e.is_refusal() => {
                warn!("Spreadsheet '{name}' neither creatable nor found; manual creation required");
                Ok(SheetDescriptor::manual(name, ProvisionOutcome::QuotaExceeded))
            }
            Err(e) => Err(e),
        }
    }

    /// Share, header row and styling. Each failure is logged and skipped.
    async fn prepare(&self, sheet: &Spreadsheet, share_with: &str) {
        match self.service.share(sheet, share_with).await {
            Ok(()) => info!("Shared '{}' with {share_with}", sheet.name),
            Err(e) => warn!("Failed to share '{}' with {share_with}: {e}", sheet.name),
        }

        if let Err(e) = self
            .service
            .update_values(sheet, HEADER_RANGE, vec![header_row()])
            .await
        {
            warn!("Failed to write header row on '{}': {e}", sheet.name);
        }

        if let Err(e) = self.service.format_header(sheet, &column_widths_px()).await {
            warn!("Failed to format header row on '{}' (non-critical): {e}", sheet.name);
        }
    }
}

//! Job Factory: validates the form, generates criteria, provisions the sheet and
//! persists the job.
//!
//! Flow: validate → competence → strategies → qualifications → scoring →
//!       provision sheet → insert into the store.
//!
//! Provisioning never blocks persistence: a job is stored even when its sheet
//! has to be created by hand.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::criteria::{CriteriaGenerator, JobDescription};
use crate::errors::AppError;
use crate::models::job::{Job, JobFields};
use crate::sheets::provisioner::{SheetDescriptor, SheetProvisioner};
use crate::store::JobStore;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateJobRequest {
    #[serde(flatten)]
    pub fields: JobFields,
    /// Look for an existing "Currículos - {name}" sheet before creating one.
    #[serde(default)]
    pub use_existing_sheet: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobCreation {
    pub job: Job,
    /// Absent when provisioning failed outright and the supplied sheet name was used.
    pub sheet: Option<SheetDescriptor>,
    /// The sheet must be created manually (see `sheet.url`).
    pub sheet_warning: bool,
}

pub struct JobFactory {
    criteria: Arc<dyn CriteriaGenerator>,
    provisioner: SheetProvisioner,
    store: Arc<JobStore>,
    share_with: String,
}

impl JobFactory {
    pub fn new(
        criteria: Arc<dyn CriteriaGenerator>,
        provisioner: SheetProvisioner,
        store: Arc<JobStore>,
        share_with: String,
    ) -> Self {
        Self {
            criteria,
            provisioner,
            store,
            share_with,
        }
    }

    pub async fn create(&self, request: CreateJobRequest) -> Result<JobCreation, AppError> {
        request.fields.validate().map_err(AppError::Validation)?;
        let fields = &request.fields;
        let description = JobDescription::from(fields);

        info!("Generating criteria for job '{}'", description.job_name);
        let competence = self.criteria.create_competence(&description).await?;
        let strategies = self.criteria.create_strategies(&description).await?;
        let qualifications = self.criteria.create_qualification(&description).await?;
        let score_competence = self
            .criteria
            .score_competence(&description, &qualifications)
            .await?;

        let sheet = match self
            .provisioner
            .provision(&description.job_name, &self.share_with, request.use_existing_sheet)
            .await
        {
            Ok(descriptor) => Some(descriptor),
            Err(e) => {
                error!(
                    "Sheet provisioning failed for '{}': {e}; falling back to '{}'",
                    description.job_name, fields.sheet_name
                );
                None
            }
        };

        let sheet_warning = sheet
            .as_ref()
            .is_some_and(|s| s.outcome.needs_manual_creation());
        if let Some(descriptor) = sheet.as_ref().filter(|_| sheet_warning) {
            warn!(
                "Spreadsheet '{}' must be created manually ({:?}), share it with {}",
                descriptor.name, descriptor.outcome, self.share_with
            );
        }

        let sheet_name = sheet
            .as_ref()
            .map(|s| s.name.clone())
            .unwrap_or_else(|| fields.sheet_name.trim().to_string());

        let job = Job {
            id: Uuid::new_v4().to_string(),
            name: description.job_name.clone(),
            main_activities: description.main_activities.clone(),
            prerequisites: description.prerequisites.clone(),
            differentials: description.differentials.clone(),
            sheet_name,
            competence,
            strategies,
            qualifications,
            score_competence,
        };
        self.store.insert_job(job.clone()).await?;
        info!("Created job {} ('{}') using sheet '{}'", job.id, job.name, job.sheet_name);

        Ok(JobCreation {
            job,
            sheet,
            sheet_warning,
        })
    }
}

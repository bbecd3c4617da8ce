//! Criteria generation: the four LLM calls that turn a job description into
//! competencies, screening strategies, qualification questions and a scoring rubric.
//!
//! `JobFactory` holds an `Arc<dyn CriteriaGenerator>`; `LlmCriteriaGenerator` is the
//! production implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::llm_client::prompts::{JOB_CONTEXT_TEMPLATE, RECRUITER_JSON_SYSTEM};
use crate::llm_client::LlmClient;
use crate::models::job::{JobFields, ScoreCriterion};

pub mod prompts;

use prompts::{COMPETENCE_PROMPT, QUALIFICATION_PROMPT, SCORE_PROMPT, STRATEGIES_PROMPT};

/// The job-description mapping every criteria call receives.
#[derive(Debug, Clone, Serialize)]
pub struct JobDescription {
    pub job_name: String,
    pub main_activities: String,
    pub prerequisites: String,
    pub differentials: String,
}

impl From<&JobFields> for JobDescription {
    fn from(fields: &JobFields) -> Self {
        Self {
            job_name: fields.name.trim().to_string(),
            main_activities: fields.main_activities.trim().to_string(),
            prerequisites: fields.prerequisites.trim().to_string(),
            differentials: fields.differentials.trim().to_string(),
        }
    }
}

impl JobDescription {
    fn context_block(&self) -> String {
        JOB_CONTEXT_TEMPLATE
            .replace("{job_name}", &self.job_name)
            .replace("{main_activities}", &self.main_activities)
            .replace("{prerequisites}", &self.prerequisites)
            .replace("{differentials}", &self.differentials)
    }
}

#[async_trait]
pub trait CriteriaGenerator: Send + Sync {
    async fn create_competence(&self, job: &JobDescription) -> Result<Vec<String>, AppError>;

    async fn create_strategies(&self, job: &JobDescription) -> Result<Vec<String>, AppError>;

    async fn create_qualification(&self, job: &JobDescription) -> Result<Vec<String>, AppError>;

    /// Weighs each qualification produced by `create_qualification`.
    async fn score_competence(
        &self,
        job: &JobDescription,
        qualifications: &[String],
    ) -> Result<Vec<ScoreCriterion>, AppError>;
}

#[derive(Debug, Deserialize)]
struct ItemList {
    items: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ScoreList {
    criteria: Vec<ScoreCriterion>,
}

/// Drops blank entries and surrounding whitespace from model-produced items.
fn clean_items(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|i| i.trim().to_string())
        .filter(|i| !i.is_empty())
        .collect()
}

pub struct LlmCriteriaGenerator {
    llm: LlmClient,
}

impl LlmCriteriaGenerator {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }

    async fn items(&self, label: &str, template: &str, job: &JobDescription) -> Result<Vec<String>, AppError> {
        let prompt = template.replace("{job_context}", &job.context_block());
        let list: ItemList = self
            .llm
            .call_json(&prompt, RECRUITER_JSON_SYSTEM)
            .await
            .map_err(|e| AppError::Llm(format!("{label} generation failed: {e}")))?;
        let items = clean_items(list.items);
        info!("Generated {} {label} items for '{}'", items.len(), job.job_name);
        Ok(items)
    }
}

#[async_trait]
impl CriteriaGenerator for LlmCriteriaGenerator {
    async fn create_competence(&self, job: &JobDescription) -> Result<Vec<String>, AppError> {
        self.items("competence", COMPETENCE_PROMPT, job).await
    }

    async fn create_strategies(&self, job: &JobDescription) -> Result<Vec<String>, AppError> {
        self.items("strategy", STRATEGIES_PROMPT, job).await
    }

    async fn create_qualification(&self, job: &JobDescription) -> Result<Vec<String>, AppError> {
        self.items("qualification", QUALIFICATION_PROMPT, job).await
    }

    async fn score_competence(
        &self,
        job: &JobDescription,
        qualifications: &[String],
    ) -> Result<Vec<ScoreCriterion>, AppError> {
        let qualifications_json = serde_json::to_string_pretty(qualifications)
            .map_err(|e| AppError::Internal(e.into()))?;
        let prompt = SCORE_PROMPT
            .replace("{qualifications_json}", &qualifications_json)
            .replace("{job_context}", &job.context_block());
        let scores: ScoreList = self
            .llm
            .call_json(&prompt, RECRUITER_JSON_SYSTEM)
            .await
            .map_err(|e| AppError::Llm(format!("scoring failed: {e}")))?;
        Ok(scores.criteria)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn description() -> JobDescription {
        JobDescription {
            job_name: "Backend Engineer".to_string(),
            main_activities: "Design APIs".to_string(),
            prerequisites: "3+ years Rust".to_string(),
            differentials: "Kubernetes".to_string(),
        }
    }

    #[test]
    fn test_context_block_fills_every_placeholder() {
        let block = description().context_block();
        assert!(block.contains("VAGA: Backend Engineer"));
        assert!(block.contains("3+ years Rust"));
        assert!(!block.contains('{'));
    }

    #[test]
    fn test_every_template_has_job_context_slot() {
        for template in [COMPETENCE_PROMPT, STRATEGIES_PROMPT, QUALIFICATION_PROMPT, SCORE_PROMPT] {
            assert!(template.contains("{job_context}"));
        }
        assert!(SCORE_PROMPT.contains("{qualifications_json}"));
    }

    #[test]
    fn test_description_from_fields_trims() {
        let fields = JobFields {
            name: "  QA  ".to_string(),
            main_activities: "Test\n".to_string(),
            prerequisites: " ISTQB".to_string(),
            differentials: "Cypress ".to_string(),
            sheet_name: "S".to_string(),
        };
        let desc = JobDescription::from(&fields);
        assert_eq!(desc.job_name, "QA");
        assert_eq!(desc.prerequisites, "ISTQB");
    }

    #[test]
    fn test_clean_items_drops_blanks() {
        let items = vec![" Liderança ".to_string(), "".to_string(), "  ".to_string()];
        assert_eq!(clean_items(items), vec!["Liderança".to_string()]);
    }

    #[test]
    fn test_score_list_decodes() {
        let list: ScoreList = serde_json::from_str(
            r#"{"criteria": [{"qualification": "Rust", "weight": 60}, {"qualification": "SQL", "weight": 40}]}"#,
        )
        .unwrap();
        assert_eq!(list.criteria.iter().map(|c| c.weight).sum::<u32>(), 100);
    }
}

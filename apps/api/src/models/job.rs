use serde::{Deserialize, Serialize};

/// A single line of the scoring rubric: a qualification and the points it is worth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreCriterion {
    pub qualification: String,
    pub weight: u32,
}

/// A job opening together with the evaluation criteria generated for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub name: String,
    pub main_activities: String,
    pub prerequisites: String,
    pub differentials: String,
    pub sheet_name: String,
    #[serde(default)]
    pub competence: Vec<String>,
    #[serde(default)]
    pub strategies: Vec<String>,
    #[serde(default)]
    pub qualifications: Vec<String>,
    #[serde(default)]
    pub score_competence: Vec<ScoreCriterion>,
}

/// Free-text fields a user supplies when creating or editing a job.
#[derive(Debug, Clone, Deserialize)]
pub struct JobFields {
    pub name: String,
    pub main_activities: String,
    pub prerequisites: String,
    pub differentials: String,
    /// Used as the job's sheet name when provisioning cannot produce one.
    pub sheet_name: String,
}

impl JobFields {
    /// Rejects any field that is blank after trimming.
    pub fn validate(&self) -> Result<(), String> {
        let fields = [
            ("name", &self.name),
            ("main_activities", &self.main_activities),
            ("prerequisites", &self.prerequisites),
            ("differentials", &self.differentials),
            ("sheet_name", &self.sheet_name),
        ];
        for (label, value) in fields {
            if value.trim().is_empty() {
                return Err(format!("{label} cannot be empty"));
            }
        }
        Ok(())
    }
}

//! Document Store: a single JSON file holding jobs and the records that hang off them.
//!
//! The whole document is rewritten on every mutation: serialized into a temp file in
//! the same directory, then renamed over the target. File I/O runs on the blocking
//! pool. Access inside the process is serialized by a mutex; nothing guards against
//! a second process (last write wins).

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::models::job::Job;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed store document: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Job {0} not found")]
    JobNotFound(String),

    #[error("Store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// A row of one of the job-dependent tables (resumes, files, analysis).
/// Only `job_id` is interpreted; every other field is kept as written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependentRecord {
    pub id: String,
    pub job_id: String,
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(default)]
    jobs: Vec<Job>,
    #[serde(default)]
    resumes: Vec<DependentRecord>,
    #[serde(default)]
    files: Vec<DependentRecord>,
    #[serde(default)]
    analysis: Vec<DependentRecord>,
}

/// Which dependent table an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependentTable {
    Resumes,
    Files,
    Analysis,
}

impl StoreDocument {
    fn table_mut(&mut self, table: DependentTable) -> &mut Vec<DependentRecord> {
        match table {
            DependentTable::Resumes => &mut self.resumes,
            DependentTable::Files => &mut self.files,
            DependentTable::Analysis => &mut self.analysis,
        }
    }

    fn remove_dependents(&mut self, table: DependentTable, job_id: &str) -> usize {
        let rows = self.table_mut(table);
        let before = rows.len();
        rows.retain(|r| r.job_id != job_id);
        before - rows.len()
    }

    fn remove_job(&mut self, job_id: &str) -> DeleteSummary {
        let before = self.jobs.len();
        self.jobs.retain(|j| j.id != job_id);
        DeleteSummary {
            job_deleted: self.jobs.len() != before,
            resumes_deleted: self.remove_dependents(DependentTable::Resumes, job_id),
            files_deleted: self.remove_dependents(DependentTable::Files, job_id),
            analysis_deleted: self.remove_dependents(DependentTable::Analysis, job_id),
        }
    }
}

/// Summary of a cascading job delete.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeleteSummary {
    pub job_deleted: bool,
    pub resumes_deleted: usize,
    pub files_deleted: usize,
    pub analysis_deleted: usize,
}

impl DeleteSummary {
    pub fn touched_anything(&self) -> bool {
        self.job_deleted
            || self.resumes_deleted > 0
            || self.files_deleted > 0
            || self.analysis_deleted > 0
    }
}

pub struct JobStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JobStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn insert_job(&self, job: Job) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut doc = self.load().await?;
        info!("Inserting job {} ({})", job.id, job.name);
        doc.jobs.push(job);
        self.save(doc).await
    }

    pub async fn get_job_by_id(&self, id: &str) -> Result<Option<Job>, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.jobs.into_iter().find(|j| j.id == id))
    }

    /// Returns the first job whose name matches exactly.
    pub async fn get_job_by_name(&self, name: &str) -> Result<Option<Job>, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.jobs.into_iter().find(|j| j.name == name))
    }

    pub async fn get_all_job_names(&self) -> Result<Vec<String>, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.jobs.into_iter().map(|j| j.name).collect())
    }

    /// Distinct sheet names referenced by jobs, in insertion order.
    pub async fn get_all_sheet_names(&self) -> Result<Vec<String>, StoreError> {
        let _guard = self.lock.lock().await;
        let mut names: Vec<String> = Vec::new();
        for job in self.load().await?.jobs {
            if !names.contains(&job.sheet_name) {
                names.push(job.sheet_name);
            }
        }
        Ok(names)
    }

    /// Replaces the stored job carrying the same id.
    pub async fn update_job(&self, job: Job) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut doc = self.load().await?;
        let slot = doc
            .jobs
            .iter_mut()
            .find(|j| j.id == job.id)
            .ok_or_else(|| StoreError::JobNotFound(job.id.clone()))?;
        *slot = job;
        self.save(doc).await
    }

    pub async fn delete_job_by_id(&self, id: &str) -> Result<bool, StoreError> {
        let _guard = self.lock.lock().await;
        let mut doc = self.load().await?;
        let before = doc.jobs.len();
        doc.jobs.retain(|j| j.id != id);
        let deleted = doc.jobs.len() != before;
        if deleted {
            self.save(doc).await?;
        }
        Ok(deleted)
    }

    /// Dependent rows are written by the resume pipeline; the API only deletes them.
    #[cfg(test)]
    pub async fn insert_dependent(
        &self,
        table: DependentTable,
        record: DependentRecord,
    ) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut doc = self.load().await?;
        doc.table_mut(table).push(record);
        self.save(doc).await
    }

    pub async fn delete_all_resumes_by_job_id(&self, job_id: &str) -> Result<usize, StoreError> {
        self.delete_dependents(DependentTable::Resumes, job_id).await
    }

    pub async fn delete_all_files_by_job_id(&self, job_id: &str) -> Result<usize, StoreError> {
        self.delete_dependents(DependentTable::Files, job_id).await
    }

    pub async fn delete_all_analysis_by_job_id(&self, job_id: &str) -> Result<usize, StoreError> {
        self.delete_dependents(DependentTable::Analysis, job_id).await
    }

    /// Deletes a job and every resume, file and analysis record tied to it.
    ///
    /// All four tables change in one load/save cycle, so a failed write leaves the
    /// document as it was. Orphaned records are purged even when the job row is gone.
    pub async fn delete_job_cascade(&self, job_id: &str) -> Result<DeleteSummary, StoreError> {
        let _guard = self.lock.lock().await;
        let mut doc = self.load().await?;
        let summary = doc.remove_job(job_id);
        if summary.touched_anything() {
            self.save(doc).await?;
        }
        info!("Deleted job {job_id}: {summary:?}");
        Ok(summary)
    }

    async fn delete_dependents(
        &self,
        table: DependentTable,
        job_id: &str,
    ) -> Result<usize, StoreError> {
        let _guard = self.lock.lock().await;
        let mut doc = self.load().await?;
        let removed = doc.remove_dependents(table, job_id);
        if removed > 0 {
            self.save(doc).await?;
        }
        Ok(removed)
    }

    async fn load(&self) -> Result<StoreDocument, StoreError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || read_document(&path)).await?
    }

    async fn save(&self, doc: StoreDocument) -> Result<(), StoreError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_document(&path, &doc)).await?
    }
}

fn read_document(path: &Path) -> Result<StoreDocument, StoreError> {
    match std::fs::read(path) {
        Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(StoreDocument::default()),
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("Store file {} missing, starting empty", path.display());
            Ok(StoreDocument::default())
        }
        Err(source) => Err(StoreError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Serializes into a temp file beside `path`, then renames it over `path`.
fn write_document(path: &Path, doc: &StoreDocument) -> Result<(), StoreError> {
    let io_err = |source: std::io::Error| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
    serde_json::to_writer_pretty(&mut tmp, doc)?;
    tmp.flush().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}

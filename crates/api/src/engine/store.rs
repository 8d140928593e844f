//! Process-wide job records, owned by the server state.

use std::collections::HashMap;

use meshforge_core::error::CoreError;
use meshforge_core::job::Job;
use tokio::sync::RwLock;

/// Entity label used in not-found errors.
const JOB_ENTITY: &str = "Job";

/// In-memory map from job id to job record.
///
/// Thread-safe via interior `RwLock`; designed to be wrapped in `Arc` and
/// shared between request handlers and job workflows. Records are never
/// evicted and are lost on restart.
#[derive(Debug, Default)]
pub struct JobStore {
    jobs: RwLock<HashMap<String, Job>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new `PROCESSING` job. Fails if the id is already taken.
    pub async fn create(&self, job_id: &str, prompt: &str) -> Result<Job, CoreError> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(job_id) {
            return Err(CoreError::Conflict(format!("Job {job_id} already exists")));
        }

        let job = Job::new(prompt, chrono::Utc::now());
        jobs.insert(job_id.to_string(), job.clone());
        Ok(job)
    }

    /// Snapshot of a job record.
    pub async fn get(&self, job_id: &str) -> Result<Job, CoreError> {
        self.jobs
            .read()
            .await
            .get(job_id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound {
                entity: JOB_ENTITY,
                id: job_id.to_string(),
            })
    }

    /// Apply `mutate` to a job as one atomic step.
    ///
    /// The mutation runs on a copy under the write lock and is stored only
    /// if it returns `Ok`, so readers see either the old record or the
    /// fully updated one.
    pub async fn update<T, F>(&self, job_id: &str, mutate: F) -> Result<T, CoreError>
    where
        F: FnOnce(&mut Job) -> Result<T, CoreError>,
    {
        let mut jobs = self.jobs.write().await;
        let current = jobs.get_mut(job_id).ok_or_else(|| CoreError::NotFound {
            entity: JOB_ENTITY,
            id: job_id.to_string(),
        })?;

        let mut draft = current.clone();
        let out = mutate(&mut draft)?;
        *current = draft;
        Ok(out)
    }

    /// Number of jobs ever created in this process.
    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}

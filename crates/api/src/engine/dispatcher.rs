//! Accepts prompts and launches one background workflow per job.
//!
//! Workflows run on a [`TaskTracker`] so the number in flight is
//! observable and shutdown can wait for them. An optional semaphore caps
//! how many run at once; queued jobs stay `PROCESSING` at progress 0.

use std::sync::Arc;
use std::time::Duration;

use meshforge_core::error::CoreError;
use meshforge_core::job_id::JobIdGenerator;
use tokio::sync::Semaphore;
use tokio_util::task::TaskTracker;

use crate::engine::store::JobStore;
use crate::engine::workflow::{WorkflowEngine, WorkflowError};

pub struct JobDispatcher {
    store: Arc<JobStore>,
    engine: Arc<WorkflowEngine>,
    ids: JobIdGenerator,
    tracker: TaskTracker,
    limiter: Option<Arc<Semaphore>>,
}

impl JobDispatcher {
    /// Create a dispatcher. `max_concurrent_jobs` of `None` leaves the
    /// number of simultaneous workflows unbounded.
    pub fn new(
        store: Arc<JobStore>,
        engine: Arc<WorkflowEngine>,
        max_concurrent_jobs: Option<usize>,
    ) -> Self {
        Self {
            store,
            engine,
            ids: JobIdGenerator::new(),
            tracker: TaskTracker::new(),
            limiter: max_concurrent_jobs.map(|n| Arc::new(Semaphore::new(n.max(1)))),
        }
    }

    /// Register a job for `prompt` and start its workflow in the background.
    ///
    /// Returns as soon as the `PROCESSING` record exists; no network
    /// activity happens on the caller's task.
    pub async fn dispatch(&self, prompt: &str) -> Result<String, CoreError> {
        if prompt.trim().is_empty() {
            return Err(CoreError::Validation(
                "Missing prompt in request body".to_string(),
            ));
        }

        let job_id = self.ids.next_id();
        self.store.create(&job_id, prompt).await?;

        let engine = Arc::clone(&self.engine);
        let limiter = self.limiter.clone();
        let task_job_id = job_id.clone();
        let prompt = prompt.to_string();

        self.tracker.spawn(async move {
            let _permit = match limiter {
                Some(semaphore) => tokio::select! {
                    permit = semaphore.acquire_owned() => permit.ok(),
                    () = engine.shutdown_token().cancelled() => {
                        engine.fail_job(&task_job_id, &WorkflowError::Cancelled).await;
                        return;
                    }
                },
                None => None,
            };
            engine.run(&task_job_id, &prompt).await;
        });

        tracing::info!(job_id = %job_id, in_flight = self.tracker.len(), "Job dispatched");
        Ok(job_id)
    }

    /// Number of workflows currently running or waiting for a slot.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Close the tracker and wait up to `timeout` for running workflows.
    ///
    /// Returns `true` if every workflow finished in time. Callers cancel the
    /// engine's shutdown token first so polling loops exit promptly.
    pub async fn shutdown(&self, timeout: Duration) -> bool {
        self.tracker.close();
        tokio::time::timeout(timeout, self.tracker.wait())
            .await
            .is_ok()
    }
}

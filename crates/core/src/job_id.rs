//! Job id allocation.
//!
//! Ids look like `job_1739871234567`: a unix-millisecond token that is
//! bumped past the previous id whenever two dispatches share a
//! millisecond, so ids stay unique and strictly increasing per process.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::types::JobId;

/// Prefix shared by every job id.
pub const JOB_ID_PREFIX: &str = "job_";

/// Hands out unique, strictly increasing job ids.
#[derive(Debug, Default)]
pub struct JobIdGenerator {
    last: AtomicU64,
}

impl JobIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next id using the wall clock.
    pub fn next_id(&self) -> JobId {
        self.next_id_at(chrono::Utc::now().timestamp_millis().max(0) as u64)
    }

    /// Allocate the next id as if the clock read `now_millis`.
    pub fn next_id_at(&self, now_millis: u64) -> JobId {
        let bump = |last: u64| now_millis.max(last + 1);
        let previous = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(bump(last)))
            .unwrap_or_else(|last| last);
        format!("{JOB_ID_PREFIX}{}", bump(previous))
    }
}

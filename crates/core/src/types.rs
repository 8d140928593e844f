/// UTC timestamp used on job records.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Identifier of a generation job, e.g. `job_1739871234567`.
pub type JobId = String;

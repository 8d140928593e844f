//! Domain types shared by the meshforge crates.
//!
//! Nothing in here performs I/O: the job record and its transition rules,
//! stage and asset naming, job id allocation, and the common error type.

pub mod error;
pub mod job;
pub mod job_id;
pub mod naming;
pub mod types;

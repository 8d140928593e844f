//! Background job engine: the in-memory job store, the per-job generation
//! workflow, and the dispatcher that launches workflows.

pub mod dispatcher;
pub mod store;
pub mod workflow;

pub use dispatcher::JobDispatcher;
pub use store::JobStore;
pub use workflow::{WorkflowEngine, WorkflowError, WorkflowPhase};

use std::sync::Arc;

use meshforge_chat::{ChatBackend, DesignAssistant};
use meshforge_meshy::GenerationGateway;
use tokio_util::sync::CancellationToken;

use crate::config::ServerConfig;
use crate::engine::{JobDispatcher, JobStore, WorkflowEngine};
use crate::storage::AssetStorage;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Job records, read by the status endpoint and written by workflows.
    pub jobs: Arc<JobStore>,
    /// Launches background workflows for new prompts.
    pub dispatcher: Arc<JobDispatcher>,
    /// Downloaded model files.
    pub storage: Arc<AssetStorage>,
    /// Chat and summary proxy.
    pub assistant: DesignAssistant,
}

impl AppState {
    /// Wire the job engine and proxies together around the given upstream
    /// collaborators. Cancelling `shutdown` aborts every running workflow.
    pub fn new(
        config: ServerConfig,
        gateway: Arc<dyn GenerationGateway>,
        chat: Arc<dyn ChatBackend>,
        shutdown: CancellationToken,
    ) -> Self {
        let jobs = Arc::new(JobStore::new());
        let storage = Arc::new(AssetStorage::new(config.asset_dir.clone()));

        let engine = Arc::new(WorkflowEngine::new(
            gateway,
            Arc::clone(&jobs),
            Arc::clone(&storage),
            &config.public_base_url,
            &config.workflow,
            shutdown,
        ));
        let dispatcher = Arc::new(JobDispatcher::new(
            Arc::clone(&jobs),
            engine,
            config.workflow.max_concurrent_jobs,
        ));

        Self {
            config: Arc::new(config),
            jobs,
            dispatcher,
            storage,
            assistant: DesignAssistant::new(chat),
        }
    }
}

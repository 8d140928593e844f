#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use meshforge_api::config::{ServerConfig, WorkflowConfig};
use meshforge_api::router::build_app_router;
use meshforge_api::state::AppState;
use meshforge_chat::{ChatApiError, ChatBackend, ChatConfig, ChatMessage, Completion, SamplingParams};
use meshforge_core::job::Job;
use meshforge_meshy::{GenerationGateway, MeshyApiError, MeshyConfig, TaskSnapshot, TaskStatus};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

pub const PUBLIC_BASE_URL: &str = "http://localhost:4000";
pub const PREVIEW_TASK: &str = "preview-task";
pub const REFINE_TASK: &str = "refine-task";
pub const PREVIEW_GLB: &str = "https://assets.example.com/preview.glb";
pub const REFINED_GLB: &str = "https://assets.example.com/refined.glb";

// ---------------------------------------------------------------------------
// Config / app
// ---------------------------------------------------------------------------

/// Build a test `ServerConfig` writing assets under `asset_dir` and polling
/// every millisecond.
pub fn test_config(asset_dir: &Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["*".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        asset_dir: asset_dir.to_path_buf(),
        public_base_url: PUBLIC_BASE_URL.to_string(),
        workflow: WorkflowConfig {
            poll_interval: Duration::from_millis(1),
            max_poll_attempts: None,
            max_concurrent_jobs: None,
        },
        meshy: MeshyConfig {
            api_key: "test-meshy-key".to_string(),
            api_url: "http://127.0.0.1:9".to_string(),
        },
        chat: ChatConfig {
            api_key: "test-chat-key".to_string(),
            api_url: "http://127.0.0.1:9".to_string(),
            model: "test-model".to_string(),
        },
    }
}

/// Everything a test needs to drive the app and inspect its state.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub gateway: Arc<FakeGateway>,
    pub chat: Arc<FakeChat>,
    pub shutdown: CancellationToken,
    pub assets: tempfile::TempDir,
}

/// Build the full application router with the production middleware stack
/// around fake upstream services.
pub fn build_test_app(gateway: FakeGateway, chat: FakeChat) -> TestApp {
    build_test_app_with(gateway, chat, |_| {})
}

/// Like [`build_test_app`] but lets the caller tweak the config first.
pub fn build_test_app_with(
    gateway: FakeGateway,
    chat: FakeChat,
    tweak: impl FnOnce(&mut ServerConfig),
) -> TestApp {
    let assets = tempfile::tempdir().unwrap();
    let mut config = test_config(assets.path());
    tweak(&mut config);

    let gateway = Arc::new(gateway);
    let chat = Arc::new(chat);
    let shutdown = CancellationToken::new();

    let state = AppState::new(
        config.clone(),
        gateway.clone(),
        chat.clone(),
        shutdown.clone(),
    );
    let router = build_app_router(state.clone(), &config);

    TestApp {
        router,
        state,
        gateway,
        chat,
        shutdown,
        assets,
    }
}

// ---------------------------------------------------------------------------
// HTTP helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    post_raw(app, uri, body.to_string()).await
}

pub async fn post_raw(app: Router, uri: &str, body: String) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

// ---------------------------------------------------------------------------
// Job helpers
// ---------------------------------------------------------------------------

/// Wait (up to 5 s) until the job satisfies `done`, returning it.
pub async fn wait_for(state: &AppState, job_id: &str, done: impl Fn(&Job) -> bool) -> Job {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let job = state.jobs.get(job_id).await.unwrap();
            if done(&job) {
                return job;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("job did not reach the expected state in time")
}

pub async fn wait_terminal(state: &AppState, job_id: &str) -> Job {
    wait_for(state, job_id, Job::is_terminal).await
}

// ---------------------------------------------------------------------------
// Fake generation gateway
// ---------------------------------------------------------------------------

pub fn snapshot(status: TaskStatus, progress: f64, glb: Option<&str>) -> TaskSnapshot {
    TaskSnapshot {
        status,
        progress,
        glb_url: glb.map(String::from),
        error_message: None,
    }
}

pub fn upstream_500() -> MeshyApiError {
    MeshyApiError::ApiError {
        status: 500,
        body: "internal upstream failure".to_string(),
    }
}

/// Scripted stand-in for the text-to-3D service.
///
/// Each task id has a queue of poll results; the last one repeats once the
/// queue is drained. With a gate installed, every call first takes one
/// permit, so tests can release the workflow one step at a time.
pub struct FakeGateway {
    preview_submit: Mutex<Option<MeshyApiError>>,
    polls: Mutex<HashMap<String, VecDeque<TaskSnapshot>>>,
    assets: Mutex<HashMap<String, Vec<u8>>>,
    gate: Option<Arc<Semaphore>>,
    pub preview_submits: AtomicUsize,
    pub refine_submits: AtomicUsize,
    pub poll_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
}

impl FakeGateway {
    /// A gateway whose preview and refine tasks succeed on the first poll.
    pub fn succeeding() -> Self {
        let gateway = Self {
            preview_submit: Mutex::new(None),
            polls: Mutex::new(HashMap::new()),
            assets: Mutex::new(HashMap::new()),
            gate: None,
            preview_submits: AtomicUsize::new(0),
            refine_submits: AtomicUsize::new(0),
            poll_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
        };
        gateway
            .with_polls(
                PREVIEW_TASK,
                vec![snapshot(TaskStatus::Succeeded, 1.0, Some(PREVIEW_GLB))],
            )
            .with_polls(
                REFINE_TASK,
                vec![snapshot(TaskStatus::Succeeded, 1.0, Some(REFINED_GLB))],
            )
            .with_asset(PREVIEW_GLB, b"preview-glb-bytes")
            .with_asset(REFINED_GLB, b"refined-glb-bytes")
    }

    pub fn with_polls(self, task_id: &str, polls: Vec<TaskSnapshot>) -> Self {
        self.polls
            .lock()
            .unwrap()
            .insert(task_id.to_string(), polls.into());
        self
    }

    pub fn with_asset(self, url: &str, bytes: &[u8]) -> Self {
        self.assets
            .lock()
            .unwrap()
            .insert(url.to_string(), bytes.to_vec());
        self
    }

    pub fn failing_preview_submit(self, err: MeshyApiError) -> Self {
        *self.preview_submit.lock().unwrap() = Some(err);
        self
    }

    /// Install a gate starting with zero permits.
    pub fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(Semaphore::new(0)));
        self
    }

    /// Let `n` more gateway calls through.
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    async fn pass_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
    }
}

#[async_trait]
impl GenerationGateway for FakeGateway {
    async fn submit_preview(&self, _prompt: &str) -> Result<String, MeshyApiError> {
        self.pass_gate().await;
        self.preview_submits.fetch_add(1, Ordering::SeqCst);
        match self.preview_submit.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(PREVIEW_TASK.to_string()),
        }
    }

    async fn submit_refine(&self, preview_task_id: &str) -> Result<String, MeshyApiError> {
        self.pass_gate().await;
        self.refine_submits.fetch_add(1, Ordering::SeqCst);
        assert_eq!(preview_task_id, PREVIEW_TASK);
        Ok(REFINE_TASK.to_string())
    }

    async fn poll_status(&self, task_id: &str) -> Result<TaskSnapshot, MeshyApiError> {
        self.pass_gate().await;
        self.poll_calls.fetch_add(1, Ordering::SeqCst);
        let mut polls = self.polls.lock().unwrap();
        let queue = polls
            .get_mut(task_id)
            .ok_or_else(|| MeshyApiError::ApiError {
                status: 404,
                body: format!("unknown task {task_id}"),
            })?;
        let next = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        next.ok_or_else(|| MeshyApiError::MalformedResponse("no scripted poll".into()))
    }

    async fn fetch_asset(&self, url: &str) -> Result<Vec<u8>, MeshyApiError> {
        self.pass_gate().await;
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.assets
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or(MeshyApiError::ApiError {
                status: 404,
                body: "asset not found".to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// Fake chat backend
// ---------------------------------------------------------------------------

/// Canned chat-completion service that counts its calls.
pub struct FakeChat {
    reply: Option<String>,
    pub calls: AtomicUsize,
    pub last_messages: Mutex<Vec<ChatMessage>>,
}

impl FakeChat {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            calls: AtomicUsize::new(0),
            last_messages: Mutex::new(Vec::new()),
        }
    }

    /// A backend whose every call fails with an upstream 503.
    pub fn failing() -> Self {
        Self {
            reply: None,
            calls: AtomicUsize::new(0),
            last_messages: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatBackend for FakeChat {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        _params: SamplingParams,
    ) -> Result<Completion, ChatApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_messages.lock().unwrap() = messages.to_vec();
        match &self.reply {
            Some(reply) => Ok(Completion {
                content: reply.clone(),
                usage: 42,
            }),
            None => Err(ChatApiError::ApiError {
                status: 503,
                body: "model overloaded".to_string(),
            }),
        }
    }
}

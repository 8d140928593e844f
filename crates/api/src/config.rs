use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use meshforge_chat::ChatConfig;
use meshforge_meshy::MeshyConfig;

/// Default directory for downloaded models, relative to the working directory.
pub const DEFAULT_ASSET_DIR: &str = "generated_models";

/// Default interval between polls of an upstream task.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Server configuration loaded from environment variables.
///
/// Everything except the two API keys has a default suitable for local
/// development. The keys have no fallback and must be supplied.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `4000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    /// A `*` entry allows any origin.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `120`).
    pub request_timeout_secs: u64,
    /// How long shutdown waits for running jobs to wind down (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Directory downloaded models are written to and served from.
    pub asset_dir: PathBuf,
    /// Prefix for client-facing model URLs, without a trailing slash.
    pub public_base_url: String,
    /// Job workflow tuning.
    pub workflow: WorkflowConfig,
    /// Text-to-3D service connection.
    pub meshy: MeshyConfig,
    /// Chat-completion service connection.
    pub chat: ChatConfig,
}

/// Polling and concurrency settings for background jobs.
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Sleep between two polls of the same upstream task.
    pub poll_interval: Duration,
    /// Give up on a stage after this many polls. `None` polls forever.
    pub max_poll_attempts: Option<u32>,
    /// Cap on simultaneously running workflows. `None` is unbounded.
    pub max_concurrent_jobs: Option<usize>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_poll_attempts: None,
            max_concurrent_jobs: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                       |
    /// |-------------------------|-------------------------------|
    /// | `HOST`                  | `0.0.0.0`                     |
    /// | `PORT`                  | `4000`                        |
    /// | `CORS_ORIGINS`          | `*`                           |
    /// | `REQUEST_TIMEOUT_SECS`  | `120`                         |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `30`                          |
    /// | `ASSET_DIR`             | `generated_models`            |
    /// | `PUBLIC_BASE_URL`       | `http://localhost:{PORT}`     |
    /// | `JOB_POLL_INTERVAL_MS`  | `5000`                        |
    /// | `JOB_MAX_POLL_ATTEMPTS` | unset (poll forever)          |
    /// | `MAX_CONCURRENT_JOBS`   | unset (unbounded)             |
    ///
    /// See [`MeshyConfig::from_env`] and [`ChatConfig::from_env`] for the
    /// upstream service variables.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = env_or("PORT", 4000);

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = env_or("REQUEST_TIMEOUT_SECS", 120);
        let shutdown_timeout_secs: u64 = env_or("SHUTDOWN_TIMEOUT_SECS", 30);

        let asset_dir = PathBuf::from(
            std::env::var("ASSET_DIR").unwrap_or_else(|_| DEFAULT_ASSET_DIR.into()),
        );

        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{port}"))
            .trim_end_matches('/')
            .to_string();

        let workflow = WorkflowConfig {
            poll_interval: Duration::from_millis(env_or(
                "JOB_POLL_INTERVAL_MS",
                DEFAULT_POLL_INTERVAL.as_millis() as u64,
            )),
            max_poll_attempts: env_opt("JOB_MAX_POLL_ATTEMPTS"),
            max_concurrent_jobs: env_opt("MAX_CONCURRENT_JOBS"),
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            asset_dir,
            public_base_url,
            workflow,
            meshy: MeshyConfig::from_env(),
            chat: ChatConfig::from_env(),
        }
    }
}

/// Read and parse `name`, falling back to `default` when unset.
///
/// Panics on an unparsable value so misconfiguration fails at startup.
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env_opt(name).unwrap_or(default)
}

/// Read and parse `name`; unset or blank means `None`.
fn env_opt<T: FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => panic!("{name} has an invalid value: '{raw}'"),
    }
}

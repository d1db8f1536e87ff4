use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Process-wide settings shared by the server and the CLI.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Root directory for per-job export artifacts.
    pub export_dir: PathBuf,
    pub scraper_request_timeout_secs: u64,
    pub scraper_user_agent: String,
    /// Upper bound on in-flight product/page fetches within one job.
    pub scraper_max_concurrent_requests: usize,
    /// Deadline for a single product fetch, retries included.
    pub scraper_task_timeout_secs: u64,
    pub scraper_max_retries: u32,
    pub scraper_retry_backoff_base_secs: u64,
    /// When set, one invalid variant fails the whole export instead of being skipped.
    pub scraper_strict_variants: bool,
}

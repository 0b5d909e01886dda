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

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Path to the bundled region metadata (name, contact, color, ZIPs).
    pub regions_path: PathBuf,
    /// Path to the bundled GeoJSON catchment boundaries.
    pub boundaries_path: PathBuf,
    /// Base URL of the upstream provider search API.
    pub provider_api_url: String,
    pub http_request_timeout_secs: u64,
    pub http_user_agent: String,
    pub http_max_retries: u32,
    pub http_retry_backoff_base_secs: u64,
    /// Quiet period before a search request is actually issued.
    pub search_debounce_ms: u64,
    pub search_cache_ttl_secs: u64,
    pub search_cache_capacity: usize,
    pub locate_max_attempts: u32,
    pub locate_retry_delay_ms: u64,
}

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

/// Runtime configuration for the pipeline and its host binary.
///
/// Each `*_feed` is either an `http(s)://` URL or a path to a JSON file
/// holding the source's native records.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub dane_feed: String,
    pub camara_feed: String,
    pub alcaldia_feed: String,
    pub zones_path: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub scraper_request_timeout_secs: u64,
    pub scraper_user_agent: String,
    pub scraper_max_retries: u32,
    pub scraper_retry_backoff_base_secs: u64,
    /// Per-adapter deadline applied by the aggregator. `None` waits forever.
    pub source_timeout_secs: Option<u64>,
}

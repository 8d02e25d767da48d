use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read feed file {path}: {source}")]
    FeedIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("rate limited by {url} (retry after {retry_after_secs}s)")]
    RateLimited { url: String, retry_after_secs: u64 },

    #[error("endpoint not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid feed URL \"{feed}\": {reason}")]
    InvalidFeed { feed: String, reason: String },

    #[error("normalization error for {source_tag} record {record_id}: {reason}")]
    Normalization {
        source_tag: String,
        record_id: String,
        reason: String,
    },

    #[error("failed to serialize scraping result: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("failed to persist {filename}: {reason}")]
    Persist { filename: String, reason: String },
}

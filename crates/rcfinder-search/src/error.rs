use rcfinder_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("rate limited by provider API (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("endpoint not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid provider API base URL \"{url}\": {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error(transparent)]
    InvalidInput(#[from] CoreError),

    /// The request was superseded by a newer one before completing; its
    /// result, if any, was discarded rather than applied.
    #[error("search superseded by a newer request")]
    Superseded,

    /// Surfaced to callers attached to a shared in-flight request that
    /// failed; the original error stays with the request that issued it.
    #[error("search failed upstream: {message}")]
    Upstream { message: String },
}

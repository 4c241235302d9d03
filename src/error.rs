// src/error.rs
// =============================================================================
// Typed errors for the crawl engine.
//
// Two families:
// - FetchError: something went wrong fetching ONE page. Never fatal, the
//   dispatcher records it in the report and keeps crawling.
// - EngineError: the crawl could not start at all (bad start URL, HTTP client
//   could not be built). This is the only kind of error `crawl()` returns.
//
// The binary wraps these in anyhow, the library keeps them typed so callers
// can match on them.
// =============================================================================

use thiserror::Error;

/// Why fetching a single page failed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The URL is not http:// or https:// - no request was made
    #[error("unsupported protocol scheme '{0}'")]
    UnsupportedScheme(String),

    /// Building, sending, or timing out the request
    #[error("failed to fetch URL: {0}")]
    Request(#[source] reqwest::Error),

    /// The response arrived but its body could not be read
    #[error("failed to read response body: {0}")]
    Body(#[source] reqwest::Error),

    /// Every attempt failed; carries the error from the last one
    #[error("failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: usize,
        #[source]
        source: Box<FetchError>,
    },
}

impl FetchError {
    /// Whether trying the same URL again could possibly succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, FetchError::UnsupportedScheme(_))
    }
}

/// Errors that stop a crawl before it begins.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid start URL '{url}': {reason}")]
    InvalidStartUrl { url: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

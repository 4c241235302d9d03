// src/checker/http.rs
// =============================================================================
// This module fetches pages over HTTP.
//
// Key functionality:
// - One GET per attempt, fixed timeout, fixed User-Agent
// - Redirects are NOT followed: a 3xx is a final answer with no body parsing
// - Any other status: parse the body and pull out every link
// - Transport-level failures are retried with a linearly growing delay
// - 4xx / 5xx are never retried, they are a valid classification
//
// Rust concepts:
// - async/await: For network I/O without blocking a thread
// - Traits: PageFetcher lets the crawl engine use a fake fetcher in tests
// - Result<T, E> with `?` inside, outcome struct outside
// =============================================================================

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{redirect, Client, StatusCode};
use tracing::{debug, warn};
use url::Url;

use super::html::extract_links_from_html;
use super::resolve::resolve_links;
use crate::crawl::CrawlConfig;
use crate::error::{EngineError, FetchError};

// Everything one fetch (with or without retries) produced
//
// status_code is 0 when no response was received at all.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    /// Absolute links found on the page
    pub links: Vec<Url>,
    /// Hrefs on the page that could not be resolved
    pub malformed_links: Vec<String>,
    /// HTTP status of the last response (0 = network failure)
    pub status_code: u16,
    /// Time spent, summed across all attempts
    pub elapsed: Duration,
    /// Set when the fetch failed
    pub error: Option<FetchError>,
}

impl FetchOutcome {
    fn failed(error: FetchError, status_code: u16, elapsed: Duration) -> Self {
        Self {
            status_code,
            elapsed,
            error: Some(error),
            ..Default::default()
        }
    }
}

/// Anything that can turn a URL into a [`FetchOutcome`].
///
/// Workers only ever talk to this trait, so the engine can be driven by a
/// scripted fetcher in tests.
#[async_trait]
pub trait PageFetcher: Send + Sync + 'static {
    async fn fetch(&self, url: &Url) -> FetchOutcome;
}

/// The real fetcher: reqwest client plus the retry policy.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    max_retries: usize,
    retry_base_delay: Duration,
}

impl Fetcher {
    // Builds a fetcher from the crawl configuration
    //
    // We reuse one client for every request (connection pooling).
    pub fn new(config: &CrawlConfig) -> Result<Self, EngineError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            // 3xx must reach us untouched, we classify it ourselves
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            max_retries: config.max_retries.max(1),
            retry_base_delay: config.retry_base_delay,
        })
    }

    // Fetches a URL exactly once
    //
    // Returns: links, malformed links, status, elapsed time and error, all
    // packed into a FetchOutcome
    pub async fn fetch_once(&self, url: &Url) -> FetchOutcome {
        if url.scheme() != "http" && url.scheme() != "https" {
            return FetchOutcome::failed(
                FetchError::UnsupportedScheme(url.scheme().to_string()),
                0,
                Duration::ZERO,
            );
        }

        let start = Instant::now();
        let response = match self.client.get(url.as_str()).send().await {
            Ok(response) => response,
            Err(e) => return FetchOutcome::failed(FetchError::Request(e), 0, start.elapsed()),
        };

        let status = response.status();
        let elapsed = start.elapsed();

        // Redirect: final, nothing to parse, nothing to follow
        if status.is_redirection() {
            return FetchOutcome {
                status_code: status.as_u16(),
                elapsed,
                ..Default::default()
            };
        }

        let body = match response.text().await {
            Ok(body) => body,
            // Keep the status, lose the links
            Err(e) => return FetchOutcome::failed(FetchError::Body(e), status.as_u16(), elapsed),
        };

        let hrefs = extract_links_from_html(&body);
        let resolved = resolve_links(&hrefs, url.as_str());

        FetchOutcome {
            links: resolved.links,
            malformed_links: resolved.malformed,
            status_code: status.as_u16(),
            elapsed,
            error: None,
        }
    }

    // Fetches a URL, retrying on transport errors
    //
    // Attempt n (1-based) that fails is followed by a sleep of
    // retry_base_delay * n, so with the defaults: fail, 1s, fail, 2s, fail.
    pub async fn fetch_with_retry(&self, url: &Url) -> FetchOutcome {
        let mut total_elapsed = Duration::ZERO;
        let mut attempt = 1;

        loop {
            let mut outcome = self.fetch_once(url).await;
            total_elapsed += outcome.elapsed;
            outcome.elapsed = total_elapsed;

            let error = match outcome.error.take() {
                None => return outcome,
                Some(error) => error,
            };

            if !error.is_retryable() {
                outcome.error = Some(error);
                return outcome;
            }

            if attempt >= self.max_retries {
                warn!(%url, attempts = attempt, error = %error, "giving up on page");
                outcome.error = Some(FetchError::RetriesExhausted {
                    attempts: attempt,
                    source: Box::new(error),
                });
                return outcome;
            }

            let delay = retry_delay(self.retry_base_delay, attempt);
            debug!(%url, attempt, ?delay, error = %error, "fetch failed, retrying");
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

// Pause after failed attempt n (1-based): base * n
fn retry_delay(base: Duration, attempt: usize) -> Duration {
    base.saturating_mul(u32::try_from(attempt).unwrap_or(u32::MAX))
}

#[async_trait]
impl PageFetcher for Fetcher {
    async fn fetch(&self, url: &Url) -> FetchOutcome {
        self.fetch_with_retry(url).await
    }
}

// Human-readable reason phrase for a status code, "Unknown Status" if there
// is none (e.g. 299 or 999)
pub fn status_text(status_code: u16) -> &'static str {
    StatusCode::from_u16(status_code)
        .ok()
        .and_then(|status| status.canonical_reason())
        .unwrap_or("Unknown Status")
}

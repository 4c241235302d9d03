// src/report.rs
// =============================================================================
// Collects the outcome of every crawled page into one report.
//
// Categories:
// - Successful pages (2xx, and 3xx since redirects are not followed)
// - Failed pages, tagged Network / Client (4xx) / Server (5xx) / Unknown
// - External links (seen, never crawled)
// - Malformed links (hrefs that couldn't be resolved)
// - Dropped links (same-domain, but the task queue was full)
//
// The aggregator wraps the report in a Mutex. Only the dispatcher writes, but
// anyone holding the Arc can take a snapshot while the crawl is running.
// =============================================================================

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::checker::status_text;
use crate::crawl::CrawlResult;

/// Terminal classification of a page that did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// No usable response after all retries
    NetworkError,
    /// 4xx
    ClientError,
    /// 5xx
    ServerError,
    /// Anything outside 200-599
    UnknownStatus,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::NetworkError => "Network Error",
            ErrorKind::ClientError => "Client Error",
            ErrorKind::ServerError => "Server Error",
            ErrorKind::UnknownStatus => "Unknown Status",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlError {
    pub kind: ErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    /// Page URL -> time it took to fetch
    #[serde(serialize_with = "durations_as_millis")]
    pub successful: BTreeMap<String, Duration>,
    pub failed: BTreeMap<String, CrawlError>,
    pub external_links: BTreeSet<String>,
    pub malformed_links: BTreeSet<String>,
    /// Every URL that was scheduled for fetching
    pub visited: BTreeSet<String>,
    /// Same-domain links skipped because the task queue was full
    pub dropped: BTreeSet<String>,
}

impl Report {
    pub fn total_crawled(&self) -> usize {
        self.successful.len()
    }

    pub fn total_errors(&self) -> usize {
        self.failed.len()
    }

    // Failed pages of a single kind, in URL order
    pub fn errors_of(&self, kind: ErrorKind) -> Vec<(&str, &CrawlError)> {
        self.failed
            .iter()
            .filter(|(_, error)| error.kind == kind)
            .map(|(url, error)| (url.as_str(), error))
            .collect()
    }
}

fn durations_as_millis<S>(pages: &BTreeMap<String, Duration>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_map(pages.iter().map(|(url, elapsed)| (url, elapsed.as_millis() as u64)))
}

// Classifies a processed result, first matching rule wins:
//   error -> Network, 200..=399 -> success, 4xx -> Client, 5xx -> Server,
//   anything else -> Unknown
pub fn classify(result: &CrawlResult) -> Result<Duration, CrawlError> {
    if let Some(error) = &result.error {
        return Err(CrawlError {
            kind: ErrorKind::NetworkError,
            message: format!("Connection failed: {}", error),
        });
    }

    let code = result.status_code;
    let kind = match code {
        200..=399 => return Ok(result.elapsed),
        400..=499 => ErrorKind::ClientError,
        500..=599 => ErrorKind::ServerError,
        _ => ErrorKind::UnknownStatus,
    };
    Err(CrawlError {
        kind,
        message: format!("{} {}", code, status_text(code)),
    })
}

/// Thread-safe, shareable accumulator behind a [`Report`].
#[derive(Debug, Default)]
pub struct ReportAggregator {
    inner: Mutex<Report>,
}

impl ReportAggregator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    // A poisoned lock only means another thread panicked mid-update; the
    // collections themselves are still consistent, so keep going
    fn lock(&self) -> MutexGuard<'_, Report> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn record(&self, result: &CrawlResult) {
        let url = result.task.url.to_string();
        let mut report = self.lock();

        if result.error.is_none() {
            report
                .malformed_links
                .extend(result.malformed_links.iter().cloned());
        }

        match classify(result) {
            Ok(elapsed) => {
                report.successful.insert(url, elapsed);
            }
            Err(error) => {
                report.failed.insert(url, error);
            }
        }
    }

    pub fn mark_visited(&self, url: &str) {
        self.lock().visited.insert(url.to_string());
    }

    pub fn mark_external(&self, url: &str) {
        self.lock().external_links.insert(url.to_string());
    }

    pub fn mark_dropped(&self, url: &str) {
        self.lock().dropped.insert(url.to_string());
    }

    // Copy of the current state, for progress displays while crawling
    pub fn snapshot(&self) -> Report {
        self.lock().clone()
    }

    // Takes the final report out, leaving an empty one behind
    pub fn finalize(&self) -> Report {
        std::mem::take(&mut *self.lock())
    }
}

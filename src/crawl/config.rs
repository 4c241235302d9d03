// src/crawl/config.rs
// =============================================================================
// Knobs for one crawl.
//
// The defaults are the values the crawler has always shipped with; the CLI
// overrides a few of them (workers, buffer, timeout, verbose) from flags.
// =============================================================================

use std::time::Duration;

/// Sent as the User-Agent header on every request.
pub const DEFAULT_USER_AGENT: &str = concat!("crawlx/", env!("CARGO_PKG_VERSION"));

pub const DEFAULT_WORKERS: usize = 10;
pub const DEFAULT_BUFFER_SIZE: usize = 100;
pub const DEFAULT_MAX_RETRIES: usize = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(100);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Number of long-lived workers fetching pages
    pub workers: usize,
    /// Capacity of both the task queue and the result queue
    pub buffer_size: usize,
    /// Total attempts per page on transport errors (including the first)
    pub max_retries: usize,
    /// Delay after failed attempt n is retry_base_delay * n
    pub retry_base_delay: Duration,
    /// Pause a worker takes before each request, to go easy on the server
    pub request_delay: Duration,
    /// Per-request timeout
    pub request_timeout: Duration,
    pub user_agent: String,
    /// Print one progress line per processed page to stdout
    pub progress: bool,
    /// Show every link found on every page, not just one line per page
    pub verbose: bool,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            buffer_size: DEFAULT_BUFFER_SIZE,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay: DEFAULT_RETRY_DELAY,
            request_delay: DEFAULT_REQUEST_DELAY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            progress: false,
            verbose: false,
        }
    }
}

impl CrawlConfig {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

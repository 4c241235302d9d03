// src/crawl/mod.rs
// =============================================================================
// This module handles website crawling.
//
// Features:
// - Breadth-first crawling starting from a URL, down to a depth limit
// - Respects same-domain restriction (subdomains included, nothing else)
// - A fixed pool of workers fetching pages concurrently
// - One dispatcher deciding what gets crawled, so no page is fetched twice
// - Bounded queues: when they're full, extra links are dropped, never blocked on
// - Cancellable at any point, keeping everything recorded so far
// =============================================================================

mod config;
mod dispatcher;
mod progress;
mod task;
mod worker;

pub use config::{
    CrawlConfig, DEFAULT_BUFFER_SIZE, DEFAULT_MAX_RETRIES, DEFAULT_REQUEST_DELAY,
    DEFAULT_REQUEST_TIMEOUT, DEFAULT_RETRY_DELAY, DEFAULT_USER_AGENT, DEFAULT_WORKERS,
};
pub use dispatcher::{host_with_port, is_same_domain, Crawler};
pub use task::{CrawlResult, CrawlTask};

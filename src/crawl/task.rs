// src/crawl/task.rs
// =============================================================================
// The two messages that travel through the crawl engine's channels.
//
//   dispatcher --CrawlTask-->  workers  --CrawlResult--> dispatcher
//
// Both are moved (not cloned) into the channel, so a task or result has
// exactly one owner at any time.
// =============================================================================

use std::time::Duration;

use url::Url;

use crate::checker::FetchOutcome;
use crate::error::FetchError;

// One unit of scheduled work: a URL and how many more hops we may take from it
//
// depth counts DOWN: the start page gets max_depth, its children max_depth-1,
// and a page at depth 0 is fetched but its links are not followed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    pub url: Url,
    pub depth: usize,
}

impl CrawlTask {
    pub fn new(url: Url, depth: usize) -> Self {
        Self { url, depth }
    }

    // The task for a link found on this page, or None if we're out of depth
    pub fn child(&self, url: Url) -> Option<CrawlTask> {
        self.depth.checked_sub(1).map(|depth| CrawlTask { url, depth })
    }
}

// What a worker learned about one task
#[derive(Debug)]
pub struct CrawlResult {
    pub task: CrawlTask,
    pub links: Vec<Url>,
    pub malformed_links: Vec<String>,
    /// 0 means no response was received
    pub status_code: u16,
    pub elapsed: Duration,
    pub error: Option<FetchError>,
}

impl CrawlResult {
    pub fn new(task: CrawlTask, outcome: FetchOutcome) -> Self {
        Self {
            task,
            links: outcome.links,
            malformed_links: outcome.malformed_links,
            status_code: outcome.status_code,
            elapsed: outcome.elapsed,
            error: outcome.error,
        }
    }

    // Only successful, non-error pages with depth left may spawn children
    pub fn should_expand(&self) -> bool {
        self.error.is_none() && self.status_code < 400 && self.task.depth > 0
    }
}

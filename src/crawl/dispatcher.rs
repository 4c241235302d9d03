// src/crawl/dispatcher.rs
// =============================================================================
// The crawl engine: one dispatcher, N workers, two bounded channels.
//
//                 +------------ task queue (bounded) ------------+
//                 |                                              v
//   seed --> Dispatcher                                   Worker x N
//                 ^                                              |
//                 +----------- result queue (bounded) -----------+
//
// The dispatcher is the ONLY place that:
// - knows which URLs were already scheduled (the visited set)
// - counts how many tasks are still in flight (pending)
// - puts new tasks on the queue
//
// Each result decrements pending; each task that makes it onto the queue
// increments it. When pending hits zero nothing is in flight and nothing can
// ever be added again, so the crawl is done.
//
// Backpressure: the dispatcher never waits on a full task queue. If it did,
// it could end up waiting on workers that are themselves waiting for the
// dispatcher to take their results: deadlock. A link that doesn't fit is
// dropped (and reported) instead.
//
// Rust concepts:
// - tokio::sync::mpsc: bounded async channels
// - tokio::select!: wait on "next result" OR "cancelled", whichever first
// - Generics: Crawler<F> works with any PageFetcher
// =============================================================================

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use url::Url;

use super::config::CrawlConfig;
use super::progress::print_progress;
use super::task::{CrawlResult, CrawlTask};
use super::worker::Worker;
use crate::checker::{Fetcher, PageFetcher};
use crate::error::EngineError;
use crate::report::{Report, ReportAggregator};

// Checks if a link's host belongs to the start host
//
// "example.com" matches itself and any subdomain ("a.example.com"), but the
// leading "." keeps "notexample.com" out.
//
// Both sides are "host[:port]" (see host_with_port), so another port on the
// same machine is a different site.
//
// This is a plain suffix check: it doesn't know about public suffixes, so a
// start host of "co.uk" would accept every *.co.uk site.
pub fn is_same_domain(link_host: &str, start_host: &str) -> bool {
    link_host == start_host
        || link_host
            .strip_suffix(start_host)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

// "host" or "host:port" for a URL, None if it has no host
//
// Url::port() is None for the scheme's default port, so "http://a.com:80/"
// and "http://a.com/" give the same key.
pub fn host_with_port(url: &Url) -> Option<String> {
    let host = url.host_str().filter(|host| !host.is_empty())?;
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

/// Runs crawls. Owns the configuration, the fetcher and the report.
pub struct Crawler<F = Fetcher> {
    config: CrawlConfig,
    fetcher: Arc<F>,
    report: Arc<ReportAggregator>,
}

impl Crawler<Fetcher> {
    /// Crawler backed by a real HTTP fetcher.
    pub fn new(config: CrawlConfig) -> Result<Self, EngineError> {
        let fetcher = Fetcher::new(&config)?;
        Ok(Self::with_fetcher(config, fetcher))
    }
}

impl<F: PageFetcher> Crawler<F> {
    pub fn with_fetcher(config: CrawlConfig, fetcher: F) -> Self {
        Self {
            config,
            fetcher: Arc::new(fetcher),
            report: ReportAggregator::new(),
        }
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// Live handle to the report, readable while a crawl is running.
    pub fn report(&self) -> Arc<ReportAggregator> {
        Arc::clone(&self.report)
    }

    // Crawls from `start`, following same-domain links up to `max_depth` hops
    //
    // max_depth = 0: only the start page
    // max_depth = 1: the start page + the pages it links to
    pub async fn crawl(&mut self, start: Url, max_depth: usize) -> Result<Report, EngineError> {
        self.crawl_with_cancellation(start, max_depth, CancellationToken::new())
            .await
    }

    // Same as crawl(), but stops early when `cancel` fires
    //
    // Whatever was recorded before the cancellation is still returned.
    pub async fn crawl_with_cancellation(
        &mut self,
        start: Url,
        max_depth: usize,
        cancel: CancellationToken,
    ) -> Result<Report, EngineError> {
        let start_host = validate_start_url(&start)?;
        let buffer_size = self.config.buffer_size.max(1);

        info!(url = %start, max_depth, workers = self.config.workers, "starting crawl");

        let (task_tx, task_rx) = mpsc::channel::<CrawlTask>(buffer_size);
        let (result_tx, mut result_rx) = mpsc::channel::<CrawlResult>(buffer_size);
        let shared_tasks = Arc::new(Mutex::new(task_rx));

        let handles: Vec<_> = (0..self.config.workers.max(1))
            .map(|id| {
                let worker = Worker {
                    id,
                    fetcher: Arc::clone(&self.fetcher),
                    tasks: Arc::clone(&shared_tasks),
                    results: result_tx.clone(),
                    cancel: cancel.clone(),
                    request_delay: self.config.request_delay,
                };
                tokio::spawn(worker.run())
            })
            .collect();

        // Only workers hold result senders now, so the result queue closes
        // by itself once the last worker exits
        drop(result_tx);
        drop(shared_tasks);

        let mut dispatcher = Dispatcher {
            start_host,
            max_depth,
            verbose: self.config.verbose,
            progress: self.config.progress,
            visited: HashSet::new(),
            pending: 0,
            report: &self.report,
            tasks: task_tx,
        };
        dispatcher
            .run(CrawlTask::new(start, max_depth), &mut result_rx, &cancel)
            .await;

        // Closing the task queue lets idle workers exit
        drop(dispatcher);

        // Anything still in flight gets recorded, then the channel closes
        let mut drained = 0;
        while let Some(result) = result_rx.recv().await {
            self.report.record(&result);
            drained += 1;
        }
        if drained > 0 {
            debug!(drained, "recorded results left in the queue");
        }

        for joined in join_all(handles).await {
            if let Err(e) = joined {
                error!(error = %e, "worker task failed");
            }
        }

        let report = self.report.finalize();
        info!(
            crawled = report.total_crawled(),
            errors = report.total_errors(),
            external = report.external_links.len(),
            dropped = report.dropped.len(),
            cancelled = cancel.is_cancelled(),
            "crawl finished"
        );
        Ok(report)
    }
}

// The start URL must be http(s) with a host: it's the only thing that can
// stop a crawl before it starts
fn validate_start_url(start: &Url) -> Result<String, EngineError> {
    let invalid = |reason: &str| EngineError::InvalidStartUrl {
        url: start.to_string(),
        reason: reason.to_string(),
    };

    if start.scheme() != "http" && start.scheme() != "https" {
        return Err(invalid("scheme must be http or https"));
    }
    host_with_port(start).ok_or_else(|| invalid("missing host"))
}

// All the state of one crawl that only the dispatcher may touch
struct Dispatcher<'a> {
    start_host: String,
    max_depth: usize,
    verbose: bool,
    progress: bool,
    /// URLs already scheduled (not necessarily fetched yet)
    visited: HashSet<String>,
    /// Tasks enqueued whose result hasn't come back yet
    pending: usize,
    report: &'a ReportAggregator,
    tasks: mpsc::Sender<CrawlTask>,
}

impl Dispatcher<'_> {
    async fn run(
        &mut self,
        seed: CrawlTask,
        results: &mut mpsc::Receiver<CrawlResult>,
        cancel: &CancellationToken,
    ) {
        let seed_url = seed.url.to_string();
        self.visited.insert(seed_url.clone());
        self.pending = 1;

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            sent = self.tasks.send(seed) => {
                if sent.is_err() {
                    error!("task queue closed before the crawl started");
                    return;
                }
                self.report.mark_visited(&seed_url);
            }
        }

        while self.pending > 0 {
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(pending = self.pending, "crawl cancelled");
                    return;
                }
                result = results.recv() => match result {
                    Some(result) => result,
                    None => {
                        // Every worker is gone; nothing more will arrive
                        error!(pending = self.pending, "all workers stopped unexpectedly");
                        return;
                    }
                },
            };

            self.pending -= 1;
            self.process(result);
        }
    }

    fn process(&mut self, result: CrawlResult) {
        self.report.record(&result);
        if self.progress {
            print_progress(&result, self.max_depth, self.verbose);
        }
        debug!(
            url = %result.task.url,
            status = result.status_code,
            links = result.links.len(),
            elapsed_ms = result.elapsed.as_millis() as u64,
            pending = self.pending,
            "processed page"
        );

        if !result.should_expand() {
            return;
        }

        for link in result.links {
            let same_domain = host_with_port(&link)
                .is_some_and(|host| is_same_domain(&host, &self.start_host));

            if !same_domain {
                self.report.mark_external(link.as_str());
                continue;
            }

            if self.visited.contains(link.as_str()) {
                continue;
            }

            let Some(child) = result.task.child(link) else {
                continue;
            };
            // Marked now, at schedule time, so a link that shows up again
            // before this task is fetched is never queued twice
            let url = child.url.to_string();
            self.visited.insert(url.clone());

            match self.tasks.try_send(child) {
                Ok(()) => {
                    self.report.mark_visited(&url);
                    self.pending += 1;
                }
                Err(TrySendError::Full(_)) => {
                    warn!(%url, "task queue full, skipping link");
                    self.report.mark_dropped(&url);
                }
                Err(TrySendError::Closed(_)) => {
                    // No worker will ever take another task
                    error!(%url, "task queue closed, cannot schedule link");
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::FetchOutcome;
    use crate::error::FetchError;
    use crate::report::ErrorKind;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    // A fetcher that serves canned pages and counts every call
    #[derive(Default)]
    struct ScriptedFetcher {
        pages: HashMap<String, (u16, Vec<&'static str>)>,
        calls: StdMutex<Vec<String>>,
    }

    impl ScriptedFetcher {
        fn page(mut self, url: &str, status: u16, links: Vec<&'static str>) -> Self {
            self.pages.insert(url.to_string(), (status, links));
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageFetcher for ScriptedFetcher {
        async fn fetch(&self, url: &Url) -> FetchOutcome {
            self.calls.lock().unwrap().push(url.to_string());
            match self.pages.get(url.as_str()) {
                Some((status, links)) => FetchOutcome {
                    links: links.iter().map(|l| Url::parse(l).unwrap()).collect(),
                    status_code: *status,
                    elapsed: Duration::from_millis(1),
                    ..Default::default()
                },
                None => FetchOutcome {
                    status_code: 0,
                    error: Some(FetchError::UnsupportedScheme("test".into())),
                    ..Default::default()
                },
            }
        }
    }

    fn config() -> CrawlConfig {
        CrawlConfig::default()
            .with_workers(4)
            .with_request_delay(Duration::ZERO)
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_same_domain() {
        assert!(is_same_domain("a.example.com", "example.com"));
        assert!(is_same_domain("example.com", "example.com"));
        assert!(is_same_domain("deep.a.example.com", "example.com"));
        assert!(!is_same_domain("notexample.com", "example.com"));
        assert!(!is_same_domain("example.com", "a.example.com"));
        assert!(!is_same_domain("example.org", "example.com"));
    }

    #[test]
    fn test_host_with_port() {
        assert_eq!(
            host_with_port(&url("http://example.com:8080/a")).as_deref(),
            Some("example.com:8080")
        );
        assert_eq!(host_with_port(&url("http://example.com:80/")).as_deref(), Some("example.com"));
        assert_eq!(host_with_port(&url("https://example.com/")).as_deref(), Some("example.com"));
        assert_eq!(host_with_port(&url("mailto:a@example.com")), None);
    }

    #[test]
    fn test_same_domain_with_ports() {
        assert!(is_same_domain("example.com:8080", "example.com:8080"));
        assert!(is_same_domain("a.example.com:8080", "example.com:8080"));
        assert!(!is_same_domain("example.com:9999", "example.com:8080"));
        assert!(!is_same_domain("example.com", "example.com:8080"));
    }

    #[test]
    fn test_start_url_validation() {
        assert!(validate_start_url(&url("https://example.com/")).is_ok());
        assert!(matches!(
            validate_start_url(&url("ftp://example.com/")),
            Err(EngineError::InvalidStartUrl { .. })
        ));
        assert!(validate_start_url(&url("mailto:a@example.com")).is_err());
    }

    #[tokio::test]
    async fn test_end_to_end_two_internal_one_external() {
        let fetcher = ScriptedFetcher::default()
            .page(
                "https://example.com/",
                200,
                vec!["https://example.com/a", "https://example.com/b", "https://other.com/"],
            )
            .page("https://example.com/a", 200, vec!["https://example.com/"])
            .page("https://example.com/b", 200, vec![]);

        let mut crawler = Crawler::with_fetcher(config(), fetcher);
        let report = crawler.crawl(url("https://example.com/"), 1).await.unwrap();

        assert_eq!(report.total_crawled(), 3);
        assert_eq!(report.total_errors(), 0);
        assert_eq!(
            report.external_links.iter().collect::<Vec<_>>(),
            vec!["https://other.com/"]
        );
        assert_eq!(report.visited.len(), 3);
        assert!(report.dropped.is_empty());
    }

    #[tokio::test]
    async fn test_each_url_fetched_at_most_once() {
        // A small cycle: every page links to every other page
        let all = vec![
            "https://example.com/",
            "https://example.com/a",
            "https://example.com/b",
        ];
        let fetcher = ScriptedFetcher::default()
            .page("https://example.com/", 200, all.clone())
            .page("https://example.com/a", 200, all.clone())
            .page("https://example.com/b", 200, all.clone());

        let mut crawler = Crawler::with_fetcher(config(), fetcher);
        let report = crawler.crawl(url("https://example.com/"), 5).await.unwrap();

        let mut calls = crawler.fetcher.calls();
        calls.sort();
        let before = calls.len();
        calls.dedup();
        assert_eq!(before, calls.len(), "some URL was fetched twice");
        assert_eq!(calls.len(), 3);
        assert_eq!(report.total_crawled(), 3);
    }

    #[tokio::test]
    async fn test_depth_zero_fetches_only_start() {
        let fetcher = ScriptedFetcher::default().page(
            "https://example.com/",
            200,
            vec!["https://example.com/a", "https://other.com/"],
        );

        let mut crawler = Crawler::with_fetcher(config(), fetcher);
        let report = crawler.crawl(url("https://example.com/"), 0).await.unwrap();

        assert_eq!(crawler.fetcher.calls(), vec!["https://example.com/"]);
        assert_eq!(report.total_crawled(), 1);
        // links of a depth-0 page are not looked at, external ones included
        assert!(report.external_links.is_empty());
    }

    #[tokio::test]
    async fn test_depth_limits_chain() {
        let fetcher = ScriptedFetcher::default()
            .page("https://example.com/", 200, vec!["https://example.com/1"])
            .page("https://example.com/1", 200, vec!["https://example.com/2"])
            .page("https://example.com/2", 200, vec!["https://example.com/3"])
            .page("https://example.com/3", 200, vec![]);

        let mut crawler = Crawler::with_fetcher(config(), fetcher);
        crawler.crawl(url("https://example.com/"), 2).await.unwrap();

        let calls = crawler.fetcher.calls();
        assert_eq!(calls.len(), 3);
        assert!(!calls.contains(&"https://example.com/3".to_string()));
    }

    #[tokio::test]
    async fn test_subdomains_are_crawled() {
        let fetcher = ScriptedFetcher::default()
            .page(
                "https://example.com/",
                200,
                vec!["https://blog.example.com/", "https://notexample.com/"],
            )
            .page("https://blog.example.com/", 200, vec![]);

        let mut crawler = Crawler::with_fetcher(config(), fetcher);
        let report = crawler.crawl(url("https://example.com/"), 1).await.unwrap();

        assert!(report.successful.contains_key("https://blog.example.com/"));
        assert!(report.external_links.contains("https://notexample.com/"));
    }

    #[tokio::test]
    async fn test_other_port_is_external() {
        let fetcher = ScriptedFetcher::default()
            .page(
                "http://example.com:8080/",
                200,
                vec!["http://example.com:9999/admin", "http://example.com:8080/a"],
            )
            .page("http://example.com:8080/a", 200, vec![]);

        let mut crawler = Crawler::with_fetcher(config(), fetcher);
        let report = crawler.crawl(url("http://example.com:8080/"), 1).await.unwrap();

        let mut calls = crawler.fetcher.calls();
        calls.sort();
        assert_eq!(calls, vec!["http://example.com:8080/", "http://example.com:8080/a"]);
        assert!(report.external_links.contains("http://example.com:9999/admin"));
    }

    #[test]
    fn test_closed_task_queue_stops_scheduling() {
        let report = ReportAggregator::new();
        let (task_tx, task_rx) = mpsc::channel(4);
        drop(task_rx);

        let mut dispatcher = Dispatcher {
            start_host: "example.com".to_string(),
            max_depth: 1,
            verbose: false,
            progress: false,
            visited: HashSet::new(),
            pending: 0,
            report: &report,
            tasks: task_tx,
        };

        let page = FetchOutcome {
            links: vec![url("https://example.com/a"), url("https://example.com/b")],
            status_code: 200,
            ..Default::default()
        };
        dispatcher.process(CrawlResult::new(CrawlTask::new(url("https://example.com/"), 1), page));

        // the first link hit the closed queue, the second was never looked at
        assert_eq!(dispatcher.visited.len(), 1);
        assert!(dispatcher.visited.contains("https://example.com/a"));
        assert_eq!(dispatcher.pending, 0);
        assert!(report.snapshot().visited.is_empty());
    }

    #[tokio::test]
    async fn test_failed_pages_do_not_expand() {
        let fetcher = ScriptedFetcher::default()
            .page("https://example.com/", 200, vec!["https://example.com/404", "https://example.com/down"])
            .page("https://example.com/404", 404, vec!["https://example.com/hidden"]);

        let mut crawler = Crawler::with_fetcher(config(), fetcher);
        let report = crawler.crawl(url("https://example.com/"), 3).await.unwrap();

        assert_eq!(report.errors_of(ErrorKind::ClientError).len(), 1);
        assert_eq!(report.errors_of(ErrorKind::NetworkError).len(), 1);
        assert!(!crawler.fetcher.calls().contains(&"https://example.com/hidden".to_string()));
    }

    #[tokio::test]
    async fn test_redirect_counts_as_success() {
        let fetcher = ScriptedFetcher::default()
            .page("https://example.com/", 200, vec!["https://example.com/old"])
            .page("https://example.com/old", 301, vec![]);

        let mut crawler = Crawler::with_fetcher(config(), fetcher);
        let report = crawler.crawl(url("https://example.com/"), 2).await.unwrap();

        assert!(report.successful.contains_key("https://example.com/old"));
        assert_eq!(report.total_errors(), 0);
    }

    // current_thread runtime: the dispatcher never yields while handing out
    // children, so the one worker can't make room in the queue between sends
    #[tokio::test(flavor = "current_thread")]
    async fn test_full_queue_drops_extra_links() {
        let fetcher = ScriptedFetcher::default()
            .page(
                "https://example.com/",
                200,
                vec!["https://example.com/a", "https://example.com/b", "https://example.com/c"],
            )
            .page("https://example.com/a", 200, vec![])
            .page("https://example.com/b", 200, vec![])
            .page("https://example.com/c", 200, vec![]);

        let config = config().with_workers(1).with_buffer_size(1);
        let mut crawler = Crawler::with_fetcher(config, fetcher);

        let report = tokio::time::timeout(
            Duration::from_secs(5),
            crawler.crawl(url("https://example.com/"), 1),
        )
        .await
        .expect("crawl hung")
        .unwrap();

        assert_eq!(report.total_crawled(), 2);
        assert_eq!(report.dropped.len(), 2);
        assert_eq!(crawler.fetcher.calls().len(), 2);
        // dropped links are never retried, even though they're same-domain
        for dropped in &report.dropped {
            assert!(!report.successful.contains_key(dropped));
        }
    }

    // A fetcher that blocks forever on everything but the start page
    struct HangsAfterStart;

    #[async_trait]
    impl PageFetcher for HangsAfterStart {
        async fn fetch(&self, url: &Url) -> FetchOutcome {
            if url.path() == "/" {
                return FetchOutcome {
                    links: vec![url.join("/slow").unwrap()],
                    status_code: 200,
                    ..Default::default()
                };
            }
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_cancellation_returns_partial_report() {
        let mut crawler = Crawler::with_fetcher(config(), HangsAfterStart);
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let report = tokio::time::timeout(
            Duration::from_secs(5),
            crawler.crawl_with_cancellation(url("https://example.com/"), 3, cancel),
        )
        .await
        .expect("cancelled crawl did not return")
        .unwrap();

        assert_eq!(report.total_crawled(), 1);
        assert!(report.successful.contains_key("https://example.com/"));
        assert!(report.visited.contains("https://example.com/slow"));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let mut crawler = Crawler::with_fetcher(config(), ScriptedFetcher::default());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = crawler
            .crawl_with_cancellation(url("https://example.com/"), 2, cancel)
            .await
            .unwrap();
        assert!(report.visited.is_empty());
        assert_eq!(report.total_crawled(), 0);
        assert!(crawler.fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_crawler_is_reusable() {
        let fetcher = ScriptedFetcher::default().page("https://example.com/", 200, vec![]);
        let mut crawler = Crawler::with_fetcher(config(), fetcher);

        let first = crawler.crawl(url("https://example.com/"), 1).await.unwrap();
        let second = crawler.crawl(url("https://example.com/"), 1).await.unwrap();
        assert_eq!(first.total_crawled(), 1);
        assert_eq!(second.total_crawled(), 1);
        assert_eq!(crawler.fetcher.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_start_url_is_fatal() {
        let mut crawler = Crawler::with_fetcher(config(), ScriptedFetcher::default());
        let err = crawler.crawl(url("file:///etc/passwd"), 1).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidStartUrl { .. }));
    }
}

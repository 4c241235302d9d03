// src/lib.rs
// =============================================================================
// crawlx: a concurrent, depth-limited, same-domain web crawler.
//
// Usage from Rust:
//
//   let mut crawler = Crawler::new(CrawlConfig::default())?;
//   let report = crawler.crawl(Url::parse("https://example.com")?, 2).await?;
//   println!("{} pages crawled", report.total_crawled());
//
// Modules:
// - checker: fetch one page, extract and resolve its links
// - crawl: the worker pool + dispatcher engine
// - report: categorized outcome of every page
// - error: typed errors
// - logging: tracing setup for the binary
// =============================================================================

pub mod checker;
pub mod crawl;
pub mod error;
pub mod logging;
pub mod report;

pub use crawl::{CrawlConfig, Crawler};
pub use error::{EngineError, FetchError};
pub use report::{CrawlError, ErrorKind, Report, ReportAggregator};

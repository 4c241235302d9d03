// src/checker/mod.rs
// =============================================================================
// Everything needed to turn one URL into a list of links:
//
// - http.rs: fetch the page (timeout, retries, no redirect following)
// - html.rs: pull the raw href out of every <a> element
// - resolve.rs: make those hrefs absolute, or flag them as malformed
// =============================================================================

mod html;
mod http;
mod resolve;

pub use html::{extract_links, extract_links_from_html};
pub use http::{status_text, FetchOutcome, Fetcher, PageFetcher};
pub use resolve::{resolve, resolve_links, Resolved, ResolvedLinks};

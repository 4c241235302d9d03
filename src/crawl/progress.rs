// src/crawl/progress.rs
// =============================================================================
// One-line-per-page progress output while a crawl is running.
//
// Normal:   [200] https://example.com/docs (84ms)
// Verbose:  indented by how far from the start page we are, plus up to ten
//           of the links found on the page.
// =============================================================================

use super::task::CrawlResult;
use crate::checker::status_text;

const MAX_LINKS_SHOWN: usize = 10;

pub fn print_progress(result: &CrawlResult, max_depth: usize, verbose: bool) {
    for line in progress_lines(result, max_depth, verbose) {
        println!("{}", line);
    }
}

fn progress_lines(result: &CrawlResult, max_depth: usize, verbose: bool) -> Vec<String> {
    let url = result.task.url.as_str();
    let millis = result.elapsed.as_millis();

    if let Some(error) = &result.error {
        return vec![format!(" [FAIL] {} (Network: {})", url, error)];
    }

    if !verbose {
        return vec![format!(" [{}] {} ({}ms)", result.status_code, url, millis)];
    }

    let level = max_depth.saturating_sub(result.task.depth);
    let indent = "  ".repeat(level);
    let mut lines = vec![
        format!("{}[+] Crawling: {} (Depth {})", indent, url, level),
        format!(
            "{}  ↳ [{} {}] Found {} links ({}ms)",
            indent,
            result.status_code,
            status_text(result.status_code),
            result.links.len(),
            millis
        ),
    ];

    if result.links.is_empty() {
        return lines;
    }

    if result.links.len() <= MAX_LINKS_SHOWN {
        lines.push(format!("{}  Links found:", indent));
    } else {
        lines.push(format!(
            "{}  Links found: (showing first {} of {})",
            indent,
            MAX_LINKS_SHOWN,
            result.links.len()
        ));
    }
    for link in result.links.iter().take(MAX_LINKS_SHOWN) {
        lines.push(format!("{}    - {}", indent, link));
    }
    if result.links.len() > MAX_LINKS_SHOWN {
        lines.push(format!(
            "{}    ... and {} more",
            indent,
            result.links.len() - MAX_LINKS_SHOWN
        ));
    }
    lines
}

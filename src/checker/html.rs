// src/checker/html.rs
// =============================================================================
// This module extracts raw href values from HTML pages.
//
// We use the `scraper` crate which:
// - Parses HTML into a node tree (built on html5ever, Mozilla's HTML parser)
// - Never fails: broken markup still produces a best-effort tree
//
// We walk the tree ourselves instead of running a CSS selector: every <a>
// element's href is collected verbatim. No filtering and no resolving here,
// that's the job of resolve.rs.
//
// Rust concepts:
// - Iterators: descendants() walks the tree without recursion
// - BTreeSet: a sorted set, so duplicates collapse and output is stable
// =============================================================================

use scraper::{Html, Node};
use std::collections::BTreeSet;

// Collects the href attribute of every anchor element in a parsed document
//
// Parameters:
//   document: the parsed page (borrowed, we only read it)
//
// Returns: the set of raw href strings, exactly as written in the page
//
// Example:
//   <a href='/docs'>Docs</a><a href='/docs'>Again</a>  ->  {"/docs"}
pub fn extract_links(document: &Html) -> BTreeSet<String> {
    // descendants() keeps an explicit cursor, so deeply nested pages
    // don't grow the call stack
    document
        .tree
        .root()
        .descendants()
        .filter_map(|node| match node.value() {
            Node::Element(element) if element.name() == "a" => element.attr("href"),
            _ => None,
        })
        .map(str::to_string)
        .collect()
}

// Parses an HTML string and extracts its anchor hrefs
//
// Html is not Send, so parsing and extracting happen together in one
// synchronous call and only the owned strings come back out.
pub fn extract_links_from_html(html: &str) -> BTreeSet<String> {
    let document = Html::parse_document(html);
    extract_links(&document)
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why not Selector::parse("a[href]")?
//    - It works too, but it hides the traversal and needs an unwrap() on the
//      selector. Matching on Node::Element is just as short.
//
// 2. Why is Html not Send?
//    - It uses reference-counted strings (tendril) internally.
//    - That means we must never hold it across an .await in async code,
//      otherwise the future can't move between threads.
// -----------------------------------------------------------------------------

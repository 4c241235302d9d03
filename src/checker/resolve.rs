// src/checker/resolve.rs
// =============================================================================
// Turns raw href values into absolute URLs.
//
// Rules:
// - An href that already has a host (https://other.com/x) is kept as-is.
//   We don't re-resolve it against the page, so the page's scheme is never
//   forced onto a fully-qualified external link.
// - Anything else is resolved against the page URL with RFC 3986 rules
//   (Url::join handles "..", ".", query and fragment).
// - Anything we can't make sense of is reported back as malformed instead of
//   being silently dropped.
//
// Rust concepts:
// - Enums with data: Resolved carries either a Url or the raw string
// - Pattern matching on Result with specific error variants
// =============================================================================

use url::{ParseError, Url};

/// Outcome of resolving one href.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// Absolute URL, ready to be crawled or recorded
    Link(Url),
    /// The raw href, which could not be parsed or resolved
    Malformed(String),
}

/// The two disjoint outputs of resolving a whole page worth of hrefs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedLinks {
    pub links: Vec<Url>,
    pub malformed: Vec<String>,
}

// Resolves one href against an already-parsed page URL
//
// Example:
//   resolve("/x", https://a.com/dir/page)       -> Link(https://a.com/x)
//   resolve("https://b.com/y", <anything>)      -> Link(https://b.com/y)
//   resolve("http://[::1", <anything>)          -> Malformed("http://[::1")
pub fn resolve(raw_href: &str, page_url: &Url) -> Resolved {
    resolve_against(raw_href, Some(page_url))
}

// Resolves every href found on a page
//
// The page URL is taken as a string: if it doesn't parse, every relative href
// on that page is unresolvable and ends up in `malformed`.
pub fn resolve_links<I, S>(hrefs: I, page_url: &str) -> ResolvedLinks
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let base = match Url::parse(page_url) {
        Ok(url) => Some(url),
        Err(e) => {
            tracing::warn!(page_url, error = %e, "invalid base URL, relative links are unresolvable");
            None
        }
    };

    let mut resolved = ResolvedLinks::default();
    for href in hrefs {
        match resolve_against(href.as_ref(), base.as_ref()) {
            Resolved::Link(url) => resolved.links.push(url),
            Resolved::Malformed(raw) => resolved.malformed.push(raw),
        }
    }
    resolved
}

fn resolve_against(raw_href: &str, base: Option<&Url>) -> Resolved {
    match Url::parse(raw_href) {
        // Already absolute (https://b.com/y, but also mailto:, javascript:):
        // joining against the base would return it unchanged anyway
        Ok(url) => Resolved::Link(url),
        Err(ParseError::RelativeUrlWithoutBase) => match base {
            Some(base) => match base.join(raw_href) {
                Ok(url) => Resolved::Link(url),
                Err(_) => Resolved::Malformed(raw_href.to_string()),
            },
            None => Resolved::Malformed(raw_href.to_string()),
        },
        Err(_) => Resolved::Malformed(raw_href.to_string()),
    }
}

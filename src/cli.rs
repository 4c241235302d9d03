// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate, and
// the checks a start URL must pass before we crawl anything.
//
// clap's "derive" API lets us describe the CLI as a plain struct; each field
// becomes a flag.
//
// Rust concepts:
// - Structs: Custom data types that group related data
// - Derive macros: Automatically generate parsing code for our types
// - Result<T, E>: validate_start_url either hands back a Url or says why not
// =============================================================================

use std::net::Ipv4Addr;

use anyhow::{bail, Context, Result};
use clap::Parser;
use url::Url;

use crawlx::crawl::{DEFAULT_BUFFER_SIZE, DEFAULT_WORKERS};

#[derive(Parser, Debug)]
#[command(
    name = "crawlx",
    version,
    about = "A fast, concurrent web crawler",
    long_about = "crawlx crawls a website breadth-first, staying on the same domain, and reports \
                  which pages worked, which failed (and why), and which links point elsewhere.",
    after_help = "EXAMPLES:\n  crawlx -u https://example.com -d 3\n  crawlx -u https://toscrape.com -d 2 --verbose\n  crawlx -u http://127.0.0.1:8000 -d 1 --allow-ip"
)]
pub struct Cli {
    /// The starting URL to crawl (e.g., https://example.com)
    #[arg(short, long)]
    pub url: String,

    /// Maximum crawl depth
    ///
    /// Depth 0 = just the starting page
    /// Depth 1 = starting page + all pages it links to
    /// etc.
    #[arg(short, long, default_value_t = 2)]
    pub depth: usize,

    /// Show detailed crawl progress, including the links found on each page
    #[arg(short, long)]
    pub verbose: bool,

    /// Allow crawling a host that is an IP address
    #[arg(short = 'i', long)]
    pub allow_ip: bool,

    /// Output the final report as JSON instead of text
    #[arg(long)]
    pub json: bool,

    /// Number of pages fetched concurrently
    #[arg(short, long, default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,

    /// Capacity of the task and result queues
    #[arg(long, default_value_t = DEFAULT_BUFFER_SIZE)]
    pub buffer: usize,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 20)]
    pub timeout: u64,
}

// Performs all pre-flight checks on the user-provided URL
//
// Rejects:
// - empty input, or more than one "://"
// - anything that isn't http:// or https://
// - a missing host
// - a bare IPv4 host, unless allow_ip is set
// - a host without a "." (like "localhost") or with a numeric TLD
pub fn validate_start_url(raw_url: &str, allow_ip: bool) -> Result<Url> {
    if raw_url.is_empty() {
        bail!("the --url flag is required");
    }

    if raw_url.matches("://").count() > 1 {
        bail!("malformed URL: multiple '://' sequences found");
    }

    let url = Url::parse(raw_url).with_context(|| format!("could not parse URL '{}'", raw_url))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        bail!("invalid URL scheme, please use http:// or https://");
    }

    let host = match url.host_str() {
        Some(host) if !host.is_empty() => host,
        _ => bail!("invalid URL, the host (domain name) is missing"),
    };

    if host.parse::<Ipv4Addr>().is_ok() {
        if !allow_ip {
            bail!("crawling IP addresses is not allowed, use the --allow-ip flag to enable");
        }
        return Ok(url);
    }

    let Some((_, tld)) = host.rsplit_once('.') else {
        bail!("invalid domain name, host must contain a '.'");
    };
    if tld.is_empty() {
        bail!("invalid domain name");
    }
    if tld.parse::<u64>().is_ok() {
        bail!("invalid TLD '{}', cannot be a number", tld);
    }

    Ok(url)
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why doesn't the crawler itself do all these checks?
//    - The engine only needs "http(s) with a host" to work correctly.
//    - Rules like "no bare IPs" are a policy of this CLI, not of crawling.
//
// 2. What is `let ... else`?
//    - Pattern match, and if it doesn't match, run the else block
//    - The else block must leave the function (here: bail! returns Err)
//
// 3. Why parse into Ipv4Addr instead of a regex?
//    - The standard library already knows what a valid IPv4 address is.
//    - Note that the url crate normalizes hosts like "127.1" to "127.0.0.1".
// -----------------------------------------------------------------------------

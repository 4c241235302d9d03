// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Validate the start URL (the only thing that can stop us early)
// 3. Run the crawl, with Ctrl-C wired to a cancellation token
// 4. Print the report (text or JSON)
// 5. Exit with proper code (0 = all pages OK, 1 = failed pages, 2 = error)
//
// Rust concepts used:
// - async/await: the crawl engine runs on the tokio runtime
// - Result<T, E>: For error handling (T = success type, E = error type)
// - Arc + CancellationToken: share a "stop now" signal with a signal handler
// =============================================================================

mod cli;

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;

use cli::{validate_start_url, Cli};
use crawlx::logging::init_logging;
use crawlx::{CrawlConfig, CrawlError, Crawler, ErrorKind, Report};

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            // {:#} prints the whole context chain on one line
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Returns:
//   Ok(0) = every crawled page succeeded
//   Ok(1) = at least one page failed
//   Err   = invalid input or an internal error (exit code 2)
async fn run() -> Result<i32> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;

    let start_url = validate_start_url(&cli.url, cli.allow_ip)?;

    let config = CrawlConfig::default()
        .with_workers(cli.workers)
        .with_buffer_size(cli.buffer)
        .with_request_timeout(Duration::from_secs(cli.timeout))
        .with_progress(!cli.json)
        .with_verbose(cli.verbose);

    let mut crawler = Crawler::new(config).context("failed to set up the crawler")?;

    // Ctrl-C stops the crawl but still gives us the partial report
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nInterrupted, finishing up...");
            on_interrupt.cancel();
        }
    });

    if !cli.json {
        println!("Crawling {} (depth: {})", start_url, cli.depth);
    }

    let started = Instant::now();
    let report = crawler
        .crawl_with_cancellation(start_url, cli.depth, cancel)
        .await?;
    let elapsed = started.elapsed();

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, elapsed);
    }

    if report.total_errors() > 0 {
        Ok(1)
    } else {
        Ok(0)
    }
}

// Prints the final report as sections, skipping empty ones
fn print_report(report: &Report, elapsed: Duration) {
    let rule = "=".repeat(60);

    println!();
    println!("{}", rule);
    println!("{:^60}", "CRAWL REPORT");
    println!("{}", rule);

    println!(
        "\nScan completed............ Crawled {} pages in {:.3}s",
        report.total_crawled(),
        elapsed.as_secs_f64()
    );
    println!(
        "Total: {} | ✅ Success: {} | ❌ Errors: {}\n",
        report.visited.len(),
        report.total_crawled(),
        report.total_errors()
    );

    if !report.successful.is_empty() {
        println!("Successful Pages ({}):", report.successful.len());
        for (url, took) in &report.successful {
            println!("-  {} ({}ms)", url, took.as_millis());
        }
        println!();
    }

    print_errors(report, ErrorKind::ClientError, "Client Errors - 4xx");
    print_errors(report, ErrorKind::ServerError, "Server Errors - 5xx");
    print_errors(report, ErrorKind::NetworkError, "Network Errors");
    print_errors(report, ErrorKind::UnknownStatus, "Unknown Status Codes");

    print_links("External Links", report.external_links.iter());
    print_links("Malformed Links", report.malformed_links.iter());
    print_links("Skipped Links (queue full)", report.dropped.iter());

    println!("{}", rule);
}

fn print_errors(report: &Report, kind: ErrorKind, title: &str) {
    let errors: Vec<(&str, &CrawlError)> = report.errors_of(kind);
    if errors.is_empty() {
        return;
    }

    println!("{} ({}):", title, errors.len());
    for (url, error) in errors {
        println!("-  {} ({})", url, error.message);
    }
    println!();
}

fn print_links<'a>(title: &str, links: impl ExactSizeIterator<Item = &'a String>) {
    if links.len() == 0 {
        return;
    }

    println!("{} ({}):", title, links.len());
    for link in links {
        println!("-  {}", link);
    }
    println!();
}

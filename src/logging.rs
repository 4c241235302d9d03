// src/logging.rs
// =============================================================================
// Sets up tracing output for the CLI.
//
// - Logs go to stderr so stdout stays clean for progress lines and --json
// - RUST_LOG wins if it's set (e.g. RUST_LOG=crawlx=trace)
// - Otherwise warnings only, or debug for our own crate with --verbose
// =============================================================================

use anyhow::Result;
use tracing_subscriber::{fmt, EnvFilter};

pub fn init_logging(verbose: bool) -> Result<()> {
    let default_directive = if verbose { "warn,crawlx=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))?;

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;

    Ok(())
}

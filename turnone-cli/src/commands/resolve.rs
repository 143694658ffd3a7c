//! Resolve Command
//!
//! Prints the feed endpoint for the configured origin.

use anyhow::Result;
use turnone_core::FeedConfig;

/// Prints the WebSocket URL the origin resolves to.
pub fn run(config: &FeedConfig) -> Result<()> {
    let url = config.feed_url()?;
    println!("{}", url);
    Ok(())
}

//! Main entry point for the Activity Timeline MCP server
//!
//! Sets up logging, reads configuration from the environment and the
//! command line, optionally seeds the session from a snapshot, and serves
//! MCP over stdin/stdout.

use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use activity_timeline::{parse_day_zone, ActivityTimelineServer, TimelineConfig};

/// Command line arguments for the Activity Timeline MCP server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON file shaped like an activities page response to start from
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Zone days are grouped in, e.g. "+02:00", "-0500", "UTC" or "local"
    /// Overrides ACTIVITY_TIMELINE_UTC_OFFSET
    #[arg(long)]
    utc_offset: Option<String>,

    /// Days shown by activity_list when not asked otherwise
    #[arg(long)]
    list_days: Option<u32>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable verbose output (implies debug)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let log_level = if args.verbose {
        "debug"
    } else if args.debug {
        "info"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(format!("activity_timeline={}", log_level))
        .with_writer(std::io::stderr) // stdout carries the protocol
        .init();

    info!("Starting Activity Timeline MCP server");

    let mut config = TimelineConfig::from_env()?;
    if let Some(offset) = &args.utc_offset {
        config.zone = parse_day_zone(offset)?;
    }
    if let Some(days) = args.list_days.filter(|d| *d > 0) {
        config.list_days = days;
    }

    let mut server = ActivityTimelineServer::new(config);
    if let Some(path) = &args.snapshot {
        let count = server.load_snapshot(path)?;
        info!("Seeded session with {} activities", count);
    }

    server.run().await?;

    info!("Activity Timeline MCP server shutdown complete");
    Ok(())
}

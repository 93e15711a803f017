//! Public library interface for the Activity Timeline MCP server
//!
//! This module exports the timeline index, the session feed around it and
//! the MCP server that exposes both as tools.

use std::path::Path;

use thiserror::Error;

// Internal modules
mod analytics;
mod config;
mod display;
mod domain;
mod feed;
mod mcp;
mod timeline;
mod tools;

#[cfg(test)]
mod test_utils;

// Re-export public modules and types
pub use analytics::{AnalyticsEngine, RawStats, StatsTable, TypeStats};
pub use config::{parse_day_zone, ConfigError, TimelineConfig, LIST_DAYS_VAR, UTC_OFFSET_VAR};
pub use display::{
    format_amount, format_interval, format_time_ago, render_day, render_record, ActivityCatalog,
    ActivityInfo,
};
pub use domain::*;
pub use feed::{
    ActivityFeed, DeleteResponse, DeletedRef, FeedError, FetchResponse, MutationResponse,
    ResponseStatus, VisibleDay,
};
pub use mcp::protocol::{error_codes, JsonRpcResponse};
pub use mcp::McpServer;
pub use timeline::{DayAmounts, DayGroup, DayNode, TimelineIndex};
pub use tools::ToolError;

/// Errors that can occur during server operation
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Feed error: {0}")]
    Feed(#[from] feed::FeedError),

    #[error("Domain validation error: {0}")]
    Domain(#[from] domain::DomainError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Activity timeline session served over MCP
///
/// Holds one in-memory feed for the lifetime of the process. The feed can
/// be seeded from a snapshot of an API page response.
pub struct ActivityTimelineServer {
    feed: ActivityFeed,
    analytics: AnalyticsEngine,
    catalog: ActivityCatalog,
    config: TimelineConfig,
}

impl ActivityTimelineServer {
    /// Create a server with an empty feed
    pub fn new(config: TimelineConfig) -> Self {
        tracing::info!(
            "Initializing Activity Timeline server (days grouped in {})",
            config.zone
        );

        Self {
            feed: ActivityFeed::new(config.zone),
            analytics: AnalyticsEngine::new(),
            catalog: ActivityCatalog::standard(),
            config,
        }
    }

    /// Seed the feed from a JSON file shaped like a page fetch response
    ///
    /// Returns how many records the snapshot carried.
    pub fn load_snapshot(&mut self, path: &Path) -> Result<usize, ServerError> {
        tracing::info!("Loading snapshot from {}", path.display());

        let contents = std::fs::read_to_string(path)?;
        let response: FetchResponse = serde_json::from_str(&contents)?;

        self.feed.begin_request()?;
        let count = self.feed.apply_fetch(response, None)?;
        tracing::info!(
            "Snapshot loaded: {} records over {} days",
            self.feed.index().len(),
            self.feed.index().nodes().len()
        );
        Ok(count)
    }

    /// Run the MCP server, handling JSON-RPC requests over stdin/stdout
    ///
    /// Returns once stdin is closed.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!(
            "Starting MCP server with {} activities in session",
            self.feed.index().len()
        );

        let mut mcp_server = mcp::McpServer::new(self);
        mcp_server.run().await?;

        Ok(())
    }

    pub fn feed(&self) -> &ActivityFeed {
        &self.feed
    }

    pub fn feed_mut(&mut self) -> &mut ActivityFeed {
        &mut self.feed
    }

    /// Mutable feed together with the catalog, for tools that need both
    pub fn feed_and_catalog_mut(&mut self) -> (&mut ActivityFeed, &ActivityCatalog) {
        (&mut self.feed, &self.catalog)
    }

    /// Get a reference to the analytics engine
    pub fn analytics(&self) -> &AnalyticsEngine {
        &self.analytics
    }

    pub fn catalog(&self) -> &ActivityCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &TimelineConfig {
        &self.config
    }
}

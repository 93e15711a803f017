//! Tool for checking the most recent activity
//!
//! This module implements the activity_latest MCP tool.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::display::{format_time_ago, render_record, ActivityCatalog};
use crate::domain::{ActivityType, Record};
use crate::feed::ActivityFeed;
use crate::tools::ToolError;

/// Parameters for the latest-activity lookup
#[derive(Debug, Default, Deserialize)]
pub struct LatestActivityParams {
    /// Restrict to one type; any type when omitted
    #[serde(rename = "type")]
    pub activity_type: Option<String>,
}

/// Response from the latest-activity lookup
#[derive(Debug, Serialize)]
pub struct LatestActivityResponse {
    pub found: bool,
    pub record: Option<Record>,
    pub time_ago: Option<String>,
    pub message: String,
}

pub fn latest_activity(
    feed: &ActivityFeed,
    catalog: &ActivityCatalog,
    params: LatestActivityParams,
    now: DateTime<Utc>,
) -> Result<LatestActivityResponse, ToolError> {
    let kind = ActivityType::parse_optional(params.activity_type.as_deref())?;

    let Some(record) = feed.index().latest_of(kind).cloned() else {
        let what = match kind {
            Some(kind) => catalog.plural_label(kind).to_lowercase(),
            None => "activities".to_string(),
        };
        return Ok(LatestActivityResponse {
            found: false,
            record: None,
            time_ago: None,
            message: format!("No {} logged yet.", what),
        });
    };

    let time_ago = format_time_ago(record.date_time, now);
    let message = format!(
        "⏱️ Last {}: {}\n{}",
        catalog.label(record.kind).to_lowercase(),
        time_ago,
        render_record(&record, catalog, &feed.zone())
    );

    Ok(LatestActivityResponse {
        found: true,
        record: Some(record),
        time_ago: Some(time_ago),
        message,
    })
}

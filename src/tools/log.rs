//! Tool for logging a new activity
//!
//! This module implements the activity_log MCP tool.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::display::{format_amount, format_interval, ActivityCatalog};
use crate::domain::{parse_timestamp, ActivityType, Interval, Record, RecordId};
use crate::feed::ActivityFeed;
use crate::tools::ToolError;

const MAX_NOTES_LEN: usize = 500;

/// Parameters for logging an activity
#[derive(Debug, Deserialize)]
pub struct LogActivityParams {
    #[serde(rename = "type")]
    pub activity_type: String,
    /// When it happened, defaults to now
    pub date_time: Option<String>,
    pub amount: Option<f64>,
    pub notes: Option<String>,
}

/// Response from logging an activity
#[derive(Debug, Serialize)]
pub struct LogActivityResponse {
    pub success: bool,
    pub record_id: String,
    pub message: String,
    pub record: Record,
}

/// Log an activity into the session feed
pub fn log_activity(
    feed: &mut ActivityFeed,
    catalog: &ActivityCatalog,
    params: LogActivityParams,
    now: DateTime<Utc>,
) -> Result<LogActivityResponse, ToolError> {
    let kind: ActivityType = params.activity_type.parse()?;

    let date_time = match params.date_time.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => parse_timestamp(value, &feed.zone())?,
        _ => now,
    };

    if let Some(notes) = &params.notes {
        if notes.len() > MAX_NOTES_LEN {
            return Err(ToolError::Validation {
                message: format!("Notes too long (max {} characters)", MAX_NOTES_LEN),
            });
        }
    }
    if params.amount.is_some() && !kind.is_quantity_bearing() {
        return Err(ToolError::Validation {
            message: format!("{} entries don't take an amount", catalog.label(Some(kind))),
        });
    }

    let record = Record::new(
        RecordId::generate(),
        date_time,
        Some(kind),
        params.amount,
        params.notes,
    )?;
    let record_id = record.id.clone();
    feed.insert(record);

    let stored = feed
        .index()
        .find_by_id(&record_id)
        .cloned()
        .ok_or_else(|| ToolError::RecordNotFound {
            record_id: record_id.to_string(),
        })?;
    info!("Logged {} {}", kind, record_id);

    let mut message = format!(
        "{} Logged {} at {}",
        catalog.emoji(Some(kind)),
        catalog.label(Some(kind)),
        feed.zone().local_time(&stored.date_time).format("%Y-%m-%d %H:%M")
    );
    if let Some(amount) = stored.amount {
        message.push_str(&format!(" ({})", format_amount(kind, amount, catalog)));
    }
    if let Some(gap) = &stored.time_before_prev {
        message.push_str(&format!(
            "\n{} until the next {} logged after it",
            format_interval(gap),
            catalog.label(Some(kind)).to_lowercase()
        ));
    } else if let Some(previous) = feed
        .index()
        .iter()
        .find(|r| r.kind == Some(kind) && r.id != record_id)
    {
        if previous.date_time <= stored.date_time {
            message.push_str(&format!(
                "\n{} since the previous one",
                format_interval(&Interval::between(previous.date_time, stored.date_time))
            ));
        }
    }

    Ok(LogActivityResponse {
        success: true,
        record_id: record_id.to_string(),
        message,
        record: stored,
    })
}

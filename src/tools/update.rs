//! Tool for editing a logged activity
//!
//! This module implements the activity_update MCP tool. Any field can be
//! changed, including the timestamp; the record keeps its id.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::display::{render_record, ActivityCatalog};
use crate::domain::{parse_timestamp, ActivityType, Record};
use crate::feed::ActivityFeed;
use crate::tools::{require_id, ToolError};

/// Parameters for updating an activity
///
/// Omitted fields keep their value. An empty `type` or `notes` clears it.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateActivityParams {
    pub record_id: String,
    #[serde(rename = "type")]
    pub activity_type: Option<String>,
    pub date_time: Option<String>,
    pub amount: Option<f64>,
    /// Drop the stored amount
    #[serde(default)]
    pub clear_amount: bool,
    pub notes: Option<String>,
}

/// Response from updating an activity
#[derive(Debug, Serialize)]
pub struct UpdateActivityResponse {
    pub success: bool,
    pub message: String,
    pub record: Record,
    pub changes: Vec<String>,
}

/// Apply the requested edits to a stored record
pub fn update_activity(
    feed: &mut ActivityFeed,
    catalog: &ActivityCatalog,
    params: UpdateActivityParams,
) -> Result<UpdateActivityResponse, ToolError> {
    let record_id = require_id(&params.record_id)?;
    let current = feed
        .index()
        .find_by_id(&record_id)
        .cloned()
        .ok_or_else(|| ToolError::RecordNotFound {
            record_id: record_id.to_string(),
        })?;

    let mut changes = Vec::new();

    let kind = match params.activity_type.as_deref() {
        Some(value) => {
            let kind = ActivityType::parse_optional(Some(value))?;
            if kind != current.kind {
                changes.push(format!(
                    "type: {} → {}",
                    catalog.label(current.kind),
                    catalog.label(kind)
                ));
            }
            kind
        }
        None => current.kind,
    };

    let date_time = match params.date_time.as_deref() {
        Some(value) => {
            let date_time = parse_timestamp(value, &feed.zone())?;
            if date_time != current.date_time {
                changes.push(format!(
                    "time: {} → {}",
                    feed.zone().local_time(&current.date_time).format("%Y-%m-%d %H:%M"),
                    feed.zone().local_time(&date_time).format("%Y-%m-%d %H:%M")
                ));
            }
            date_time
        }
        None => current.date_time,
    };

    let amount = if params.clear_amount {
        if current.amount.is_some() {
            changes.push("amount cleared".to_string());
        }
        None
    } else if let Some(amount) = params.amount {
        if current.amount != Some(amount) {
            changes.push(format!("amount: {}", amount));
        }
        Some(amount)
    } else {
        current.amount
    };

    let notes = match params.notes {
        Some(notes) => {
            if Some(notes.trim()) != current.notes.as_deref().map(str::trim) {
                changes.push("notes updated".to_string());
            }
            Some(notes)
        }
        None => current.notes.clone(),
    };

    let updated = Record::new(record_id.clone(), date_time, kind, amount, notes)?;
    feed.insert(updated);

    let stored = feed
        .index()
        .find_by_id(&record_id)
        .cloned()
        .ok_or_else(|| ToolError::RecordNotFound {
            record_id: record_id.to_string(),
        })?;
    info!("Updated record {} ({} changes)", record_id, changes.len());

    let message = if changes.is_empty() {
        format!("No changes to {}", record_id)
    } else {
        format!(
            "✏️ Updated {}\n{}\n{}",
            record_id,
            changes.join("\n"),
            render_record(&stored, catalog, &feed.zone())
        )
    };

    Ok(UpdateActivityResponse {
        success: true,
        message,
        record: stored,
        changes,
    })
}

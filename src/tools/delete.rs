//! Tool for deleting a logged activity
//!
//! This module implements the activity_delete MCP tool.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::display::{render_record, ActivityCatalog};
use crate::feed::ActivityFeed;
use crate::tools::{require_id, ToolError};

/// Parameters for deleting an activity
#[derive(Debug, Deserialize)]
pub struct DeleteActivityParams {
    pub record_id: String,
}

/// Response from deleting an activity
#[derive(Debug, Serialize)]
pub struct DeleteActivityResponse {
    pub success: bool,
    pub message: String,
    pub remaining: usize,
}

pub fn delete_activity(
    feed: &mut ActivityFeed,
    catalog: &ActivityCatalog,
    params: DeleteActivityParams,
) -> Result<DeleteActivityResponse, ToolError> {
    let record_id = require_id(&params.record_id)?;
    let removed = feed
        .remove(&record_id)
        .ok_or_else(|| ToolError::RecordNotFound {
            record_id: record_id.to_string(),
        })?;
    info!("Deleted record {}", record_id);

    Ok(DeleteActivityResponse {
        success: true,
        message: format!(
            "🗑️ Deleted {}",
            render_record(&removed, catalog, &feed.zone())
        ),
        remaining: feed.index().len(),
    })
}

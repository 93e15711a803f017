//! MCP tools for the activity timeline
//!
//! This module contains all the MCP tools that external clients can call
//! to log, edit and review activities in the session's feed.

use thiserror::Error;

use crate::domain::DomainError;
use crate::feed::FeedError;

pub mod delete;
pub mod insights;
pub mod list;
pub mod log;
pub mod status;
pub mod update;

// Re-export tool functions for easy access
pub use delete::*;
pub use insights::*;
pub use list::*;
pub use log::*;
pub use status::*;
pub use update::*;

/// Errors returned by tool calls
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Record not found: {record_id}")]
    RecordNotFound { record_id: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("{0}")]
    Feed(#[from] FeedError),
}

fn require_id(record_id: &str) -> Result<crate::domain::RecordId, ToolError> {
    let trimmed = record_id.trim();
    if trimmed.is_empty() {
        return Err(ToolError::Validation {
            message: "Record ID cannot be empty".to_string(),
        });
    }
    Ok(trimmed.into())
}

//! Domain module containing the activity record types
//!
//! This module defines the core entities (Record, RawRecord, Interval) and
//! the ordering that the timeline index is built on. Parsing of the
//! transport shape into validated records also lives here.

pub mod record;
pub mod types;
pub mod zone;

// Re-export public types for easy access
pub use record::*;
pub use types::*;
pub use zone::DayZone;

use thiserror::Error;

/// Errors that can occur while normalizing incoming data
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Invalid activity type: {0}")]
    InvalidActivityType(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid value: {message}")]
    InvalidValue { message: String },
}

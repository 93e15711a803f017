//! Core types used throughout the domain layer
//!
//! This module defines the fundamental types like ActivityType, Interval and
//! the record ID type that are used by Record, the timeline index and the
//! analytics layer.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::DomainError;

const SECONDS_PER_MINUTE: i64 = 60;
const SECONDS_PER_HOUR: i64 = 60 * SECONDS_PER_MINUTE;
const SECONDS_PER_DAY: i64 = 24 * SECONDS_PER_HOUR;

/// Longest interval accepted from the wire, about a thousand years
pub const MAX_INTERVAL_SECONDS: i64 = 1_000 * 365 * SECONDS_PER_DAY;

/// Unique identifier for a logged activity
///
/// Ids are opaque strings assigned by whoever created the record (the API
/// server, or this process for records logged through the MCP tools).
/// Two records with the same id are the same logical record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl RecordId {
    /// Generate a new random record ID
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The kinds of activity that can be logged
///
/// Quantity-bearing kinds carry an `amount` whose unit is implied by the
/// kind: ounces for a meal, hours for sleep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    /// Bottle feeding
    Meal,
    /// Diaper change
    Poop,
    /// Nursing session
    Nurse,
    /// Bath time
    Bath,
    /// Sleep
    Sleep,
}

impl ActivityType {
    pub const ALL: [ActivityType; 5] = [
        ActivityType::Meal,
        ActivityType::Poop,
        ActivityType::Nurse,
        ActivityType::Bath,
        ActivityType::Sleep,
    ];

    /// Wire key for this activity type
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Meal => "meal",
            ActivityType::Poop => "poop",
            ActivityType::Nurse => "nurse",
            ActivityType::Bath => "bath",
            ActivityType::Sleep => "sleep",
        }
    }

    /// Whether records of this type carry a summable amount
    pub fn is_quantity_bearing(&self) -> bool {
        matches!(self, ActivityType::Meal | ActivityType::Sleep)
    }

    /// Parse an optional wire value where an empty string means "unset"
    pub fn parse_optional(value: Option<&str>) -> Result<Option<Self>, DomainError> {
        match value.map(str::trim) {
            None | Some("") => Ok(None),
            Some(key) => key.parse().map(Some),
        }
    }
}

impl FromStr for ActivityType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "meal" => Ok(ActivityType::Meal),
            "poop" => Ok(ActivityType::Poop),
            "nurse" => Ok(ActivityType::Nurse),
            "bath" => Ok(ActivityType::Bath),
            "sleep" => Ok(ActivityType::Sleep),
            _ => Err(DomainError::InvalidActivityType(s.to_string())),
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured elapsed time
///
/// This mirrors the interval objects the API server produces: every field
/// is optional on the wire and zero fields are left out when serialized.
/// The breakdown produced by [`Interval::from_duration`] is normalized, so
/// hours stay below 24, minutes and seconds below 60.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Interval {
    #[serde(skip_serializing_if = "is_zero")]
    pub days: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub hours: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub minutes: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub seconds: i64,
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

impl Interval {
    pub fn new(days: i64, hours: i64, minutes: i64, seconds: i64) -> Self {
        Self {
            days,
            hours,
            minutes,
            seconds,
        }
    }

    /// Build a normalized interval from whole seconds
    ///
    /// Negative inputs produce components that are all negative (or zero).
    pub fn from_seconds(total: i64) -> Self {
        Self {
            days: total / SECONDS_PER_DAY,
            hours: (total % SECONDS_PER_DAY) / SECONDS_PER_HOUR,
            minutes: (total % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE,
            seconds: total % SECONDS_PER_MINUTE,
        }
    }

    /// Break a duration down into days, hours, minutes and seconds
    ///
    /// Sub-second precision is truncated.
    pub fn from_duration(duration: Duration) -> Self {
        Self::from_seconds(duration.num_seconds())
    }

    /// Elapsed time from `earlier` to `later`
    pub fn between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> Self {
        Self::from_duration(later - earlier)
    }

    /// Total length in seconds, saturating at the `i64` bounds
    pub fn total_seconds(&self) -> i64 {
        self.days
            .saturating_mul(SECONDS_PER_DAY)
            .saturating_add(self.hours.saturating_mul(SECONDS_PER_HOUR))
            .saturating_add(self.minutes.saturating_mul(SECONDS_PER_MINUTE))
            .saturating_add(self.seconds)
    }

    pub fn to_duration(&self) -> Duration {
        let total = self
            .total_seconds()
            .clamp(-MAX_INTERVAL_SECONDS, MAX_INTERVAL_SECONDS);
        Duration::seconds(total)
    }

    /// Reject intervals longer than `MAX_INTERVAL_SECONDS` either way
    pub fn validate(self) -> Result<Self, DomainError> {
        let total = self
            .days
            .checked_mul(SECONDS_PER_DAY)
            .and_then(|t| t.checked_add(self.hours.checked_mul(SECONDS_PER_HOUR)?))
            .and_then(|t| t.checked_add(self.minutes.checked_mul(SECONDS_PER_MINUTE)?))
            .and_then(|t| t.checked_add(self.seconds));

        match total {
            Some(t) if (-MAX_INTERVAL_SECONDS..=MAX_INTERVAL_SECONDS).contains(&t) => Ok(self),
            _ => Err(DomainError::InvalidValue {
                message: format!(
                    "interval of {}d {}h {}m {}s is out of range",
                    self.days, self.hours, self.minutes, self.seconds
                ),
            }),
        }
    }

    /// Whole hours (days folded in) and remaining minutes
    pub fn hours_and_minutes(&self) -> (i64, i64) {
        let total = self.total_seconds();
        (
            total / SECONDS_PER_HOUR,
            (total % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE,
        )
    }
}

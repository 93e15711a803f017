//! Runtime configuration
//!
//! Values come from the environment and can be overridden by command line
//! flags in `main.rs`.

use chrono::FixedOffset;
use thiserror::Error;

use crate::domain::DayZone;

pub const UTC_OFFSET_VAR: &str = "ACTIVITY_TIMELINE_UTC_OFFSET";
pub const LIST_DAYS_VAR: &str = "ACTIVITY_TIMELINE_LIST_DAYS";

const DEFAULT_LIST_DAYS: u32 = 3;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid UTC offset: {0}")]
    InvalidOffset(String),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimelineConfig {
    /// Zone calendar days are grouped in
    pub zone: DayZone,
    /// How many days `activity_list` shows when not asked otherwise
    pub list_days: u32,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            zone: DayZone::default(),
            list_days: DEFAULT_LIST_DAYS,
        }
    }
}

impl TimelineConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    /// Read configuration through `get` instead of the process environment
    pub fn from_env_with<F>(mut get: F) -> Result<Self, ConfigError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(offset) = get(UTC_OFFSET_VAR) {
            config.zone = parse_day_zone(&offset)?;
        }
        if let Some(days) = get(LIST_DAYS_VAR) {
            config.list_days = days
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|d| *d > 0)
                .ok_or_else(|| ConfigError::InvalidValue {
                    key: LIST_DAYS_VAR.to_string(),
                    value: days.clone(),
                })?;
        }

        Ok(config)
    }
}

/// Parse `Z`, `UTC`, `local`, `+02:00`, `-0530` or `+2`
///
/// `local` follows the system zone, daylight saving changes included.
pub fn parse_day_zone(value: &str) -> Result<DayZone, ConfigError> {
    let trimmed = value.trim();
    match trimmed.to_lowercase().as_str() {
        "z" | "utc" => return Ok(DayZone::default()),
        "local" => return Ok(DayZone::Local),
        _ => {}
    }

    let invalid = || ConfigError::InvalidOffset(value.to_string());
    let (sign, rest) = match trimmed.chars().next() {
        Some('+') => (1, &trimmed[1..]),
        Some('-') => (-1, &trimmed[1..]),
        _ => return Err(invalid()),
    };

    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.is_empty() || digits.len() > 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let (hours, minutes) = if digits.len() <= 2 {
        (digits.as_str(), "0")
    } else {
        digits.split_at(digits.len() - 2)
    };
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if minutes >= 60 {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
        .map(DayZone::Fixed)
        .ok_or_else(invalid)
}

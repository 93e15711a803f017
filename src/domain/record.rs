//! Record entity and its total ordering
//!
//! This module defines the normalized `Record` held by the timeline index,
//! the `RawRecord` shape delivered by the transport layer, and the comparator
//! that orders records newest first.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ActivityType, DayZone, DomainError, Interval, RecordId};

/// Formats accepted for timestamps that carry no UTC offset
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// One logged activity event
///
/// `time_before_prev` is derived: the timeline index recomputes it after
/// every mutation, so whatever value a record arrives with is replaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Unique identifier for this record
    pub id: RecordId,
    /// When the activity happened
    pub date_time: DateTime<Utc>,
    /// What kind of activity this was (None if unset)
    #[serde(rename = "type")]
    pub kind: Option<ActivityType>,
    /// Quantity in the unit implied by `kind`
    pub amount: Option<f64>,
    /// Free-text annotation
    pub notes: Option<String>,
    /// Elapsed time until the next later record of the same kind
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_before_prev: Option<Interval>,
}

impl Record {
    /// Create a new record with validation
    pub fn new(
        id: RecordId,
        date_time: DateTime<Utc>,
        kind: Option<ActivityType>,
        amount: Option<f64>,
        notes: Option<String>,
    ) -> Result<Self, DomainError> {
        if id.as_str().trim().is_empty() {
            return Err(DomainError::Validation {
                message: "Record id cannot be empty".to_string(),
            });
        }
        Self::validate_amount(&amount)?;

        Ok(Self {
            id,
            date_time,
            kind,
            amount,
            notes: notes.filter(|n| !n.trim().is_empty()),
            time_before_prev: None,
        })
    }

    /// The key this record is ordered by
    pub fn sort_key(&self) -> SortKey<'_> {
        SortKey {
            id: Some(self.id.as_str()),
            date_time: self.date_time,
        }
    }

    /// Amount counted towards day totals, if this record has one
    pub fn quantity(&self) -> Option<(ActivityType, f64)> {
        match (self.kind, self.amount) {
            (Some(kind), Some(amount)) if kind.is_quantity_bearing() => Some((kind, amount)),
            _ => None,
        }
    }

    pub fn has_notes(&self) -> bool {
        self.notes.as_deref().is_some_and(|n| !n.trim().is_empty())
    }

    fn validate_amount(amount: &Option<f64>) -> Result<(), DomainError> {
        if let Some(value) = amount {
            if !value.is_finite() || *value < 0.0 {
                return Err(DomainError::InvalidValue {
                    message: format!("Amount must be a non-negative number, got {}", value),
                });
            }
        }
        Ok(())
    }
}

/// Amount as it appears on the wire: the API serializes decimals as strings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAmount {
    Number(f64),
    Text(String),
}

impl RawAmount {
    fn parse(&self) -> Result<Option<f64>, DomainError> {
        match self {
            RawAmount::Number(n) => Ok(Some(*n)),
            RawAmount::Text(text) if text.trim().is_empty() => Ok(None),
            RawAmount::Text(text) => text.trim().parse::<f64>().map(Some).map_err(|_| {
                DomainError::InvalidValue {
                    message: format!("Amount is not a number: {}", text),
                }
            }),
        }
    }
}

/// A record as delivered by the transport layer, before normalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
    pub id: String,
    pub date_time: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub amount: Option<RawAmount>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_before_prev: Option<Interval>,
}

impl RawRecord {
    /// Parse and validate into a `Record`
    ///
    /// Timestamps without an offset are read as wall-clock time in `zone`.
    pub fn normalize(self, zone: &DayZone) -> Result<Record, DomainError> {
        let date_time = parse_timestamp(&self.date_time, zone)?;
        let kind = ActivityType::parse_optional(self.kind.as_deref())?;
        let amount = match &self.amount {
            Some(raw) => raw.parse()?,
            None => None,
        };

        let mut record = Record::new(RecordId(self.id), date_time, kind, amount, self.notes)?;
        record.time_before_prev = self.time_before_prev.map(Interval::validate).transpose()?;
        Ok(record)
    }
}

impl From<&Record> for RawRecord {
    fn from(record: &Record) -> Self {
        Self {
            id: record.id.to_string(),
            date_time: record.date_time.to_rfc3339(),
            kind: record.kind.map(|k| k.as_str().to_string()),
            amount: record.amount.map(RawAmount::Number),
            notes: record.notes.clone(),
            time_before_prev: record.time_before_prev,
        }
    }
}

/// Parse an ISO-8601 timestamp into UTC
pub fn parse_timestamp(value: &str, zone: &DayZone) -> Result<DateTime<Utc>, DomainError> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M%:z") {
        return Ok(parsed.with_timezone(&Utc));
    }

    let (body, zone) = match value.strip_suffix('Z').or_else(|| value.strip_suffix('z')) {
        Some(body) => (body, DayZone::default()),
        None => (value, *zone),
    };
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(body, format) {
            return Ok(zone.wall_clock(&naive).with_timezone(&Utc));
        }
    }

    Err(DomainError::InvalidDate(value.to_string()))
}

/// The fields the ordering looks at
///
/// Search probes are keys without an id: they never compare equal to a
/// stored record and sort after stored records with the same timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey<'a> {
    pub id: Option<&'a str>,
    pub date_time: DateTime<Utc>,
}

impl<'a> SortKey<'a> {
    pub fn new(id: &'a str, date_time: DateTime<Utc>) -> Self {
        Self {
            id: Some(id),
            date_time,
        }
    }

    /// An id-less probe positioned at `date_time`
    pub fn probe(date_time: DateTime<Utc>) -> SortKey<'static> {
        SortKey {
            id: None,
            date_time,
        }
    }
}

/// Total order over sort keys; `Less` means `a` is stored before `b`
pub type Comparator = fn(&SortKey<'_>, &SortKey<'_>) -> Ordering;

/// Newest first, ties broken by id descending; equal ids are the same record
pub fn compare_keys(a: &SortKey<'_>, b: &SortKey<'_>) -> Ordering {
    if let (Some(a_id), Some(b_id)) = (a.id, b.id) {
        if a_id == b_id {
            return Ordering::Equal;
        }
    }
    b.date_time
        .cmp(&a.date_time)
        .then_with(|| b.id.cmp(&a.id))
}

pub fn compare_records(a: &Record, b: &Record) -> Ordering {
    compare_keys(&a.sort_key(), &b.sort_key())
}

//! Text formatting for timeline views
//!
//! Turns records, intervals and day groups into the short strings the MCP
//! tools return. Per-type emoji and units come from an `ActivityCatalog`
//! passed in by the caller.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::domain::{ActivityType, DayZone, Interval, Record};
use crate::timeline::DayAmounts;

const UNTYPED_EMOJI: &str = "📝";

/// How one activity type is presented
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityInfo {
    pub emoji: &'static str,
    pub label: &'static str,
    pub plural: &'static str,
    /// Unit of `amount`, for quantity-bearing types
    pub units: Option<&'static str>,
}

/// Presentation table for every activity type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityCatalog {
    entries: BTreeMap<ActivityType, ActivityInfo>,
}

impl Default for ActivityCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl ActivityCatalog {
    pub fn standard() -> Self {
        let entries = ActivityType::ALL
            .iter()
            .map(|kind| {
                let info = match kind {
                    ActivityType::Meal => ActivityInfo {
                        emoji: "🍼",
                        label: "Feeding",
                        plural: "Feedings",
                        units: Some("oz"),
                    },
                    ActivityType::Poop => ActivityInfo {
                        emoji: "💩",
                        label: "Diaper",
                        plural: "Diapers",
                        units: None,
                    },
                    ActivityType::Nurse => ActivityInfo {
                        emoji: "🌰",
                        label: "Nursing",
                        plural: "Nursings",
                        units: None,
                    },
                    ActivityType::Bath => ActivityInfo {
                        emoji: "🛁",
                        label: "Bath",
                        plural: "Baths",
                        units: None,
                    },
                    ActivityType::Sleep => ActivityInfo {
                        emoji: "💤",
                        label: "Sleep",
                        plural: "Sleeps",
                        units: Some("hrs"),
                    },
                };
                (*kind, info)
            })
            .collect();

        Self { entries }
    }

    pub fn info(&self, kind: ActivityType) -> Option<&ActivityInfo> {
        self.entries.get(&kind)
    }

    /// Emoji for `kind`; untyped records get a notepad
    pub fn emoji(&self, kind: Option<ActivityType>) -> &str {
        kind.and_then(|k| self.info(k))
            .map_or(UNTYPED_EMOJI, |info| info.emoji)
    }

    pub fn label(&self, kind: Option<ActivityType>) -> &str {
        kind.and_then(|k| self.info(k))
            .map_or("Note", |info| info.label)
    }

    pub fn plural_label(&self, kind: ActivityType) -> &str {
        self.info(kind).map_or(kind.as_str(), |info| info.plural)
    }

    pub fn units(&self, kind: ActivityType) -> Option<&str> {
        self.info(kind).and_then(|info| info.units)
    }
}

fn plural(count: i64, singular: &str, plural: &str) -> String {
    if count > 1 {
        format!("{} {}", count, plural)
    } else {
        format!("{} {}", count, singular)
    }
}

/// `"6 hrs 0 min"`; whole days are folded into the hours
pub fn format_interval(interval: &Interval) -> String {
    let (hours, minutes) = interval.hours_and_minutes();
    format!(
        "{} {}",
        plural(hours, "hr", "hrs"),
        plural(minutes, "min", "mins")
    )
}

/// Short gap marker shown next to a record, e.g. `-6h 0m`
pub fn format_gap(interval: &Interval) -> String {
    let (hours, minutes) = interval.hours_and_minutes();
    format!("-{}h {}m", hours, minutes)
}

/// `"2 hrs 5 mins ago"`, or `"just now"` under a minute
pub fn format_time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now - then;
    if elapsed.num_seconds() < 60 {
        return "just now".to_string();
    }
    format!("{} ago", format_interval(&Interval::from_duration(elapsed)))
}

/// Amount without trailing zeros: 3.30 becomes "3.3", 4.00 becomes "4"
pub fn format_number(value: f64) -> String {
    let fixed = format!("{:.2}", value);
    fixed
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

/// `"3.5 oz"`, or the bare number for unit-less types
pub fn format_amount(kind: ActivityType, amount: f64, catalog: &ActivityCatalog) -> String {
    match catalog.units(kind) {
        Some(units) => format!("{} {}", format_number(amount), units),
        None => format_number(amount),
    }
}

/// One line per record: local time, emoji, amount, gap and notes
pub fn render_record(record: &Record, catalog: &ActivityCatalog, zone: &DayZone) -> String {
    let mut line = format!(
        "{}  {} {}",
        zone.local_time(&record.date_time).format("%H:%M"),
        catalog.emoji(record.kind),
        catalog.label(record.kind)
    );

    if let (Some(kind), Some(amount)) = (record.kind, record.amount) {
        line.push_str(&format!(" {}", format_amount(kind, amount, catalog)));
    }
    if let Some(gap) = &record.time_before_prev {
        line.push_str(&format!(" ({})", format_gap(gap)));
    }
    if let Some(notes) = record.notes.as_deref().filter(|n| !n.trim().is_empty()) {
        line.push_str(&format!(" \"{}\"", notes.trim()));
    }
    line
}

/// A day header, its totals, then its records
pub fn render_day<'a, I>(
    day: NaiveDate,
    records: I,
    amounts: &DayAmounts,
    catalog: &ActivityCatalog,
    zone: &DayZone,
) -> String
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut lines = vec![format!("📅 {}", day.format("%A, %b %-d"))];

    let totals: Vec<String> = amounts
        .iter()
        .filter(|(_, amount)| *amount > 0.0)
        .map(|(kind, amount)| {
            format!("{} {}", catalog.emoji(Some(kind)), format_amount(kind, amount, catalog))
        })
        .collect();
    if !totals.is_empty() {
        lines.push(format!("   Totals: {}", totals.join(", ")));
    }

    let before = lines.len();
    for record in records {
        lines.push(format!("   {}", render_record(record, catalog, zone)));
    }
    if lines.len() == before {
        lines.push("   Nothing logged".to_string());
    }

    lines.join("\n")
}

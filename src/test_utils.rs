//! Shared fixtures for the unit tests.
//!
//! The fixture is nine log entries spanning 13-20 September 2019 (UTC),
//! six of them on the 20th.
#![cfg(test)]

use crate::domain::{compare_keys, DayZone, RawAmount, RawRecord, Record};
use crate::feed::ActivityFeed;
use crate::timeline::TimelineIndex;

pub fn utc() -> DayZone {
    DayZone::default()
}

/// Point the process local zone at New York
///
/// Returns false when the zone database is not installed. Every test that
/// reads `DayZone::Local` goes through here so they all agree on `TZ`.
pub fn new_york_local() -> bool {
    if !std::path::Path::new("/usr/share/zoneinfo/America/New_York").exists() {
        return false;
    }
    std::env::set_var("TZ", "America/New_York");
    true
}

pub fn raw(id: &str, date_time: &str, kind: Option<&str>, amount: Option<&str>) -> RawRecord {
    RawRecord {
        id: id.to_string(),
        date_time: date_time.to_string(),
        kind: kind.map(str::to_string),
        amount: amount.map(|a| RawAmount::Text(a.to_string())),
        notes: None,
        time_before_prev: None,
    }
}

/// Fixture records in storage order (newest first)
pub fn fixture_raw() -> Vec<RawRecord> {
    vec![
        raw("ga8k0ski9vz", "2019-09-20T20:19:18.727Z", None, None),
        raw("dh8k0skf5oc", "2019-09-20T20:16:55.838Z", None, None),
        raw("dh8k0rrp8fz", "2019-09-20T17:53:02.957Z", Some("meal"), Some("3.30")),
        raw("dh8k0rrtfb9", "2019-09-20T06:56:29.305Z", None, None),
        raw("dh8k0rrjz7a", "2019-09-20T06:49:03.023Z", Some("meal"), Some("4.00")),
        raw("dh8k0rrrk0r", "2019-09-20T05:30:29.556Z", Some("meal"), Some("5.00")),
        raw("dh8k0rrosho", "2019-09-19T19:52:00.000Z", Some("poop"), None),
        raw("320k0n6ia7p", "2019-09-16T21:26:00.000Z", Some("meal"), Some("2.50")),
        raw("gdkk0q6iycm", "2019-09-13T21:20:00.000Z", Some("meal"), Some("2.50")),
    ]
}

pub fn fixture_records() -> Vec<Record> {
    fixture_raw()
        .into_iter()
        .map(|r| r.normalize(&utc()).unwrap())
        .collect()
}

/// Deterministic reordering so tests don't depend on input order
pub fn shuffled<T: Clone>(items: &[T]) -> Vec<T> {
    let mut out: Vec<T> = items.iter().rev().cloned().collect();
    let len = out.len();
    if len > 2 {
        out.rotate_left(len / 3);
        out.swap(0, len - 1);
    }
    out
}

/// A feed holding the fixture records, grouped in UTC
pub fn fixture_feed() -> ActivityFeed {
    ActivityFeed::with_index(TimelineIndex::new(fixture_records(), compare_keys, true, utc()))
}

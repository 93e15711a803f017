use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::domain::{ActivityType, Interval, Record};

/// Recompute `time_before_prev` for every record
///
/// `records` must be newest first. Each typed record gets the time from its
/// own timestamp to the next later record of the same type; the latest
/// record of each type, and untyped records, get none.
pub(crate) fn derive_time_before_prev(records: &mut [Record]) {
    let mut later: HashMap<ActivityType, DateTime<Utc>> = HashMap::new();

    for record in records.iter_mut() {
        record.time_before_prev = match record.kind {
            Some(kind) => later
                .insert(kind, record.date_time)
                .map(|next| Interval::between(record.date_time, next)),
            None => None,
        };
    }
}

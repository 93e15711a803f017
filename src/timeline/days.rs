//! Calendar-day nodes and grouped views
//!
//! A day node marks where a calendar day's records begin in the sorted
//! storage. Nodes are emitted for every day between the latest and the
//! earliest record, including days without records, so a consumer can
//! render an empty day header.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::Serialize;

use crate::domain::{ActivityType, Comparator, DayZone, Record, SortKey};

/// Where a calendar day starts in the sorted records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayNode {
    /// The calendar day in the index's zone
    pub day: NaiveDate,
    /// Midnight at the start of `day`
    pub date_time: DateTime<FixedOffset>,
    /// Position of the first record at or before the end of `day`
    pub index: usize,
}

/// Per-day totals of quantity-bearing amounts
///
/// Every quantity-bearing type is present, zero when nothing was logged.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DayAmounts(BTreeMap<ActivityType, f64>);

impl DayAmounts {
    pub fn total(records: &[Record]) -> Self {
        let mut totals: BTreeMap<ActivityType, f64> = ActivityType::ALL
            .iter()
            .filter(|kind| kind.is_quantity_bearing())
            .map(|kind| (*kind, 0.0))
            .collect();

        for (kind, amount) in records.iter().filter_map(Record::quantity) {
            *totals.entry(kind).or_insert(0.0) += amount;
        }

        Self(totals)
    }

    pub fn get(&self, kind: ActivityType) -> f64 {
        self.0.get(&kind).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ActivityType, f64)> + '_ {
        self.0.iter().map(|(kind, amount)| (*kind, *amount))
    }
}

/// One day node expanded into its records and totals
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayGroup<'a> {
    #[serde(skip)]
    pub day: NaiveDate,
    pub date_time: DateTime<FixedOffset>,
    #[serde(rename = "data")]
    pub records: &'a [Record],
    #[serde(rename = "amount")]
    pub amounts: DayAmounts,
}

impl DayGroup<'_> {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Rebuild the day nodes for `records` (newest first)
///
/// Walks one calendar day at a time from the latest record's day down to
/// the earliest record's day. For each day, the first record belonging to
/// it (or to an earlier day) sits at the insertion point of an id-less
/// probe placed at the start of the following day.
pub(crate) fn build_day_nodes(
    records: &[Record],
    comparator: Comparator,
    zone: &DayZone,
) -> Vec<DayNode> {
    let (Some(latest), Some(earliest)) = (records.first(), records.last()) else {
        return Vec::new();
    };
    let last_day = zone.day_of(&earliest.date_time);

    let mut nodes = Vec::new();
    let mut day = zone.day_of(&latest.date_time);
    let mut next_start = day.succ_opt().map(|next| zone.day_start(next));
    while day >= last_day {
        let starts_at = zone.day_start(day);
        let probe = match next_start {
            Some(next) => SortKey::probe(next.with_timezone(&Utc)),
            None => SortKey::probe(DateTime::<Utc>::MAX_UTC),
        };
        let index = match records.binary_search_by(|r| comparator(&r.sort_key(), &probe)) {
            Ok(i) | Err(i) => i,
        };

        nodes.push(DayNode {
            day,
            date_time: starts_at,
            index,
        });
        next_start = Some(starts_at);

        match day.pred_opt() {
            Some(previous) => day = previous,
            None => break,
        }
    }

    nodes
}

/// Pair each node with the next node's start to slice out its records
pub(crate) fn group_days<'a>(records: &'a [Record], nodes: &[DayNode]) -> Vec<DayGroup<'a>> {
    nodes
        .iter()
        .enumerate()
        .map(|(i, node)| {
            let end = nodes.get(i + 1).map_or(records.len(), |next| next.index);
            let slice = &records[node.index..end];
            DayGroup {
                day: node.day,
                date_time: node.date_time,
                records: slice,
                amounts: DayAmounts::total(slice),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::compare_keys;
    use crate::test_utils::{fixture_records, utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_nodes_cover_every_day_in_range() {
        let records = fixture_records();
        let nodes = build_day_nodes(&records, compare_keys, &utc());

        assert_eq!(nodes.len(), 8);
        assert_eq!(nodes[0].day, date(2019, 9, 20));
        assert_eq!(nodes[0].index, 0);
        assert_eq!(nodes[1].day, date(2019, 9, 19));
        assert_eq!(nodes[1].index, 6);
        // 18th and 17th are empty and share the 16th's boundary
        assert_eq!(nodes[2].index, 7);
        assert_eq!(nodes[3].index, 7);
        assert_eq!(nodes[4].day, date(2019, 9, 16));
        assert_eq!(nodes[4].index, 7);
        assert_eq!(nodes[7].day, date(2019, 9, 13));
        assert_eq!(nodes[7].index, 8);
    }

    #[test]
    fn test_nodes_follow_zone() {
        let records = fixture_records();
        // At UTC+5 the 20:16 and 20:19 UTC entries land on the 21st
        let plus_five = FixedOffset::east_opt(5 * 3600).unwrap();
        let nodes = build_day_nodes(&records, compare_keys, &DayZone::Fixed(plus_five));

        assert_eq!(nodes[0].day, date(2019, 9, 21));
        assert_eq!(nodes[0].date_time.to_rfc3339(), "2019-09-21T00:00:00+05:00");
        assert_eq!(nodes[1].index, 2);
        assert_eq!(nodes.last().unwrap().day, date(2019, 9, 14));
    }

    #[test]
    fn test_local_days_across_daylight_saving_change() {
        if !crate::test_utils::new_york_local() {
            return;
        }
        let at = |id: &str, m: u32, d: u32, h: u32, min: u32| {
            let when = chrono::TimeZone::with_ymd_and_hms(&Utc, 2019, m, d, h, min, 0).unwrap();
            Record::new(id.into(), when, Some(ActivityType::Poop), None, None).unwrap()
        };

        // Noon and 23:30 EST on Nov 30
        let records = vec![at("b", 12, 1, 4, 30), at("a", 11, 30, 17, 0)];
        let nodes = build_day_nodes(&records, compare_keys, &DayZone::Local);
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].day, date(2019, 11, 30));
        assert_eq!(nodes[0].date_time.to_rfc3339(), "2019-11-30T00:00:00-05:00");

        // Nov 3 runs 25 hours, from 00:30 EDT to 23:30 EST
        let records = vec![
            at("d", 11, 4, 4, 30),
            at("c", 11, 3, 4, 30),
            at("e", 11, 2, 16, 0),
        ];
        let nodes = build_day_nodes(&records, compare_keys, &DayZone::Local);
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].day, date(2019, 11, 3));
        assert_eq!(nodes[0].index, 0);
        assert_eq!(nodes[0].date_time.to_rfc3339(), "2019-11-03T00:00:00-04:00");
        assert_eq!(nodes[1].day, date(2019, 11, 2));
        assert_eq!(nodes[1].index, 2);

        let groups = group_days(&records, &nodes);
        assert_eq!(groups[0].records.len(), 2);
    }

    #[test]
    fn test_record_at_midnight_belongs_to_new_day() {
        let mut records = fixture_records();
        records.truncate(1);
        let midnight = Record::new(
            "m".into(),
            chrono::TimeZone::with_ymd_and_hms(&Utc, 2019, 9, 20, 0, 0, 0).unwrap(),
            Some(ActivityType::Bath),
            None,
            None,
        )
        .unwrap();
        records.push(midnight);

        let nodes = build_day_nodes(&records, compare_keys, &utc());
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].index, 0);
    }

    #[test]
    fn test_grouped_slices_and_totals() {
        let records = fixture_records();
        let nodes = build_day_nodes(&records, compare_keys, &utc());
        let groups = group_days(&records, &nodes);

        assert_eq!(groups.len(), nodes.len());
        assert_eq!(groups[0].records.len(), 6);
        assert!((groups[0].amounts.get(ActivityType::Meal) - 12.30).abs() < 1e-9);
        assert_eq!(groups[0].amounts.get(ActivityType::Sleep), 0.0);
        assert_eq!(groups[1].records.len(), 1);
        assert!(groups[2].is_empty());

        let covered: usize = groups.iter().map(|g| g.records.len()).sum();
        assert_eq!(covered, records.len());
    }

    #[test]
    fn test_empty_records_have_no_nodes() {
        assert!(build_day_nodes(&[], compare_keys, &utc()).is_empty());
        assert!(group_days(&[], &[]).is_empty());
    }

    #[test]
    fn test_group_serializes_to_wire_shape() {
        let records = fixture_records();
        let nodes = build_day_nodes(&records, compare_keys, &utc());
        let groups = group_days(&records, &nodes);

        let json = serde_json::to_value(&groups[1]).unwrap();
        assert!(json["dateTime"]
            .as_str()
            .unwrap()
            .starts_with("2019-09-19T00:00:00"));
        assert_eq!(json["data"][0]["type"], "poop");
        assert_eq!(json["amount"]["meal"], 0.0);
    }
}

//! The sorted, day-grouped record index
//!
//! `TimelineIndex` owns the only authoritative copy of the session's
//! records. Positional operations are binary searches over storage sorted
//! by the comparator (newest first). A side table maps each id to the
//! timestamp it is stored under, so a record whose timestamp changes is
//! always removed from its old position before being re-inserted.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::domain::{
    compare_keys, ActivityType, Comparator, DayZone, DomainError, RawRecord, Record, RecordId,
    SortKey,
};
use crate::timeline::days::{build_day_nodes, group_days, DayGroup, DayNode};
use crate::timeline::gaps::derive_time_before_prev;

/// Sorted activity records plus derived day nodes
#[derive(Debug, Clone)]
pub struct TimelineIndex {
    records: Vec<Record>,
    nodes: Vec<DayNode>,
    stored_at: HashMap<RecordId, DateTime<Utc>>,
    comparator: Comparator,
    zone: DayZone,
}

impl Default for TimelineIndex {
    fn default() -> Self {
        Self::empty(DayZone::default())
    }
}

impl TimelineIndex {
    /// Create an empty index grouping days in `zone`
    pub fn empty(zone: DayZone) -> Self {
        Self {
            records: Vec::new(),
            nodes: Vec::new(),
            stored_at: HashMap::new(),
            comparator: compare_keys,
            zone,
        }
    }

    /// Build an index from `records`
    ///
    /// Unless `already_sorted` is set the input is sorted with `comparator`.
    /// When the input repeats an id, the later occurrence wins, exactly as
    /// if the records had been pushed one by one.
    ///
    /// The comparator must order records newest first; day nodes rely on it.
    pub fn new(
        mut records: Vec<Record>,
        comparator: Comparator,
        already_sorted: bool,
        zone: DayZone,
    ) -> Self {
        let mut index = Self {
            comparator,
            ..Self::empty(zone)
        };

        let stored_at: HashMap<RecordId, DateTime<Utc>> = records
            .iter()
            .map(|r| (r.id.clone(), r.date_time))
            .collect();
        if stored_at.len() != records.len() {
            warn!(
                "Input repeats record ids ({} records, {} ids), inserting one by one",
                records.len(),
                stored_at.len()
            );
            index.push(records);
            return index;
        }

        if !already_sorted {
            records.sort_by(|a, b| comparator(&a.sort_key(), &b.sort_key()));
        }
        index.records = records;
        index.stored_at = stored_at;
        index.refresh();

        debug!(
            "Built timeline index with {} records over {} days",
            index.records.len(),
            index.nodes.len()
        );
        index
    }

    /// Build an index from transport records, normalizing each one
    pub fn from_raw(
        raw: Vec<RawRecord>,
        comparator: Comparator,
        already_sorted: bool,
        zone: DayZone,
    ) -> Result<Self, DomainError> {
        let records = raw
            .into_iter()
            .map(|r| r.normalize(&zone))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(records, comparator, already_sorted, zone))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in storage order (newest first)
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    pub fn nodes(&self) -> &[DayNode] {
        &self.nodes
    }

    pub fn zone(&self) -> DayZone {
        self.zone
    }

    pub fn comparator(&self) -> Comparator {
        self.comparator
    }

    /// Regroup days under another zone
    pub fn with_zone(mut self, zone: DayZone) -> Self {
        self.zone = zone;
        self.nodes = build_day_nodes(&self.records, self.comparator, &self.zone);
        self
    }

    /// Insert or update records
    ///
    /// A record whose id is already stored replaces the stored one, even
    /// when its timestamp moved it to a different position. Derived data is
    /// rebuilt once after the whole batch.
    pub fn push<I>(&mut self, records: I) -> &mut Self
    where
        I: IntoIterator<Item = Record>,
    {
        let mut inserted = 0usize;
        let mut updated = 0usize;
        for record in records {
            if self.insert_one(record) {
                updated += 1;
            } else {
                inserted += 1;
            }
        }

        if inserted + updated == 0 {
            return self;
        }

        self.refresh();
        debug!(
            "Pushed {} new and {} updated records, {} total",
            inserted,
            updated,
            self.records.len()
        );
        self
    }

    /// Normalize and push transport records
    ///
    /// Nothing is pushed unless the whole batch normalizes.
    pub fn push_raw(&mut self, raw: Vec<RawRecord>) -> Result<&mut Self, DomainError> {
        let records = raw
            .into_iter()
            .map(|r| r.normalize(&self.zone))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.push(records))
    }

    /// Remove the record `key` refers to, if stored
    ///
    /// A key with a known id finds the record even if its timestamp is
    /// stale. An id-less key never matches.
    pub fn delete(&mut self, key: &SortKey<'_>) -> Option<Record> {
        let id = RecordId::from(key.id?);
        let removed = self.remove_by_id(&id)?;
        self.refresh();
        debug!("Deleted record {}, {} remaining", id, self.records.len());
        Some(removed)
    }

    pub fn delete_by_id(&mut self, id: &RecordId) -> Option<Record> {
        let stored = *self.stored_at.get(id)?;
        self.delete(&SortKey::new(id.as_str(), stored))
    }

    /// Remove the record at storage position `index`
    pub fn delete_index(&mut self, index: usize) -> Option<Record> {
        if index >= self.records.len() {
            return None;
        }
        let removed = self.records.remove(index);
        self.stored_at.remove(&removed.id);
        self.refresh();
        debug!("Deleted record at {}, {} remaining", index, self.records.len());
        Some(removed)
    }

    /// Replace the record at `index` with `record`, re-sorting it
    pub fn set(&mut self, index: usize, record: Record) -> Option<Record> {
        if index >= self.records.len() {
            return None;
        }
        let removed = self.records.remove(index);
        self.stored_at.remove(&removed.id);
        self.push(std::iter::once(record));
        Some(removed)
    }

    pub fn find(&self, key: &SortKey<'_>) -> Option<&Record> {
        self.index_of(key).ok().map(|i| &self.records[i])
    }

    /// Storage position of `key`, or `Err(insertion_point)` when absent
    pub fn index_of(&self, key: &SortKey<'_>) -> Result<usize, usize> {
        let resolved = match key.id {
            Some(id) => match self.stored_at.get(&RecordId::from(id)) {
                Some(stored) => SortKey::new(id, *stored),
                None => *key,
            },
            None => *key,
        };
        self.search(&resolved)
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.stored_at.contains_key(id)
    }

    pub fn find_by_id(&self, id: &RecordId) -> Option<&Record> {
        let stored = self.stored_at.get(id)?;
        self.find(&SortKey::new(id.as_str(), *stored))
    }

    /// The most recent record of `kind`, or the most recent overall
    pub fn latest_of(&self, kind: Option<ActivityType>) -> Option<&Record> {
        match kind {
            Some(kind) => self.records.iter().find(|r| r.kind == Some(kind)),
            None => self.records.first(),
        }
    }

    /// The chronologically earliest record, used as a pagination cursor
    pub fn get_smallest(&self) -> Option<&Record> {
        self.records.last()
    }

    /// The chronologically latest record
    pub fn get_largest(&self) -> Option<&Record> {
        self.records.first()
    }

    /// Records grouped by calendar day, newest day first
    pub fn to_grouped(&self) -> Vec<DayGroup<'_>> {
        group_days(&self.records, &self.nodes)
    }

    /// Merge `other` into this index
    ///
    /// An empty index takes over the other's storage and comparator
    /// without re-inserting; only the day nodes are rebuilt if the zones
    /// differ.
    pub fn concat(&mut self, other: TimelineIndex) -> &mut Self {
        if self.is_empty() {
            self.records = other.records;
            self.stored_at = other.stored_at;
            self.comparator = other.comparator;
            self.nodes = other.nodes;
            if other.zone != self.zone {
                self.nodes = build_day_nodes(&self.records, self.comparator, &self.zone);
            }
            return self;
        }
        if other.is_empty() {
            return self;
        }
        self.push(other.records)
    }

    fn search(&self, key: &SortKey<'_>) -> Result<usize, usize> {
        self.records
            .binary_search_by(|probe| (self.comparator)(&probe.sort_key(), key))
    }

    /// Returns true when the record replaced a stored one
    fn insert_one(&mut self, record: Record) -> bool {
        let replaced = self.remove_by_id(&record.id).is_some();
        let position = match self.search(&record.sort_key()) {
            Ok(i) | Err(i) => i,
        };
        self.stored_at.insert(record.id.clone(), record.date_time);
        self.records.insert(position, record);
        replaced
    }

    fn remove_by_id(&mut self, id: &RecordId) -> Option<Record> {
        let stored = self.stored_at.remove(id)?;
        let position = self
            .search(&SortKey::new(id.as_str(), stored))
            .ok()
            .or_else(|| self.records.iter().position(|r| &r.id == id))?;
        Some(self.records.remove(position))
    }

    fn refresh(&mut self) {
        derive_time_before_prev(&mut self.records);
        self.nodes = build_day_nodes(&self.records, self.comparator, &self.zone);
    }
}

//! Session state around the timeline index
//!
//! `ActivityFeed` is what a client session holds: the index, the latest
//! statistics, the pagination cursor and the request/login flags. API
//! responses are applied to it through the `apply_*` methods; records
//! logged locally go through `insert` and `remove`.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::analytics::{RawStats, StatsTable};
use crate::domain::{ActivityType, DayZone, DomainError, RawRecord, Record, RecordId};
use crate::timeline::{DayAmounts, TimelineIndex};

/// Errors raised by feed state transitions
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("A request is already in flight")]
    RequestInFlight,

    #[error("Deleted id {deleted} does not match requested id {requested}")]
    DeleteMismatch { requested: String, deleted: String },

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),
}

/// Body of a page fetch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FetchResponse {
    #[serde(default)]
    pub activities: Vec<RawRecord>,
    #[serde(default)]
    pub stats: Option<Vec<RawStats>>,
}

/// Body of a create or update call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationResponse {
    /// Records newer than the client's cursor
    #[serde(default)]
    pub activities: Vec<RawRecord>,
    #[serde(default)]
    pub stats: Option<Vec<RawStats>>,
    #[serde(alias = "created", alias = "updated")]
    pub record: RawRecord,
}

/// Echo of the deleted record's id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletedRef {
    pub id: String,
}

/// Body of a delete call; the server may send an empty object
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeleteResponse {
    #[serde(default)]
    pub activities: Vec<RawRecord>,
    #[serde(default)]
    pub stats: Option<Vec<RawStats>>,
    #[serde(default)]
    pub deleted: Option<DeletedRef>,
}

/// Outcome of the last request
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResponseStatus {
    pub status: u16,
    pub message: Option<String>,
}

/// A day group after applying the type filter
///
/// `amounts` stays the total of the whole day.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibleDay<'a> {
    #[serde(skip)]
    pub day: NaiveDate,
    pub date_time: DateTime<FixedOffset>,
    #[serde(rename = "data")]
    pub records: Vec<&'a Record>,
    #[serde(rename = "amount")]
    pub amounts: DayAmounts,
}

#[derive(Debug, Clone)]
pub struct ActivityFeed {
    index: TimelineIndex,
    stats: StatsTable,
    last: Option<DateTime<Utc>>,
    has_more: bool,
    logged_in: bool,
    error: bool,
    response: ResponseStatus,
    filters: Vec<ActivityType>,
    request_in_flight: bool,
}

impl Default for ActivityFeed {
    fn default() -> Self {
        Self::with_index(TimelineIndex::default())
    }
}

impl ActivityFeed {
    pub fn new(zone: DayZone) -> Self {
        Self::with_index(TimelineIndex::empty(zone))
    }

    pub fn with_index(index: TimelineIndex) -> Self {
        let last = index.get_smallest().map(|r| r.date_time);
        Self {
            index,
            stats: StatsTable::default(),
            last,
            has_more: true,
            logged_in: true,
            error: false,
            response: ResponseStatus::default(),
            filters: Vec::new(),
            request_in_flight: false,
        }
    }

    pub fn index(&self) -> &TimelineIndex {
        &self.index
    }

    pub fn stats(&self) -> &StatsTable {
        &self.stats
    }

    pub fn last(&self) -> Option<DateTime<Utc>> {
        self.last
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    pub fn has_error(&self) -> bool {
        self.error
    }

    pub fn response(&self) -> &ResponseStatus {
        &self.response
    }

    pub fn filters(&self) -> &[ActivityType] {
        &self.filters
    }

    pub fn is_request_in_flight(&self) -> bool {
        self.request_in_flight
    }

    pub fn zone(&self) -> DayZone {
        self.index.zone()
    }

    /// Mark a request as started
    pub fn begin_request(&mut self) -> Result<(), FeedError> {
        if self.request_in_flight {
            return Err(FeedError::RequestInFlight);
        }
        self.request_in_flight = true;
        self.error = false;
        self.response = ResponseStatus::default();
        Ok(())
    }

    /// Start a page fetch; `Ok(false)` when every page has been fetched
    pub fn begin_fetch(&mut self) -> Result<bool, FeedError> {
        if !self.has_more {
            return Ok(false);
        }
        self.begin_request()?;
        Ok(true)
    }

    /// Apply a page of records
    ///
    /// `has_more` of `None` keeps the current value. Returns how many
    /// records the page carried.
    pub fn apply_fetch(
        &mut self,
        response: FetchResponse,
        has_more: Option<bool>,
    ) -> Result<usize, FeedError> {
        let count = response.activities.len();
        self.apply_batch(response.activities, response.stats, None, 0)?;
        if let Some(has_more) = has_more {
            self.has_more = has_more;
        }
        info!("Fetched {} activities, {} held", count, self.index.len());
        Ok(count)
    }

    /// Apply the server's answer to a create call
    pub fn apply_created(&mut self, response: MutationResponse) -> Result<Record, FeedError> {
        self.apply_mutation(response, 201, "Activity successfully added.")
    }

    /// Apply the server's answer to an update call
    pub fn apply_updated(&mut self, response: MutationResponse) -> Result<Record, FeedError> {
        self.apply_mutation(response, 200, "Activity successfully updated.")
    }

    /// Apply the server's answer to deleting `id`
    ///
    /// A response that echoes a different id fails the request and leaves
    /// the index untouched.
    pub fn apply_deleted(
        &mut self,
        id: &RecordId,
        response: DeleteResponse,
    ) -> Result<Option<Record>, FeedError> {
        if let Some(deleted) = &response.deleted {
            if deleted.id != id.as_str() {
                let err = FeedError::DeleteMismatch {
                    requested: id.to_string(),
                    deleted: deleted.id.clone(),
                };
                self.fail_request(200, Some(err.to_string()));
                return Err(err);
            }
        }

        let removed = self.index.delete_by_id(id);
        self.apply_batch(
            response.activities,
            response.stats,
            Some("Activity successfully deleted."),
            200,
        )?;
        Ok(removed)
    }

    /// Record a failed request
    ///
    /// 401 and 403 mean the session is no longer authenticated.
    pub fn fail_request(&mut self, status: u16, message: Option<String>) {
        self.request_in_flight = false;
        self.error = true;
        if status == 401 || status == 403 {
            warn!("Request rejected with status {}, logging out", status);
            self.logged_in = false;
        }
        self.response = ResponseStatus { status, message };
    }

    /// Mark the session as authenticated again
    pub fn login(&mut self) {
        self.request_in_flight = false;
        self.error = false;
        self.logged_in = true;
    }

    /// Drop the session's data
    ///
    /// The index is replaced by a fresh one rather than cleared in place.
    pub fn logout(&mut self) {
        let zone = self.index.zone();
        self.index = TimelineIndex::empty(zone);
        self.stats = StatsTable::default();
        self.last = None;
        self.has_more = true;
        self.logged_in = false;
        self.error = false;
        self.request_in_flight = false;
        info!("Session logged out");
    }

    /// Unix seconds of the cursor, for the next page's `before` parameter
    pub fn next_page_before(&self) -> Option<i64> {
        self.last.map(|last| last.timestamp())
    }

    pub fn set_filters(&mut self, filters: Vec<ActivityType>) {
        self.filters = filters;
    }

    /// Day groups with only the filtered types; all records when no filter
    pub fn visible_days(&self) -> Vec<VisibleDay<'_>> {
        self.index
            .to_grouped()
            .into_iter()
            .map(|group| VisibleDay {
                day: group.day,
                date_time: group.date_time,
                records: group
                    .records
                    .iter()
                    .filter(|r| self.matches_filters(r))
                    .collect(),
                amounts: group.amounts,
            })
            .collect()
    }

    /// Insert or update a record without a server round trip
    ///
    /// Returns true when a stored record was replaced. Server-supplied
    /// statistics no longer describe the data afterwards, so they are
    /// dropped.
    pub fn insert(&mut self, record: Record) -> bool {
        let replaced = self.index.contains(&record.id);
        self.index.push(std::iter::once(record));
        self.after_local_change();
        replaced
    }

    /// Delete a record without a server round trip
    pub fn remove(&mut self, id: &RecordId) -> Option<Record> {
        let removed = self.index.delete_by_id(id)?;
        self.after_local_change();
        Some(removed)
    }

    fn matches_filters(&self, record: &Record) -> bool {
        self.filters.is_empty()
            || record
                .kind
                .is_some_and(|kind| self.filters.contains(&kind))
    }

    fn apply_mutation(
        &mut self,
        response: MutationResponse,
        status: u16,
        message: &str,
    ) -> Result<Record, FeedError> {
        let record = match response.record.normalize(&self.index.zone()) {
            Ok(record) => record,
            Err(err) => {
                self.fail_request(status, Some(err.to_string()));
                return Err(err.into());
            }
        };
        let id = record.id.clone();

        let mut batch: Vec<RawRecord> = vec![RawRecord::from(&record)];
        batch.extend(response.activities);
        self.apply_batch(batch, response.stats, Some(message), status)?;

        self.index
            .find_by_id(&id)
            .cloned()
            .ok_or_else(|| {
                FeedError::Domain(DomainError::Validation {
                    message: format!("Record {} missing after push", id),
                })
            })
    }

    /// Normalize a whole batch, then push it and update the derived state
    fn apply_batch(
        &mut self,
        activities: Vec<RawRecord>,
        stats: Option<Vec<RawStats>>,
        message: Option<&str>,
        status: u16,
    ) -> Result<(), FeedError> {
        let stats = match stats.map(StatsTable::from_raw).transpose() {
            Ok(stats) => stats,
            Err(err) => {
                self.fail_request(status, Some(err.to_string()));
                return Err(err.into());
            }
        };
        if let Err(err) = self.index.push_raw(activities) {
            self.fail_request(status, Some(err.to_string()));
            return Err(err.into());
        }

        if let Some(stats) = stats {
            self.stats = stats;
        }
        self.last = self.index.get_smallest().map(|r| r.date_time);
        self.request_in_flight = false;
        self.error = false;
        self.response = ResponseStatus {
            status,
            message: message.map(str::to_string),
        };
        debug!(
            "Feed holds {} records, cursor {:?}",
            self.index.len(),
            self.next_page_before()
        );
        Ok(())
    }

    fn after_local_change(&mut self) {
        self.stats = StatsTable::default();
        self.last = self.index.get_smallest().map(|r| r.date_time);
    }
}

//! Zone that calendar days are grouped in
//!
//! Either a fixed UTC offset or the system's local zone. The local zone is
//! resolved per instant, so records on either side of a daylight saving
//! change each land on their own wall-clock day.

use std::fmt;

use chrono::{
    DateTime, Duration, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone,
    Utc,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayZone {
    Fixed(FixedOffset),
    Local,
}

impl Default for DayZone {
    fn default() -> Self {
        DayZone::Fixed(Utc.fix())
    }
}

impl From<FixedOffset> for DayZone {
    fn from(offset: FixedOffset) -> Self {
        DayZone::Fixed(offset)
    }
}

impl fmt::Display for DayZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayZone::Fixed(offset) => write!(f, "{}", offset),
            DayZone::Local => write!(f, "local"),
        }
    }
}

impl DayZone {
    /// Wall-clock time of `date_time` in this zone
    pub fn local_time(&self, date_time: &DateTime<Utc>) -> DateTime<FixedOffset> {
        match self {
            DayZone::Fixed(offset) => date_time.with_timezone(offset),
            DayZone::Local => fixed(date_time.with_timezone(&Local)),
        }
    }

    /// The calendar day `date_time` falls on
    pub fn day_of(&self, date_time: &DateTime<Utc>) -> NaiveDate {
        self.local_time(date_time).date_naive()
    }

    /// Read a wall-clock time in this zone
    ///
    /// A time repeated by a backward transition resolves to its earlier
    /// instant. A time skipped by a forward transition moves past the gap.
    pub fn wall_clock(&self, naive: &NaiveDateTime) -> DateTime<FixedOffset> {
        match self {
            DayZone::Fixed(offset) => resolve(offset, naive),
            DayZone::Local => fixed(resolve(&Local, naive)),
        }
    }

    /// Midnight at the start of `day`, or the first instant of it when
    /// midnight does not exist
    pub fn day_start(&self, day: NaiveDate) -> DateTime<FixedOffset> {
        self.wall_clock(&day.and_time(NaiveTime::MIN))
    }
}

fn fixed<Tz: TimeZone>(date_time: DateTime<Tz>) -> DateTime<FixedOffset> {
    let offset = date_time.offset().fix();
    date_time.with_timezone(&offset)
}

fn resolve<Tz: TimeZone>(zone: &Tz, naive: &NaiveDateTime) -> DateTime<Tz> {
    match zone.from_local_datetime(naive).earliest() {
        Some(date_time) => date_time,
        None => {
            // Inside a gap: the offset in force before it pushes the time forward
            let before = zone.offset_from_utc_datetime(naive).fix();
            let utc = *naive - Duration::seconds(i64::from(before.local_minus_utc()));
            zone.from_utc_datetime(&utc)
        }
    }
}

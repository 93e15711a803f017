//! Timeline index over activity records
//!
//! The index keeps records sorted newest first and, after every mutation,
//! re-derives two things from scratch: the day nodes marking where each
//! calendar day starts in the sorted storage, and the per-type elapsed
//! time between consecutive records.

pub mod days;
pub mod index;
mod gaps;

pub use days::{DayAmounts, DayGroup, DayNode};
pub use index::TimelineIndex;

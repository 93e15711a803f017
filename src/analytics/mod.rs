//! Analytics engine for per-type interval statistics and insights
//!
//! The API server ships a mean and standard deviation of the time between
//! consecutive events of each type. The same numbers can be computed from
//! a local timeline index, which is what the MCP server does.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::display::{format_amount, format_interval, ActivityCatalog};
use crate::domain::{ActivityType, DomainError, Interval};
use crate::timeline::TimelineIndex;

/// Mean and spread of `time_before_prev` for one activity type
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TypeStats {
    pub average: Interval,
    pub stddev: Interval,
}

/// Statistics entry as delivered by the API server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawStats {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub average: Interval,
    #[serde(default)]
    pub stddev: Interval,
}

/// Statistics keyed by activity type; types without samples are absent
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct StatsTable(BTreeMap<ActivityType, TypeStats>);

impl StatsTable {
    /// Build from server-supplied entries, rejecting unknown types and
    /// out-of-range intervals
    pub fn from_raw(raw: Vec<RawStats>) -> Result<Self, DomainError> {
        raw.into_iter()
            .map(|entry| {
                let kind = entry.kind.parse::<ActivityType>()?;
                Ok((
                    kind,
                    TypeStats {
                        average: entry.average.validate()?,
                        stddev: entry.stddev.validate()?,
                    },
                ))
            })
            .collect::<Result<BTreeMap<_, _>, DomainError>>()
            .map(Self)
    }

    pub fn get(&self, kind: ActivityType) -> Option<&TypeStats> {
        self.0.get(&kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ActivityType, &TypeStats)> + '_ {
        self.0.iter().map(|(kind, stats)| (*kind, stats))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Analytics engine for processing timeline data
#[derive(Debug, Default)]
pub struct AnalyticsEngine {}

impl AnalyticsEngine {
    /// Create a new analytics engine
    pub fn new() -> Self {
        Self {}
    }

    /// Mean and sample standard deviation of the gaps of each type
    ///
    /// The standard deviation is zero with fewer than two samples.
    pub fn compute_type_stats(&self, index: &TimelineIndex) -> StatsTable {
        let mut samples: BTreeMap<ActivityType, Vec<f64>> = BTreeMap::new();
        for record in index.iter() {
            if let (Some(kind), Some(gap)) = (record.kind, record.time_before_prev) {
                samples
                    .entry(kind)
                    .or_default()
                    .push(gap.total_seconds() as f64);
            }
        }

        let table = samples
            .into_iter()
            .map(|(kind, values)| {
                let n = values.len() as f64;
                let mean = values.iter().sum::<f64>() / n;
                let variance = if values.len() > 1 {
                    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)
                } else {
                    0.0
                };
                (
                    kind,
                    TypeStats {
                        average: Interval::from_seconds(mean.round() as i64),
                        stddev: Interval::from_seconds(variance.sqrt().round() as i64),
                    },
                )
            })
            .collect();

        StatsTable(table)
    }

    /// Generate short observations about the logged activities
    pub fn generate_insights(
        &self,
        index: &TimelineIndex,
        stats: &StatsTable,
        catalog: &ActivityCatalog,
        now: DateTime<Utc>,
    ) -> Vec<String> {
        let mut insights = Vec::new();

        if index.is_empty() {
            insights.push(
                "Nothing logged yet. Log a feeding or a diaper change to get started!".to_string(),
            );
            return insights;
        }

        for (kind, type_stats) in stats.iter() {
            insights.push(format!(
                "{} {} every {} on average (give or take {}).",
                catalog.emoji(Some(kind)),
                catalog.plural_label(kind),
                format_interval(&type_stats.average),
                format_interval(&type_stats.stddev),
            ));
        }

        let today = index.zone().day_of(&now);
        if let Some(group) = index.to_grouped().into_iter().find(|g| g.day == today) {
            let totals: Vec<String> = group
                .amounts
                .iter()
                .filter(|(_, amount)| *amount > 0.0)
                .map(|(kind, amount)| format_amount(kind, amount, catalog))
                .collect();
            if totals.is_empty() {
                insights.push(format!("{} entries logged today.", group.records.len()));
            } else {
                insights.push(format!(
                    "{} entries logged today, totalling {}.",
                    group.records.len(),
                    totals.join(" and ")
                ));
            }
        }

        insights
    }
}

//! Tool for interval statistics and insights
//!
//! This module implements the activity_stats MCP tool. Statistics the API
//! server shipped with the session are used as long as they are current;
//! otherwise they are computed from the local timeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analytics::{AnalyticsEngine, StatsTable};
use crate::display::{format_interval, ActivityCatalog};
use crate::domain::ActivityType;
use crate::feed::ActivityFeed;
use crate::tools::ToolError;

/// Parameters for the statistics tool
#[derive(Debug, Default, Deserialize)]
pub struct ActivityStatsParams {
    /// Only report this type
    #[serde(rename = "type")]
    pub activity_type: Option<String>,
}

/// Response from the statistics tool
#[derive(Debug, Serialize)]
pub struct ActivityStatsResponse {
    pub stats: StatsTable,
    /// "server" or "local"
    pub source: String,
    pub insights: Vec<String>,
    pub message: String,
}

pub fn activity_stats(
    feed: &ActivityFeed,
    analytics: &AnalyticsEngine,
    catalog: &ActivityCatalog,
    params: ActivityStatsParams,
    now: DateTime<Utc>,
) -> Result<ActivityStatsResponse, ToolError> {
    let only = ActivityType::parse_optional(params.activity_type.as_deref())?;

    let (stats, source) = if feed.stats().is_empty() {
        (analytics.compute_type_stats(feed.index()), "local")
    } else {
        (feed.stats().clone(), "server")
    };
    let insights = analytics.generate_insights(feed.index(), &stats, catalog, now);

    let lines: Vec<String> = stats
        .iter()
        .filter(|(kind, _)| only.map_or(true, |o| o == *kind))
        .map(|(kind, s)| {
            format!(
                "{} {}: every {} ± {}",
                catalog.emoji(Some(kind)),
                catalog.plural_label(kind),
                format_interval(&s.average),
                format_interval(&s.stddev)
            )
        })
        .collect();

    let mut message = String::from("📊 Time between activities\n");
    if lines.is_empty() {
        message.push_str("Not enough entries yet to compute intervals.");
    } else {
        message.push_str(&lines.join("\n"));
    }
    if !insights.is_empty() {
        message.push_str("\n\n💡 ");
        message.push_str(&insights.join("\n💡 "));
    }

    Ok(ActivityStatsResponse {
        stats,
        source: source.to_string(),
        insights,
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::FetchResponse;
    use crate::test_utils::{fixture_feed, fixture_raw, utc};
    use chrono::TimeZone;

    #[test]
    fn test_local_stats() {
        let feed = fixture_feed();
        let now = Utc.with_ymd_and_hms(2019, 9, 20, 21, 0, 0).unwrap();
        let response = activity_stats(
            &feed,
            &AnalyticsEngine::new(),
            &ActivityCatalog::standard(),
            ActivityStatsParams::default(),
            now,
        )
        .unwrap();

        assert_eq!(response.source, "local");
        assert!(response.stats.get(ActivityType::Meal).is_some());
        assert!(response.message.contains("Feedings: every"));
    }

    #[test]
    fn test_server_stats_preferred() {
        let mut feed = ActivityFeed::new(utc());
        let body = r#"[{"type": "poop", "average": {"hours": 5}, "stddev": {"hours": 1}}]"#;
        feed.begin_fetch().unwrap();
        feed.apply_fetch(
            FetchResponse {
                activities: fixture_raw(),
                stats: Some(serde_json::from_str(body).unwrap()),
            },
            None,
        )
        .unwrap();

        let params = ActivityStatsParams {
            activity_type: Some("poop".to_string()),
        };
        let response = activity_stats(
            &feed,
            &AnalyticsEngine::new(),
            &ActivityCatalog::standard(),
            params,
            Utc::now(),
        )
        .unwrap();
        assert_eq!(response.source, "server");
        assert!(response.message.contains("Diapers: every 5 hrs 0 min ± 1 hr 0 min"));
    }
}

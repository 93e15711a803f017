//! Tool for listing activities grouped by day
//!
//! This module implements the activity_list MCP tool. Days come from the
//! timeline's day nodes, so a day without entries still shows up between
//! days that have some.

use serde::{Deserialize, Serialize};

use crate::display::{render_day, ActivityCatalog};
use crate::domain::ActivityType;
use crate::feed::ActivityFeed;
use crate::timeline::DayAmounts;
use crate::tools::ToolError;

/// Parameters for listing activities
#[derive(Debug, Default, Deserialize)]
pub struct ListActivitiesParams {
    /// Number of most recent days to show
    pub days: Option<u32>,
    /// Only show these types; replaces the session's filter when given
    pub types: Option<Vec<String>>,
}

/// Summary of one listed day
#[derive(Debug, Serialize)]
pub struct DaySummary {
    pub date: String,
    pub entries: usize,
    pub amounts: DayAmounts,
}

/// Response from listing activities
#[derive(Debug, Serialize)]
pub struct ListActivitiesResponse {
    pub days: Vec<DaySummary>,
    pub total_entries: usize,
    pub message: String,
}

/// List the most recent days of the session feed
pub fn list_activities(
    feed: &mut ActivityFeed,
    catalog: &ActivityCatalog,
    params: ListActivitiesParams,
    default_days: u32,
) -> Result<ListActivitiesResponse, ToolError> {
    let days = params.days.unwrap_or(default_days);
    if days == 0 {
        return Err(ToolError::Validation {
            message: "days must be at least 1".to_string(),
        });
    }

    if let Some(types) = params.types {
        let filters = types
            .iter()
            .map(|t| t.parse::<ActivityType>())
            .collect::<Result<Vec<_>, _>>()?;
        feed.set_filters(filters);
    }

    if feed.index().is_empty() {
        return Ok(ListActivitiesResponse {
            days: Vec::new(),
            total_entries: 0,
            message: "No activities logged yet. Use activity_log to add one!".to_string(),
        });
    }

    let zone = feed.zone();
    let visible: Vec<_> = feed
        .visible_days()
        .into_iter()
        .take(days as usize)
        .collect();

    let mut summaries = Vec::with_capacity(visible.len());
    let mut blocks = Vec::with_capacity(visible.len());
    for day in &visible {
        summaries.push(DaySummary {
            date: day.day.format("%Y-%m-%d").to_string(),
            entries: day.records.len(),
            amounts: day.amounts.clone(),
        });
        blocks.push(render_day(
            day.day,
            day.records.iter().copied(),
            &day.amounts,
            catalog,
            &zone,
        ));
    }
    let total_entries = summaries.iter().map(|d| d.entries).sum();

    let filter_note = if feed.filters().is_empty() {
        String::new()
    } else {
        let names: Vec<&str> = feed.filters().iter().map(|f| f.as_str()).collect();
        format!(" (showing {})", names.join(", "))
    };
    let message = format!(
        "📋 {} entries over the last {} days{}\n\n{}",
        total_entries,
        summaries.len(),
        filter_note,
        blocks.join("\n\n")
    );

    Ok(ListActivitiesResponse {
        days: summaries,
        total_entries,
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{fixture_feed, utc};

    #[test]
    fn test_list_defaults() {
        let mut feed = fixture_feed();
        let catalog = ActivityCatalog::standard();
        let response =
            list_activities(&mut feed, &catalog, ListActivitiesParams::default(), 3).unwrap();

        assert_eq!(response.days.len(), 3);
        assert_eq!(response.days[0].date, "2019-09-20");
        assert_eq!(response.days[0].entries, 6);
        assert_eq!(response.days[2].entries, 0);
        assert_eq!(response.total_entries, 7);
        assert!(response.message.contains("Nothing logged"));
    }

    #[test]
    fn test_list_with_type_filter() {
        let mut feed = fixture_feed();
        let params = ListActivitiesParams {
            days: Some(10),
            types: Some(vec!["poop".to_string()]),
        };
        let response = list_activities(&mut feed, &ActivityCatalog::standard(), params, 3).unwrap();

        assert_eq!(response.days.len(), 8);
        assert_eq!(response.total_entries, 1);
        assert!(response.message.contains("(showing poop)"));
        assert_eq!(feed.filters(), &[ActivityType::Poop]);
    }

    #[test]
    fn test_list_rejects_bad_params() {
        let mut feed = fixture_feed();
        let catalog = ActivityCatalog::standard();
        let zero = ListActivitiesParams {
            days: Some(0),
            types: None,
        };
        assert!(list_activities(&mut feed, &catalog, zero, 3).is_err());

        let unknown = ListActivitiesParams {
            days: None,
            types: Some(vec!["walk".to_string()]),
        };
        assert!(list_activities(&mut feed, &catalog, unknown, 3).is_err());
    }

    #[test]
    fn test_list_empty_feed() {
        let mut feed = ActivityFeed::new(utc());
        let catalog = ActivityCatalog::standard();
        let response =
            list_activities(&mut feed, &catalog, ListActivitiesParams::default(), 3).unwrap();
        assert!(response.days.is_empty());
    }
}

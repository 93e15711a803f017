/// Basic unit tests to verify core functionality through the public API
use activity_timeline::*;
use chrono::{FixedOffset, TimeZone, Utc};

#[cfg(test)]
mod basic_unit_tests {
    use super::*;

    fn utc() -> DayZone {
        DayZone::Fixed(FixedOffset::east_opt(0).unwrap())
    }

    fn meal(id: &str, day: u32, hour: u32, amount: f64) -> Record {
        Record::new(
            id.into(),
            Utc.with_ymd_and_hms(2019, 9, day, hour, 0, 0).unwrap(),
            Some(ActivityType::Meal),
            Some(amount),
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_record_creation() {
        let record = meal("a", 20, 8, 3.5);
        assert_eq!(record.quantity(), Some((ActivityType::Meal, 3.5)));
        assert!(record.time_before_prev.is_none());

        let empty_id = Record::new("".into(), Utc::now(), None, None, None);
        assert!(empty_id.is_err());
    }

    #[test]
    fn test_comparator_orders_newest_first() {
        let older = meal("a", 20, 8, 1.0);
        let newer = meal("b", 20, 9, 1.0);
        assert_eq!(compare_records(&newer, &older), std::cmp::Ordering::Less);
        assert_eq!(compare_records(&older, &older), std::cmp::Ordering::Equal);
    }

    #[test]
    fn test_index_push_and_group() {
        let mut index = TimelineIndex::empty(utc());
        index.push(vec![meal("a", 18, 8, 2.0), meal("b", 20, 8, 3.0), meal("c", 20, 12, 4.0)]);

        assert_eq!(index.len(), 3);
        assert_eq!(index.get_smallest().unwrap().id.as_str(), "a");

        let groups = index.to_grouped();
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].amounts.get(ActivityType::Meal), 7.0);
        assert!(groups[1].is_empty());
        assert_eq!(groups[2].records.len(), 1);
    }

    #[test]
    fn test_index_update_by_id() {
        let mut index = TimelineIndex::empty(utc());
        index.push(vec![meal("a", 20, 8, 2.0), meal("b", 20, 12, 3.0)]);
        index.push(vec![meal("a", 20, 14, 5.0)]);

        assert_eq!(index.len(), 2);
        assert_eq!(index.get(0).unwrap().id.as_str(), "a");
        assert_eq!(
            index.get(1).unwrap().time_before_prev,
            Some(Interval::new(0, 2, 0, 0))
        );
    }

    #[test]
    fn test_display_helpers() {
        let catalog = ActivityCatalog::standard();
        assert_eq!(format_interval(&Interval::new(0, 6, 0, 0)), "6 hrs 0 min");
        assert_eq!(format_amount(ActivityType::Sleep, 1.5, &catalog), "1.5 hrs");
    }

    #[test]
    fn test_config_from_lookup() {
        let config = TimelineConfig::from_env_with(|key| match key {
            UTC_OFFSET_VAR => Some("+02:00".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(
            config.zone,
            DayZone::Fixed(FixedOffset::east_opt(7200).unwrap())
        );
        assert_eq!(config.list_days, 3);
    }

    #[test]
    fn test_analytics_engine_creation() {
        let analytics = AnalyticsEngine::new();
        let stats = analytics.compute_type_stats(&TimelineIndex::empty(utc()));
        assert!(stats.is_empty());
    }
}

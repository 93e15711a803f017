/// Basic integration tests
use activity_timeline::*;
use serde_json::{json, Value};
use std::io::Write;
use tempfile::NamedTempFile;

#[cfg(test)]
mod basic_integration_tests {
    use super::*;

    const SNAPSHOT: &str = r#"{
        "activities": [
            {"id": "ga8k0ski9vz", "dateTime": "2019-09-20T20:19:18.727Z", "type": "", "notes": "woke up"},
            {"id": "dh8k0rrp8fz", "dateTime": "2019-09-20T17:53:02.957Z", "type": "meal", "amount": "3.30"},
            {"id": "dh8k0rrjz7a", "dateTime": "2019-09-20T06:49:03.023Z", "type": "meal", "amount": "4.00"},
            {"id": "dh8k0rrosho", "dateTime": "2019-09-19T19:52:00.000Z", "type": "poop"},
            {"id": "320k0n6ia7p", "dateTime": "2019-09-16T21:26:00.000Z", "type": "meal", "amount": "2.50"}
        ],
        "stats": [
            {"type": "meal", "average": {"hours": 3, "minutes": 30}, "stddev": {"minutes": 45}}
        ]
    }"#;

    fn snapshot_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(SNAPSHOT.as_bytes())
            .expect("Failed to write snapshot");
        file
    }

    fn seeded_server() -> ActivityTimelineServer {
        let file = snapshot_file();
        let mut server = ActivityTimelineServer::new(TimelineConfig::default());
        let count = server
            .load_snapshot(file.path())
            .expect("Failed to load snapshot");
        assert_eq!(count, 5);
        server
    }

    async fn call_tool(server: &mut McpServer, id: u64, name: &str, arguments: Value) -> Value {
        let request = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "tools/call",
            "params": {"name": name, "arguments": arguments}
        });
        let response = server
            .process_line(&request.to_string())
            .await
            .expect("tools/call always answers");
        serde_json::to_value(response).expect("response serializes")
    }

    fn text(response: &Value) -> &str {
        response["result"]["content"][0]["text"]
            .as_str()
            .unwrap_or_default()
    }

    #[test]
    fn test_snapshot_seeds_feed() {
        let server = seeded_server();
        let feed = server.feed();

        assert_eq!(feed.index().len(), 5);
        assert_eq!(feed.index().nodes().len(), 5);
        assert_eq!(feed.next_page_before(), Some(1568669160));
        assert!(feed.stats().get(ActivityType::Meal).is_some());
        assert!(!feed.is_request_in_flight());

        let untyped = feed
            .index()
            .find_by_id(&RecordId::from("ga8k0ski9vz"))
            .unwrap();
        assert_eq!(untyped.kind, None);
        assert_eq!(untyped.notes.as_deref(), Some("woke up"));
    }

    #[test]
    fn test_missing_or_bad_snapshot() {
        let mut server = ActivityTimelineServer::new(TimelineConfig::default());
        let missing = server.load_snapshot(std::path::Path::new("/nonexistent/snapshot.json"));
        assert!(matches!(missing, Err(ServerError::Io(_))));

        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(b"{\"activities\": [{\"id\": \"x\", \"dateTime\": \"never\"}]}")
            .expect("Failed to write snapshot");
        let bad = server.load_snapshot(file.path());
        assert!(matches!(bad, Err(ServerError::Feed(_))));
        assert!(server.feed().index().is_empty());
        assert!(server.feed().has_error());
    }

    #[test]
    fn test_snapshot_with_oversized_stats_is_rejected() {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(
            br#"{"activities": [], "stats": [{"type": "meal", "average": {"days": 200000000000000}}]}"#,
        )
        .expect("Failed to write snapshot");

        let mut server = ActivityTimelineServer::new(TimelineConfig::default());
        let result = server.load_snapshot(file.path());
        assert!(matches!(result, Err(ServerError::Feed(_))));
        assert!(server.feed().stats().is_empty());
    }

    #[tokio::test]
    async fn test_tool_workflow() {
        let mut mcp = McpServer::new(seeded_server());

        let logged = call_tool(
            &mut mcp,
            1,
            "activity_log",
            json!({"type": "meal", "date_time": "2019-09-20T21:30:00Z", "amount": 2.5}),
        )
        .await;
        assert_eq!(logged["result"]["isError"], false);
        assert!(text(&logged).contains("3 hrs 36 mins since the previous one"));
        assert_eq!(mcp.timeline().feed().index().len(), 6);
        // Local changes invalidate the server's statistics
        assert!(mcp.timeline().feed().stats().is_empty());

        let id = mcp.timeline().feed().index().get(0).unwrap().id.to_string();

        let updated = call_tool(
            &mut mcp,
            2,
            "activity_update",
            json!({"record_id": id, "date_time": "2019-09-18T09:00:00Z"}),
        )
        .await;
        assert_eq!(updated["result"]["isError"], false);
        let index = mcp.timeline().feed().index();
        assert_eq!(index.len(), 6);
        assert_eq!(index.get(0).unwrap().id.as_str(), "ga8k0ski9vz");
        assert_eq!(index.to_grouped()[2].records.len(), 1);

        let listed = call_tool(&mut mcp, 3, "activity_list", json!({"days": 3})).await;
        assert!(text(&listed).contains("entries over the last 3 days"));
        assert!(text(&listed).contains("Friday, Sep 20"));

        let deleted = call_tool(&mut mcp, 4, "activity_delete", json!({"record_id": id})).await;
        assert_eq!(deleted["result"]["isError"], false);
        assert_eq!(mcp.timeline().feed().index().len(), 5);

        let again = call_tool(&mut mcp, 5, "activity_delete", json!({"record_id": id})).await;
        assert_eq!(again["result"]["isError"], true);
        assert_eq!(
            again["result"]["_meta"]["errorCode"],
            error_codes::RECORD_NOT_FOUND
        );
    }

    #[tokio::test]
    async fn test_latest_and_stats_tools() {
        let mut mcp = McpServer::new(seeded_server());

        let latest = call_tool(&mut mcp, 1, "activity_latest", json!({"type": "poop"})).await;
        assert!(text(&latest).contains("Last diaper"));

        let stats = call_tool(&mut mcp, 2, "activity_stats", json!({})).await;
        assert!(text(&stats).contains("Feedings: every 3 hrs 30 mins ± 0 hr 45 mins"));

        let invalid = call_tool(&mut mcp, 3, "activity_latest", json!({"type": "walk"})).await;
        assert_eq!(invalid["result"]["isError"], true);
    }

    #[test]
    fn test_feed_pagination_flow() {
        let mut feed = ActivityFeed::new(TimelineConfig::default().zone);
        let page: FetchResponse = serde_json::from_str(SNAPSHOT).unwrap();

        assert!(feed.begin_fetch().unwrap());
        assert!(matches!(feed.begin_fetch(), Err(FeedError::RequestInFlight)));
        feed.apply_fetch(page, Some(true)).unwrap();

        assert!(feed.begin_fetch().unwrap());
        feed.apply_fetch(FetchResponse::default(), Some(false)).unwrap();
        assert!(!feed.begin_fetch().unwrap());

        feed.begin_request().unwrap();
        feed.fail_request(403, None);
        assert!(!feed.is_logged_in());
        feed.logout();
        assert!(feed.index().is_empty());
    }
}

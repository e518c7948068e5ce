use httpmock::prelude::*;
use relnotes::{FetchFailure, IssueFetcher, IssueTracker, YouTrackClient};
use std::collections::BTreeSet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

#[path = "test_utils.rs"]
mod test_utils;
use test_utils::{MockTracker, closed_port, reference};

const FIELDS: &str = "idReadable,summary,customFields(name,value(text,name))";

fn client(addr: SocketAddr, timeout: Duration) -> YouTrackClient {
    let base = Url::parse(&format!("http://{addr}/api/")).expect("valid tracker url");
    YouTrackClient::new(base, "perm:test-token", timeout).expect("client builds")
}

fn mock_client(server: &MockServer, timeout: Duration) -> YouTrackClient {
    client(*server.address(), timeout)
}

#[tokio::test]
async fn test_youtrack_client_resolves_summary() {
    let server = MockServer::start_async().await;
    let issue = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/issues/PROJ-42")
                .query_param("fields", FIELDS)
                .header("authorization", "Bearer perm:test-token")
                .header("accept", "application/json");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"idReadable":"PROJ-42","summary":"  Crash on save ","customFields":[],"$type":"Issue"}"#);
        })
        .await;

    let lookup = mock_client(&server, Duration::from_secs(5))
        .fetch(&reference("PROJ-42"))
        .await
        .expect("lookup succeeds");

    assert_eq!(lookup.id, reference("PROJ-42"));
    assert_eq!(lookup.title, "Crash on save");
    assert_eq!(lookup.release_note, None);
    issue.assert_async().await;
}

#[tokio::test]
async fn test_youtrack_client_reads_release_note_field() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/issues/PROJ-7");
            then.status(200)
                .header("content-type", "application/json")
                .body(
                    r#"{
                        "idReadable": "PROJ-7",
                        "summary": "NPE in exporter",
                        "customFields": [
                            {"name": "Product team", "value": {"name": "Core", "$type": "EnumBundleElement"}},
                            {"name": "Release note", "value": {"text": " Exports work for empty sheets ", "$type": "TextFieldValue"}}
                        ]
                    }"#,
                );
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/issues/PROJ-8");
            then.status(200)
                .header("content-type", "application/json")
                .body(
                    r#"{
                        "idReadable": "PROJ-8",
                        "summary": "Refactor exporter",
                        "customFields": [
                            {"name": "Release note", "value": {"text": "No release note"}}
                        ]
                    }"#,
                );
        })
        .await;
    let client = mock_client(&server, Duration::from_secs(5));

    let noted = client
        .fetch(&reference("PROJ-7"))
        .await
        .expect("lookup succeeds");
    assert_eq!(noted.title, "NPE in exporter");
    assert_eq!(noted.display_text(), "Exports work for empty sheets");

    let silent = client
        .fetch(&reference("PROJ-8"))
        .await
        .expect("lookup succeeds");
    assert_eq!(silent.release_note, None);
    assert_eq!(silent.display_text(), "Refactor exporter");
}

#[tokio::test]
async fn test_youtrack_client_maps_status_codes() {
    let server = MockServer::start_async().await;
    for (id, status) in [("AUTH-1", 401), ("FORBID-1", 403), ("BOOM-1", 500), ("GONE-1", 404)] {
        server
            .mock_async(|when, then| {
                when.method(GET).path(format!("/api/issues/{id}"));
                then.status(status)
                    .header("content-type", "application/json")
                    .body(r#"{"error":"nope"}"#);
            })
            .await;
    }
    let client = mock_client(&server, Duration::from_secs(5));

    let cases = [
        ("AUTH-1", FetchFailure::AuthError),
        ("FORBID-1", FetchFailure::AuthError),
        ("BOOM-1", FetchFailure::HttpStatus(500)),
        ("GONE-1", FetchFailure::NotFound),
    ];
    for (id, expected) in cases {
        let result = client.fetch(&reference(id)).await;
        assert_eq!(result, Err(expected), "unexpected result for {id}");
    }
}

#[tokio::test]
async fn test_youtrack_client_rejects_malformed_bodies() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/issues/TEXT-1");
            then.status(200)
                .header("content-type", "text/html")
                .body("<html>maintenance</html>");
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/issues/NOSUM-1");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"idReadable":"NOSUM-1"}"#);
        })
        .await;
    let client = mock_client(&server, Duration::from_secs(5));

    assert_eq!(
        client.fetch(&reference("TEXT-1")).await,
        Err(FetchFailure::MalformedResponse)
    );
    assert_eq!(
        client.fetch(&reference("NOSUM-1")).await,
        Err(FetchFailure::MalformedResponse)
    );
}

#[tokio::test]
async fn test_youtrack_client_timeout() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/issues/PROJ-42");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"summary":"late"}"#)
                .delay(Duration::from_secs(5));
        })
        .await;

    let result = mock_client(&server, Duration::from_millis(200))
        .fetch(&reference("PROJ-42"))
        .await;
    assert_eq!(result, Err(FetchFailure::Timeout));
}

#[tokio::test]
async fn test_youtrack_client_unreachable() {
    let addr = closed_port().await;
    let result = client(addr, Duration::from_secs(2))
        .fetch(&reference("PROJ-42"))
        .await;
    assert_eq!(result, Err(FetchFailure::Transport));
}

#[tokio::test]
async fn test_fetcher_records_every_reference_once() {
    let tracker = MockTracker::new()
        .with_issue("PROJ-1", "One")
        .with_failure("PROJ-2", FetchFailure::AuthError)
        .shared();
    let fetcher = IssueFetcher::new(Arc::clone(&tracker));

    let references: BTreeSet<_> = ["PROJ-1", "PROJ-2", "PROJ-3"]
        .into_iter()
        .map(reference)
        .collect();
    let map = fetcher.fetch_all(&references).await;

    assert_eq!(map.len(), 3);
    assert_eq!(tracker.calls(), 3);
    for reference in &references {
        assert!(map.contains(reference));
    }
    assert_eq!(
        map.get(&reference("PROJ-1")).and_then(|l| l.as_ref().ok()).map(|s| s.title.as_str()),
        Some("One")
    );
    assert_eq!(
        map.get(&reference("PROJ-2")),
        Some(&Err(FetchFailure::AuthError))
    );
    assert_eq!(
        map.get(&reference("PROJ-3")),
        Some(&Err(FetchFailure::NotFound))
    );
    assert_eq!(map.failed().len(), 2);
}

#[tokio::test]
async fn test_fetcher_with_no_references_makes_no_calls() {
    let tracker = MockTracker::new().shared();
    let fetcher = IssueFetcher::new(Arc::clone(&tracker));

    let map = fetcher.fetch_all(&BTreeSet::new()).await;
    assert!(map.is_empty());
    assert_eq!(tracker.calls(), 0);
}

#[tokio::test]
async fn test_fetcher_bounds_concurrency() {
    let ids: Vec<String> = (1..=8).map(|n| format!("PROJ-{n}")).collect();
    let mut tracker = MockTracker::new().with_delay(Duration::from_millis(30));
    for id in &ids {
        tracker = tracker.with_issue(id, "title");
    }
    let tracker = tracker.shared();

    let fetcher = IssueFetcher::new(Arc::clone(&tracker)).with_concurrency(2);
    let references: BTreeSet<_> = ids.iter().map(|id| reference(id)).collect();
    let map = fetcher.fetch_all(&references).await;

    assert_eq!(map.len(), 8);
    assert!(map.failed().is_empty());
    assert!(tracker.max_in_flight() <= 2);
    assert!(tracker.max_in_flight() >= 1);
}

#[tokio::test]
async fn test_fetcher_timeout_marks_reference() {
    let tracker = MockTracker::new()
        .with_issue("PROJ-42", "Never arrives")
        .with_delay(Duration::from_secs(5))
        .shared();
    let fetcher = IssueFetcher::new(tracker).with_timeout(Duration::from_millis(50));

    let references: BTreeSet<_> = [reference("PROJ-42")].into_iter().collect();
    let map = fetcher.fetch_all(&references).await;

    assert_eq!(map.get(&reference("PROJ-42")), Some(&Err(FetchFailure::Timeout)));
}

#[tokio::test]
async fn test_fetcher_degrades_when_tracker_unreachable() {
    let addr = closed_port().await;
    let fetcher = IssueFetcher::new(client(addr, Duration::from_secs(2)));

    let references: BTreeSet<_> = ["PROJ-1", "PROJ-2"].into_iter().map(reference).collect();
    let map = fetcher.fetch_all(&references).await;

    assert_eq!(map.len(), 2);
    assert_eq!(map.failed().len(), 2);
    assert!(map.iter().all(|(_, lookup)| lookup == &Err(FetchFailure::Transport)));
}

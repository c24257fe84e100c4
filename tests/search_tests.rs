mod common;

use common::FakeService;
use vigil_mcp::client::ClientError;
use vigil_mcp::domain::{MonitorConfig, MonitorType};

async fn seed(service: &FakeService, names: &[&str]) {
    let client = service.client();
    for name in names {
        let config = MonitorConfig {
            name: Some(name.to_string()),
            kind: Some(MonitorType::Http),
            url: Some("https://example.com".to_string()),
            ..Default::default()
        };
        client.add_monitor(config).await.unwrap();
    }
}

#[tokio::test]
async fn plain_mode_is_case_insensitive_substring_match() {
    let service = FakeService::new();
    seed(&service, &["My HTTP Monitor", "Database", "http backup"]).await;

    let client = service.client();
    let matches = client.find_monitors("http", false).await.unwrap();
    let names: Vec<_> = matches.iter().filter_map(|m| m.name.as_deref()).collect();
    assert_eq!(names, vec!["My HTTP Monitor", "http backup"]);
}

#[tokio::test]
async fn regex_mode_anchors_work() {
    let service = FakeService::new();
    seed(&service, &["Test alpha", "alpha Test", "test beta"]).await;

    let client = service.client();
    let matches = client.find_monitors("^Test", true).await.unwrap();
    let names: Vec<_> = matches.iter().filter_map(|m| m.name.as_deref()).collect();
    // Case-insensitive, but anchored at the start.
    assert_eq!(names, vec!["Test alpha", "test beta"]);
}

#[tokio::test]
async fn malformed_pattern_fails_the_whole_operation() {
    let service = FakeService::new();
    seed(&service, &["anything"]).await;

    let client = service.client();
    let err = client.find_monitors("[unclosed", true).await.unwrap_err();
    assert!(matches!(err, ClientError::Pattern(_)));
}

#[tokio::test]
async fn no_match_is_an_empty_result_not_an_error() {
    let service = FakeService::new();
    seed(&service, &["alpha"]).await;

    let client = service.client();
    let matches = client.find_monitors("zeta", false).await.unwrap();
    assert!(matches.is_empty());
}

#[tokio::test]
async fn matches_are_projected_to_summaries() {
    let service = FakeService::new();
    let client = service.client();
    let config = MonitorConfig {
        name: Some("Site".to_string()),
        kind: Some(MonitorType::Http),
        url: Some("https://example.com".to_string()),
        description: Some("public site".to_string()),
        ..Default::default()
    };
    client.add_monitor(config).await.unwrap();

    let matches = client.find_monitors("site", false).await.unwrap();
    assert_eq!(matches.len(), 1);
    let summary = &matches[0];
    assert!(summary.id.unwrap() > 0);
    assert_eq!(summary.name.as_deref(), Some("Site"));
    assert_eq!(summary.url, "https://example.com");
    assert_eq!(summary.description, "public site");
}

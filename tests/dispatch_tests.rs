mod common;

use common::{FakeService, args};
use serde_json::{Value, json};
use vigil_mcp::server::McpServer;
use vigil_mcp::server::tools;

#[tokio::test]
async fn uninitialized_client_yields_fixed_error_message() {
    let result = tools::dispatch::<FakeService>(None, "list_monitors", &args(json!({}))).await;
    assert!(result.is_error());
    assert_eq!(result.text_content(), "Error: client not initialized");
}

#[tokio::test]
async fn unknown_tool_is_reported_in_the_envelope() {
    let service = FakeService::new();
    let client = service.client();
    let result = tools::dispatch(Some(&client), "reboot_the_moon", &args(json!({}))).await;
    assert!(result.is_error());
    assert!(result.text_content().starts_with("Error: "));
    assert!(result.text_content().contains("reboot_the_moon"));
}

#[tokio::test]
async fn missing_id_argument_is_a_validation_error() {
    let service = FakeService::new();
    let client = service.client();
    let result = tools::dispatch(Some(&client), "get_monitor_by_id", &args(json!({}))).await;
    assert!(result.is_error());
    assert!(
        result
            .text_content()
            .contains("missing required argument 'id'")
    );
}

#[tokio::test]
async fn add_monitor_requires_name_and_type() {
    let service = FakeService::new();
    let client = service.client();
    let result = tools::dispatch(
        Some(&client),
        "add_monitor",
        &args(json!({"url": "https://example.com"})),
    )
    .await;
    assert!(result.is_error());
    assert!(result.text_content().contains("'name'"));
    assert!(result.text_content().contains("'type'"));
}

#[tokio::test]
async fn full_monitor_lifecycle_through_the_tool_surface() {
    let service = FakeService::new();
    let client = service.client();

    let created = tools::dispatch(
        Some(&client),
        "add_monitor",
        &args(json!({"name": "Site", "type": "http", "url": "https://example.com"})),
    )
    .await;
    assert!(!created.is_error());
    let record: Value = serde_json::from_str(created.text_content()).unwrap();
    let id = record["id"].as_i64().unwrap();
    assert!(id > 0);
    assert_eq!(record["name"], "Site");
    assert_eq!(record["type"], "http");
    assert_eq!(record["url"], "https://example.com");

    let paused = tools::dispatch(
        Some(&client),
        "pause_monitor_by_id",
        &args(json!({"id": id})),
    )
    .await;
    assert_eq!(paused.text_content(), format!("Monitor {id} paused."));

    let fetched =
        tools::dispatch(Some(&client), "get_monitor_by_id", &args(json!({"id": id}))).await;
    let record: Value = serde_json::from_str(fetched.text_content()).unwrap();
    assert_eq!(record["active"], json!(false));

    let resumed = tools::dispatch(
        Some(&client),
        "resume_monitor_by_id",
        &args(json!({"id": id})),
    )
    .await;
    assert_eq!(resumed.text_content(), format!("Monitor {id} resumed."));

    let fetched =
        tools::dispatch(Some(&client), "get_monitor_by_id", &args(json!({"id": id}))).await;
    let record: Value = serde_json::from_str(fetched.text_content()).unwrap();
    assert_eq!(record["active"], json!(true));

    let removed = tools::dispatch(
        Some(&client),
        "remove_monitor_by_id",
        &args(json!({"id": id})),
    )
    .await;
    assert_eq!(removed.text_content(), format!("Monitor {id} removed."));

    let listed = tools::dispatch(Some(&client), "list_monitors", &args(json!({}))).await;
    let records: Value = serde_json::from_str(listed.text_content()).unwrap();
    assert!(
        records
            .as_array()
            .unwrap()
            .iter()
            .all(|m| m["id"].as_i64() != Some(id))
    );
}

#[tokio::test]
async fn update_through_the_tool_surface_keeps_unmentioned_fields() {
    let service = FakeService::new();
    let client = service.client();

    let created = tools::dispatch(
        Some(&client),
        "add_monitor",
        &args(json!({
            "name": "Site",
            "type": "http",
            "url": "https://example.com",
            "interval": 60
        })),
    )
    .await;
    let record: Value = serde_json::from_str(created.text_content()).unwrap();
    let id = record["id"].as_i64().unwrap();

    let updated = tools::dispatch(
        Some(&client),
        "update_monitor_by_id",
        &args(json!({"id": id, "interval": 120})),
    )
    .await;
    assert!(!updated.is_error());
    let record: Value = serde_json::from_str(updated.text_content()).unwrap();
    assert_eq!(record["interval"], 120);
    assert_eq!(record["url"], "https://example.com");
    assert_eq!(record["name"], "Site");
}

#[tokio::test]
async fn find_monitors_by_name_defaults_to_plain_mode() {
    let service = FakeService::new();
    let client = service.client();
    tools::dispatch(
        Some(&client),
        "add_monitor",
        &args(json!({"name": "My HTTP Monitor", "type": "http", "url": "https://example.com"})),
    )
    .await;

    let found = tools::dispatch(
        Some(&client),
        "find_monitors_by_name",
        &args(json!({"searchTerm": "http"})),
    )
    .await;
    assert!(!found.is_error());
    let summaries: Value = serde_json::from_str(found.text_content()).unwrap();
    assert_eq!(summaries.as_array().unwrap().len(), 1);
    assert_eq!(summaries[0]["name"], "My HTTP Monitor");
}

#[tokio::test]
async fn invalid_regex_is_a_pattern_error_not_an_empty_result() {
    let service = FakeService::new();
    let client = service.client();
    let found = tools::dispatch(
        Some(&client),
        "find_monitors_by_name",
        &args(json!({"searchTerm": "[unclosed", "useRegex": true})),
    )
    .await;
    assert!(found.is_error());
    assert!(found.text_content().contains("invalid search pattern"));
}

#[tokio::test]
async fn server_answers_initialize_and_lists_tools() {
    let server = McpServer::<FakeService>::new(None);

    let response = server
        .handle_line(r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2025-06-18"}}"#)
        .await
        .unwrap();
    let result = response.result.unwrap();
    assert_eq!(result["serverInfo"]["name"], "vigil-mcp");
    assert_eq!(result["protocolVersion"], "2025-06-18");

    let response = server
        .handle_line(r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#)
        .await
        .unwrap();
    let tools = response.result.unwrap()["tools"].as_array().unwrap().len();
    assert_eq!(tools, 8);
}

#[tokio::test]
async fn server_ignores_notifications_and_rejects_unknown_methods() {
    let server = McpServer::<FakeService>::new(None);

    let none = server
        .handle_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
        .await;
    assert!(none.is_none());

    let response = server
        .handle_line(r#"{"jsonrpc":"2.0","id":3,"method":"resources/list"}"#)
        .await
        .unwrap();
    assert_eq!(response.error.unwrap().code, -32601);
}

#[tokio::test]
async fn tool_call_with_bad_params_is_invalid_params() {
    let server = McpServer::<FakeService>::new(None);
    let response = server
        .handle_line(r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{"arguments":{}}}"#)
        .await
        .unwrap();
    assert_eq!(response.error.unwrap().code, -32602);
}

#[tokio::test]
async fn tool_call_error_is_flagged_in_the_result_envelope() {
    let server = McpServer::<FakeService>::new(None);
    let response = server
        .handle_line(
            r#"{"jsonrpc":"2.0","id":5,"method":"tools/call","params":{"name":"list_monitors"}}"#,
        )
        .await
        .unwrap();
    let result = response.result.unwrap();
    assert_eq!(result["isError"], json!(true));
    assert_eq!(
        result["content"][0]["text"],
        "Error: client not initialized"
    );
}

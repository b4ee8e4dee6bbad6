//! End-to-end runs of the todo processing pipeline

use pretty_assertions::assert_eq;
use rivulet_core::{CompletionMode, FlowManagerConfig, ValueMap};
use rivulet_integration_tests::TestHarness;
use rivulet_state_inmemory::InMemoryStateStoreProvider;
use rivulet_stdlib::{todo_processing_flow, Todo, TodoRepository};
use serde_json::json;

#[tokio::test]
async fn test_valid_todo_is_stored_and_reported() {
    let harness = TestHarness::new();

    let result = harness.submit_todo("buy milk").await.unwrap();
    let report = &result["processingResult"];

    assert_eq!(report["success"], json!(true));
    assert_eq!(report["error"], json!(null));
    assert_eq!(report["todo"]["text"], json!("buy milk"));
    assert!(report["todo"]["id"].is_number());

    let created_at = report["todo"]["createdAt"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(created_at).is_ok());

    let stored = harness.store.todo_repository().list().await.unwrap();
    let reported: Todo = serde_json::from_value(report["todo"].clone()).unwrap();
    assert_eq!(stored, vec![reported]);
}

#[tokio::test]
async fn test_empty_text_reports_failure_and_stores_nothing() {
    let harness = TestHarness::new();

    let result = harness.submit_todo("").await.unwrap();

    assert_eq!(
        result,
        ValueMap::from([(
            "processingResult".to_string(),
            json!({"success": false, "error": "Text is required", "todo": null})
        )])
    );
    assert_eq!(harness.store.todo_count().await, 0);
}

#[tokio::test]
async fn test_overlong_text_is_rejected() {
    let harness = TestHarness::new();

    let result = harness.submit_todo(&"a".repeat(101)).await.unwrap();
    let report = &result["processingResult"];

    assert_eq!(report["success"], json!(false));
    assert_eq!(report["error"], json!("Text must be at most 100 characters"));
    assert_eq!(harness.store.todo_count().await, 0);
}

#[tokio::test]
async fn test_raw_value_names_can_be_requested() {
    let harness = TestHarness::with(
        FlowManagerConfig::default().with_completion_mode(CompletionMode::FullCompletion),
        InMemoryStateStoreProvider::new(),
    );
    let initial = ValueMap::from([("input".to_string(), json!({"text": "walk dog"}))]);

    let result = harness
        .manager
        .run(
            &todo_processing_flow(),
            initial,
            ["validation", "processingResult"],
            &harness.resolvers,
        )
        .await
        .unwrap();

    assert_eq!(result["validation"], json!({"ok": {"text": "walk dog"}}));
    assert_eq!(result["processingResult"]["success"], json!(true));
}

#[tokio::test]
async fn test_storage_failure_aborts_the_run() {
    let harness = TestHarness::with(
        FlowManagerConfig::default(),
        InMemoryStateStoreProvider::with_capacity_limit(0),
    );

    let err = harness.submit_todo("buy milk").await.unwrap_err();

    assert_eq!(err.error_code(), "ERR_FLOW_RESOLVER");
    assert_eq!(err.task(), Some("storage"));
}

//! Definition and runtime failures surfaced by the manager

use rivulet_core::{DefinitionError, FlowDefinition, FlowError, ParamBinding, TaskSpec, ValueMap};
use rivulet_integration_tests::TestHarness;
use serde_json::json;

#[tokio::test]
async fn test_unknown_resolver_is_named() {
    let harness = TestHarness::new();
    let flow = FlowDefinition::new().task("mystery", TaskSpec::new("app::doesNotExist").provides(["x"]));

    let err = harness
        .manager
        .run(&flow, ValueMap::new(), ["x"], &harness.resolvers)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("app::doesNotExist"));
    assert!(matches!(err, FlowError::UnknownResolver { ref task, .. } if task == "mystery"));
}

#[tokio::test]
async fn test_duplicate_producer_stops_before_storage() {
    let harness = TestHarness::new();

    let mut flow = rivulet_stdlib::todo_processing_flow();
    flow.tasks.insert(
        "shadow".to_string(),
        TaskSpec::new("builtin::Echo")
            .provides(["todo"])
            .param("todo", ParamBinding::literal(json!({"ok": {"id": 1, "text": "x", "createdAt": "now"}}))),
    );

    let initial = ValueMap::from([("input".to_string(), json!({"text": "buy milk"}))]);
    let err = harness
        .manager
        .run(&flow, initial, ["processingResult"], &harness.resolvers)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        FlowError::Definition(DefinitionError::DuplicateProducer { ref value, .. }) if value == "todo"
    ));
    assert_eq!(harness.store.todo_count().await, 0);
}

#[tokio::test]
async fn test_cycle_is_rejected() {
    let harness = TestHarness::new();
    let flow = FlowDefinition::new()
        .task("ping", TaskSpec::new("builtin::Echo").requires(["pong"]).provides(["ping"]))
        .task("pong", TaskSpec::new("builtin::Echo").requires(["ping"]).provides(["pong"]));

    let err = harness
        .manager
        .run(&flow, ValueMap::new(), ["ping"], &harness.resolvers)
        .await
        .unwrap_err();

    assert!(matches!(err, FlowError::Definition(DefinitionError::Cycle { .. })));
}

#[tokio::test]
async fn test_throw_error_aborts_with_message() {
    let harness = TestHarness::new();
    let flow = FlowDefinition::new().task(
        "fail",
        TaskSpec::new("builtin::ThrowError")
            .provides(["never"])
            .param("message", ParamBinding::literal("upstream rejected request")),
    );

    let err = harness
        .manager
        .run(&flow, ValueMap::new(), ["never"], &harness.resolvers)
        .await
        .unwrap_err();

    match err {
        FlowError::Resolver { task, source } => {
            assert_eq!(task, "fail");
            assert_eq!(source.to_string(), "upstream rejected request");
        }
        other => panic!("unexpected error: {other}"),
    }
}

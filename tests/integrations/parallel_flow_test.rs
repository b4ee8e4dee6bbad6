//! The fan-in example flow built from built-in resolvers

use pretty_assertions::assert_eq;
use rivulet_core::{FlowDefinition, ParamBinding, TaskSpec, ValueMap};
use rivulet_integration_tests::TestHarness;
use rivulet_stdlib::parallel_processing_flow;
use serde_json::json;
use std::time::Duration;
use tokio::time::Instant;

#[tokio::test]
async fn test_parallel_flow_result() {
    let harness = TestHarness::new();

    let result = harness
        .manager
        .run(
            &parallel_processing_flow(),
            ValueMap::new(),
            ["parallelResult"],
            &harness.resolvers,
        )
        .await
        .unwrap();

    assert_eq!(
        result,
        ValueMap::from([("parallelResult".to_string(), json!("All tasks completed"))])
    );
}

#[tokio::test]
async fn test_flow_loaded_from_json_matches_builder() {
    let from_json = FlowDefinition::from_json(json!({
        "tasks": {
            "taskA": {
                "provides": ["resultA"],
                "resolver": {"name": "builtin::Echo", "params": {"value": "TaskA completed"}, "results": {"resultA": "value"}}
            },
            "taskB": {
                "provides": ["resultB"],
                "resolver": {"name": "builtin::Echo", "params": {"value": "TaskB completed"}, "results": {"resultB": "value"}}
            },
            "taskC": {
                "requires": ["resultA", "resultB"],
                "provides": ["finalResult"],
                "resolver": {"name": "builtin::Echo", "params": {"value": "All tasks completed"}, "results": {"finalResult": "value"}}
            }
        },
        "results": {"parallelResult": "finalResult"}
    }))
    .unwrap();

    assert_eq!(from_json, parallel_processing_flow());
}

#[tokio::test(start_paused = true)]
async fn test_waiting_branches_overlap() {
    let harness = TestHarness::new();

    let wait = |ms: u64, provides: &str| {
        TaskSpec::new("builtin::Wait")
            .provides([provides])
            .param("ms", ParamBinding::literal(ms))
            .param("result", ParamBinding::literal(provides))
            .result(provides, "result")
    };

    let flow = FlowDefinition::new()
        .task("left", wait(200, "l"))
        .task("right", wait(200, "r"))
        .task(
            "join",
            TaskSpec::new("builtin::Echo")
                .requires(["l", "r"])
                .provides(["joined"])
                .param("joined", ParamBinding::value("l")),
        );

    let started = Instant::now();
    let result = harness
        .manager
        .run(&flow, ValueMap::new(), ["joined"], &harness.resolvers)
        .await
        .unwrap();

    assert_eq!(result["joined"], json!("l"));
    assert!(started.elapsed() < Duration::from_millis(300));
}

//! Todo submissions through the service: pipeline plus parallel flow

use pretty_assertions::assert_eq;
use rivulet_integration_tests::TestHarness;
use rivulet_stdlib::{Submission, TodoRepository};
use serde_json::json;

#[tokio::test]
async fn test_accepted_todo_reports_list_and_parallel_result() -> anyhow::Result<()> {
    let harness = TestHarness::new();
    let service = harness.service();

    service.submit("first").await?;
    let submission = service.submit("second").await?;

    let Submission::Accepted(report) = &submission else {
        anyhow::bail!("expected an accepted submission, got {submission:?}");
    };
    assert!(report.success);
    assert_eq!(report.todo.text, "second");
    assert_eq!(report.todos, harness.store.todo_repository().list().await?);
    assert_eq!(report.todos.last(), Some(&report.todo));
    assert_eq!(report.parallel_result, json!("All tasks completed"));

    let value = submission.to_value()?;
    assert_eq!(value["success"], json!(true));
    assert_eq!(value["todo"]["text"], json!("second"));
    assert_eq!(value["todos"].as_array().map(Vec::len), Some(2));
    assert_eq!(value["parallelResult"], json!("All tasks completed"));
    assert!(value.get("error").is_none());
    Ok(())
}

#[tokio::test]
async fn test_rejected_todo_skips_parallel_flow() -> anyhow::Result<()> {
    let harness = TestHarness::new();
    let service = harness.service();

    let submission = service.submit(&"a".repeat(101)).await?;

    assert_eq!(
        submission.to_value()?,
        json!({"success": false, "error": "Text must be at most 100 characters"})
    );
    assert!(service.list().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_list_returns_todos_in_submission_order() -> anyhow::Result<()> {
    let harness = TestHarness::new();
    let service = harness.service();

    for text in ["one", "two", "three"] {
        service.submit(text).await?;
    }

    let texts: Vec<String> = service.list().await?.into_iter().map(|t| t.text).collect();
    assert_eq!(texts, vec!["one", "two", "three"]);
    Ok(())
}

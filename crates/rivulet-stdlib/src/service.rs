//! Todo submission workflow
//!
//! Runs the todo pipeline and, when the todo was stored, the parallel flow,
//! combining both into one report.

use rivulet_core::{FlowError, FlowManager, ResolverRegistry, ValueMap};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::components::todo::{Todo, TodoRepository, TodoResult};
use crate::error::TodoError;
use crate::flows::{parallel_processing_flow, todo_processing_flow};
use crate::standard_registry;

/// Errors that prevent a submission from producing a report
#[derive(Error, Debug)]
pub enum ServiceError {
    /// A flow run failed
    #[error(transparent)]
    Flow(#[from] FlowError),

    /// The repository failed
    #[error(transparent)]
    Todo(#[from] TodoError),

    /// A flow finished without the expected result
    #[error("Flow returned no usable '{0}'")]
    MissingResult(String),
}

/// Report for an accepted todo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoSubmission {
    /// Always `true`
    pub success: bool,
    /// The stored todo
    pub todo: Todo,
    /// Every stored todo after this one was added
    pub todos: Vec<Todo>,
    /// Result of the parallel flow
    pub parallel_result: Value,
}

/// Result of submitting a todo
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// The todo was validated and stored
    Accepted(TodoSubmission),
    /// The input was rejected; nothing was stored
    Rejected {
        /// Why the input was rejected
        error: String,
    },
}

impl Submission {
    /// JSON report in the same shape for both outcomes
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        match self {
            Submission::Accepted(report) => serde_json::to_value(report),
            Submission::Rejected { error } => Ok(json!({ "success": false, "error": error })),
        }
    }
}

/// Submits and lists todos through the flows
pub struct TodoService {
    manager: FlowManager,
    resolvers: ResolverRegistry,
    repository: Arc<dyn TodoRepository>,
}

impl TodoService {
    /// Build a service with the standard registry storing into `repository`
    pub fn new(manager: FlowManager, repository: Arc<dyn TodoRepository>) -> Result<Self, TodoError> {
        let resolvers = standard_registry(repository.clone())?;
        Ok(Self {
            manager,
            resolvers,
            repository,
        })
    }

    /// Resolvers used by this service
    pub fn resolvers(&self) -> &ResolverRegistry {
        &self.resolvers
    }

    /// Validate and store a todo
    ///
    /// Rejected input is a normal outcome, not an error.
    pub async fn submit(&self, text: &str) -> Result<Submission, ServiceError> {
        info!(text, "New todo request");

        let initial = ValueMap::from([("input".to_string(), json!({ "text": text }))]);
        let mut result = self
            .manager
            .run(&todo_processing_flow(), initial, ["processingResult"], &self.resolvers)
            .await?;

        let report: TodoResult = result
            .remove("processingResult")
            .and_then(|v| serde_json::from_value(v).ok())
            .ok_or_else(|| ServiceError::MissingResult("processingResult".to_string()))?;

        let todo = match report {
            TodoResult {
                success: true,
                todo: Some(todo),
                ..
            } => todo,
            TodoResult { error, .. } => {
                return Ok(Submission::Rejected {
                    error: error.unwrap_or_else(|| "Unknown error".to_string()),
                })
            }
        };

        let mut parallel = self
            .manager
            .run(&parallel_processing_flow(), ValueMap::new(), ["parallelResult"], &self.resolvers)
            .await?;
        let parallel_result = parallel
            .remove("parallelResult")
            .ok_or_else(|| ServiceError::MissingResult("parallelResult".to_string()))?;

        Ok(Submission::Accepted(TodoSubmission {
            success: true,
            todo,
            todos: self.repository.list().await?,
            parallel_result,
        }))
    }

    /// Every stored todo, oldest first
    pub async fn list(&self) -> Result<Vec<Todo>, TodoError> {
        self.repository.list().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::todo::MockTodoRepository;
    use pretty_assertions::assert_eq;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("rivulet_stdlib=debug,rivulet_core=debug")
            .with_test_writer()
            .try_init();
    }

    #[tokio::test]
    async fn test_rejected_input_skips_storage() {
        init_tracing();
        let mut repository = MockTodoRepository::new();
        repository.expect_append().times(0);
        repository.expect_list().times(0);

        let service = TodoService::new(FlowManager::default(), Arc::new(repository)).unwrap();
        let submission = service.submit("").await.unwrap();

        assert_eq!(
            submission,
            Submission::Rejected {
                error: "Text is required".to_string()
            }
        );
        assert_eq!(
            submission.to_value().unwrap(),
            json!({"success": false, "error": "Text is required"})
        );
    }

    #[tokio::test]
    async fn test_repository_failure_is_an_error() {
        init_tracing();
        let mut repository = MockTodoRepository::new();
        repository
            .expect_append()
            .returning(|_| Err(TodoError::Storage("offline".to_string())));

        let service = TodoService::new(FlowManager::default(), Arc::new(repository)).unwrap();
        let err = service.submit("buy milk").await.unwrap_err();

        assert!(matches!(err, ServiceError::Flow(FlowError::Resolver { .. })));
    }
}

//! Todo processing pipeline
//!
//! Four resolvers chained through the value space:
//! `input -> validation -> todo -> savedTodo -> result`. Each intermediate
//! value is an [`Outcome`]; once a stage publishes `Err`, later stages pass it
//! through unchanged so the notifier can report it.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use jsonschema::error::ValidationErrorKind;
use jsonschema::{Draft, JSONSchema};
use rivulet_core::{DomainError, Outcome, Resolver, ResolverRegistry, ValueMap};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::TodoError;

/// Registry name of [`ValidateInput`]
pub const VALIDATE_INPUT: &str = "app::validateInput";
/// Registry name of [`ProcessTodo`]
pub const PROCESS_TODO: &str = "app::processTodo";
/// Registry name of [`StoreTodo`]
pub const STORE_TODO: &str = "app::storeTodo";
/// Registry name of [`NotifyCompletion`]
pub const NOTIFY_COMPLETION: &str = "app::notifyCompletion";

/// Longest accepted todo text, in characters
pub const MAX_TEXT_LENGTH: u64 = 100;

/// A stored todo item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    /// Creation time in epoch milliseconds
    pub id: i64,
    /// Todo text
    pub text: String,
    /// Creation time, RFC 3339
    pub created_at: String,
}

impl Todo {
    /// Create a todo stamped with the current time
    pub fn new(text: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: now.timestamp_millis(),
            text: text.into(),
            created_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// Validated request payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoInput {
    /// Todo text
    pub text: String,
}

/// Final report produced by the notifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoResult {
    /// Whether the todo was stored
    pub success: bool,
    /// Failure message, if any
    pub error: Option<String>,
    /// The stored todo, if any
    pub todo: Option<Todo>,
}

impl From<Outcome<Todo>> for TodoResult {
    fn from(outcome: Outcome<Todo>) -> Self {
        match outcome {
            Outcome::Ok(todo) => Self {
                success: true,
                error: None,
                todo: Some(todo),
            },
            Outcome::Err(e) => Self {
                success: false,
                error: Some(e.message),
                todo: None,
            },
        }
    }
}

/// Storage capability used by [`StoreTodo`]
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TodoRepository: Send + Sync {
    /// Append a todo
    async fn append(&self, todo: Todo) -> Result<(), TodoError>;

    /// All stored todos, oldest first
    async fn list(&self) -> Result<Vec<Todo>, TodoError>;
}

fn read_outcome<T: DeserializeOwned>(params: &ValueMap, name: &str) -> Result<Outcome<T>, TodoError> {
    let value = params.get(name).cloned().ok_or_else(|| TodoError::MalformedValue {
        name: name.to_string(),
        reason: "value is missing".to_string(),
    })?;
    serde_json::from_value(value).map_err(|e| TodoError::MalformedValue {
        name: name.to_string(),
        reason: e.to_string(),
    })
}

fn single_output<T: Serialize>(name: &str, value: &T) -> anyhow::Result<ValueMap> {
    Ok(ValueMap::from([(name.to_string(), serde_json::to_value(value)?)]))
}

/// Receptionist: checks `input` against the todo schema and publishes `validation`
pub struct ValidateInput {
    schema: JSONSchema,
}

impl ValidateInput {
    /// Compile the input schema
    pub fn new() -> Result<Self, TodoError> {
        let schema = json!({
            "type": "object",
            "required": ["text"],
            "properties": {
                "text": {
                    "type": "string",
                    "minLength": 1,
                    "maxLength": MAX_TEXT_LENGTH
                }
            }
        });

        let schema = JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(&schema)
            .map_err(|e| TodoError::InvalidSchema(e.to_string()))?;

        Ok(Self { schema })
    }

    /// Validate a raw input value
    pub fn check(&self, input: Option<&Value>) -> Outcome<TodoInput> {
        let input = match input {
            None | Some(Value::Null) => return Outcome::Err(DomainError::new("No input data")),
            Some(input) => input,
        };

        if let Err(errors) = self.schema.validate(input) {
            let messages: Vec<String> = errors
                .map(|error| match &error.kind {
                    ValidationErrorKind::Required { .. } | ValidationErrorKind::MinLength { .. } => {
                        "Text is required".to_string()
                    }
                    ValidationErrorKind::MaxLength { limit } => {
                        format!("Text must be at most {} characters", limit)
                    }
                    _ => format!("{} at '{}'", error, error.instance_path),
                })
                .collect();
            return Outcome::Err(DomainError::new(messages.join(", ")));
        }

        serde_json::from_value::<TodoInput>(input.clone())
            .map_err(|e| DomainError::new(e.to_string()))
            .into()
    }
}

#[async_trait]
impl Resolver for ValidateInput {
    async fn execute(&self, params: ValueMap) -> anyhow::Result<ValueMap> {
        debug!(input = ?params.get("input"), "Receptionist: validating input");

        let validation = self.check(params.get("input"));
        if let Outcome::Err(e) = &validation {
            debug!(error = %e, "Receptionist: input rejected");
        }
        single_output("validation", &validation)
    }
}

/// Processor: turns a valid input into a [`Todo`] published as `todo`
#[derive(Debug, Default)]
pub struct ProcessTodo;

#[async_trait]
impl Resolver for ProcessTodo {
    async fn execute(&self, params: ValueMap) -> anyhow::Result<ValueMap> {
        let validation: Outcome<TodoInput> = read_outcome(&params, "validation")?;

        let todo = validation.and_then(|input| Outcome::Ok(Todo::new(input.text)));
        if let Outcome::Ok(todo) = &todo {
            debug!(id = todo.id, "Processor: todo created");
        }
        single_output("todo", &todo)
    }
}

/// Storage: appends a successfully processed todo and publishes `savedTodo`
pub struct StoreTodo {
    repository: Arc<dyn TodoRepository>,
}

impl StoreTodo {
    /// Store todos in `repository`
    pub fn new(repository: Arc<dyn TodoRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl Resolver for StoreTodo {
    async fn execute(&self, params: ValueMap) -> anyhow::Result<ValueMap> {
        let todo: Outcome<Todo> = read_outcome(&params, "todo")?;

        if let Outcome::Ok(todo) = &todo {
            self.repository.append(todo.clone()).await?;
            info!(id = todo.id, "Storage: todo saved");
        }
        single_output("savedTodo", &todo)
    }
}

/// Notifier: publishes the final [`TodoResult`] as `result`
#[derive(Debug, Default)]
pub struct NotifyCompletion;

#[async_trait]
impl Resolver for NotifyCompletion {
    async fn execute(&self, params: ValueMap) -> anyhow::Result<ValueMap> {
        let saved: Outcome<Todo> = read_outcome(&params, "savedTodo")?;

        let result = TodoResult::from(saved);
        debug!(success = result.success, "Notifier: processing finished");
        single_output("result", &result)
    }
}

/// Register the four todo pipeline resolvers, storing into `repository`
pub fn register_todo_resolvers(
    registry: &mut ResolverRegistry,
    repository: Arc<dyn TodoRepository>,
) -> Result<(), TodoError> {
    registry
        .register(VALIDATE_INPUT, ValidateInput::new()?)
        .register(PROCESS_TODO, ProcessTodo)
        .register(STORE_TODO, StoreTodo::new(repository))
        .register(NOTIFY_COMPLETION, NotifyCompletion);
    Ok(())
}

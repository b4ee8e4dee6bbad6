use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use rivulet_stdlib::{Todo, TodoError, TodoRepository};

/// Errors from the in-memory store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// The configured capacity is reached
    #[error("Todo store is full ({capacity} items)")]
    CapacityExceeded {
        /// Configured limit
        capacity: usize,
    },
}

impl From<StateError> for TodoError {
    fn from(err: StateError) -> Self {
        TodoError::Storage(err.to_string())
    }
}

/// In-memory implementation of the TodoRepository
#[derive(Clone, Default)]
pub struct InMemoryTodoRepository {
    todos: Arc<RwLock<Vec<Todo>>>,
    capacity: Option<usize>,
}

impl InMemoryTodoRepository {
    /// Create an empty, unbounded repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository over existing shared storage
    pub fn from_shared(todos: Arc<RwLock<Vec<Todo>>>, capacity: Option<usize>) -> Self {
        Self { todos, capacity }
    }

    async fn insert(&self, todo: Todo) -> Result<(), StateError> {
        let mut todos = self.todos.write().await;

        if let Some(capacity) = self.capacity {
            if todos.len() >= capacity {
                warn!(capacity, "Todo store is full");
                return Err(StateError::CapacityExceeded { capacity });
            }
        }

        debug!(id = todo.id, "Storing todo");
        todos.push(todo);
        Ok(())
    }
}

#[async_trait]
impl TodoRepository for InMemoryTodoRepository {
    async fn append(&self, todo: Todo) -> Result<(), TodoError> {
        Ok(self.insert(todo).await?)
    }

    async fn list(&self) -> Result<Vec<Todo>, TodoError> {
        let todos = self.todos.read().await;
        Ok(todos.clone())
    }
}

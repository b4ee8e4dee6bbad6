//! In-memory state store for Rivulet
//!
//! Storage lives behind `Arc<RwLock<..>>`, so every repository handed out by a
//! provider sees the same data. Nothing is persisted; useful for development,
//! tests and the demo binary.

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

pub mod repositories;
pub use repositories::{InMemoryTodoRepository, StateError};

use rivulet_stdlib::{Todo, TodoRepository};

/// Provider for in-memory repositories sharing one backing store
#[derive(Clone, Default)]
pub struct InMemoryStateStoreProvider {
    todos: Arc<RwLock<Vec<Todo>>>,
    capacity: Option<usize>,
}

impl InMemoryStateStoreProvider {
    /// Create a provider with unbounded storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider whose todo storage holds at most `capacity` items
    pub fn with_capacity_limit(capacity: usize) -> Self {
        Self {
            todos: Arc::default(),
            capacity: Some(capacity),
        }
    }

    /// Todo repository backed by this provider's storage
    pub fn todo_repository(&self) -> Arc<dyn TodoRepository> {
        debug!("Creating in-memory todo repository");
        Arc::new(InMemoryTodoRepository::from_shared(
            self.todos.clone(),
            self.capacity,
        ))
    }

    /// Number of stored todos
    pub async fn todo_count(&self) -> usize {
        self.todos.read().await.len()
    }
}

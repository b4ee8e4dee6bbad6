//!
//! Standard library of resolvers and flows for Rivulet
//!

pub mod components;
pub mod error;
pub mod flows;
pub mod service;

use rivulet_core::ResolverRegistry;
use std::sync::Arc;

pub use components::builtin::register_builtins;
pub use components::todo::{
    register_todo_resolvers, Todo, TodoInput, TodoRepository, TodoResult,
};
pub use error::TodoError;
pub use flows::{parallel_processing_flow, todo_processing_flow};
pub use service::{ServiceError, Submission, TodoService, TodoSubmission};

/// Registry holding the built-ins and the todo pipeline
pub fn standard_registry(
    repository: Arc<dyn TodoRepository>,
) -> Result<ResolverRegistry, TodoError> {
    let mut registry = ResolverRegistry::new();
    register_builtins(&mut registry);
    register_todo_resolvers(&mut registry, repository)?;
    Ok(registry)
}

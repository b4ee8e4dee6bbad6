//!
//! Rivulet Core - data-flow task orchestration
//!
//! A flow is a set of named tasks. Each task declares the values it requires
//! and the values it provides, and is bound to a resolver by name. Running a
//! flow launches every task as soon as its inputs exist, concurrently with any
//! other ready task, until the requested results are available.
//!
//! ```no_run
//! use rivulet_core::{FlowDefinition, ResolverRegistry, TaskSpec, ValueMap};
//! use serde_json::json;
//!
//! # async fn demo() -> Result<(), rivulet_core::FlowError> {
//! let flow = FlowDefinition::new()
//!     .task("greet", TaskSpec::new("hello").requires(["name"]).provides(["greeting"]))
//!     .result("message", "greeting");
//!
//! let mut resolvers = ResolverRegistry::new();
//! resolvers.register_fn("hello", |params: ValueMap| async move {
//!     let name = params["name"].as_str().unwrap_or("world").to_string();
//!     Ok(ValueMap::from([("greeting".to_string(), json!(format!("hello {name}")))]))
//! });
//!
//! let initial = ValueMap::from([("name".to_string(), json!("rivulet"))]);
//! let result = rivulet_core::run(&flow, initial, ["message"], &resolvers).await?;
//! assert_eq!(result["message"], json!("hello rivulet"));
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Domain layer - flow model, value space and resolvers
pub mod domain;

/// Application services - run coordination
pub mod application;

/// Core types
pub mod types;

/// Error types
pub mod error;

/// Run configuration
pub mod config;

pub use application::flow_manager::FlowManager;
pub use application::result_extractor::ResultExtractor;
pub use config::{CompletionMode, FlowManagerConfig};
pub use domain::flow_definition::{FlowDefinition, ParamBinding, ResolverRef, TaskSpec};
pub use domain::resolver::{FnResolver, Resolver, ResolverRegistry};
pub use domain::run_state::{RunState, TaskRunState};
pub use domain::value_store::{AlreadyWritten, ValueStore};
pub use error::{DefinitionError, FlowError};
pub use types::{DomainError, Outcome, ValueMap};

/// Run a flow with the default configuration
///
/// Shorthand for `FlowManager::default().run(..)`.
pub async fn run<I, S>(
    flow: &FlowDefinition,
    initial: ValueMap,
    expected: I,
    resolvers: &ResolverRegistry,
) -> Result<ValueMap, FlowError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    FlowManager::default()
        .run(flow, initial, expected, resolvers)
        .await
}

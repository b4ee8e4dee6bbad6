// Rivulet Integration Tests
//
// Shared harness for running the stdlib flows end to end

use rivulet_core::{FlowError, FlowManager, FlowManagerConfig, ResolverRegistry, ValueMap};
use rivulet_state_inmemory::InMemoryStateStoreProvider;
use rivulet_stdlib::{standard_registry, todo_processing_flow, TodoService};
use serde_json::json;

/// Manager, registry and backing store wired together
pub struct TestHarness {
    /// Storage shared with the todo pipeline
    pub store: InMemoryStateStoreProvider,
    /// Built-ins plus the todo pipeline
    pub resolvers: ResolverRegistry,
    /// Manager under test
    pub manager: FlowManager,
}

impl TestHarness {
    /// Harness with default configuration and unbounded storage
    pub fn new() -> Self {
        Self::with(FlowManagerConfig::default(), InMemoryStateStoreProvider::new())
    }

    /// Harness with explicit configuration and storage
    pub fn with(config: FlowManagerConfig, store: InMemoryStateStoreProvider) -> Self {
        rivulet_monitoring::init_test_tracing();

        let resolvers = standard_registry(store.todo_repository())
            .unwrap_or_else(|e| panic!("failed to build registry: {e}"));

        Self {
            store,
            resolvers,
            manager: FlowManager::new(config),
        }
    }

    /// Run the todo pipeline for one text and return `processingResult`
    pub async fn submit_todo(&self, text: &str) -> Result<ValueMap, FlowError> {
        let initial = ValueMap::from([("input".to_string(), json!({ "text": text }))]);
        self.manager
            .run(&todo_processing_flow(), initial, ["processingResult"], &self.resolvers)
            .await
    }

    /// Submission service sharing this harness's manager and storage
    pub fn service(&self) -> TodoService {
        TodoService::new(self.manager.clone(), self.store.todo_repository())
            .unwrap_or_else(|e| panic!("failed to build service: {e}"))
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

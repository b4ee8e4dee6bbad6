//! Run coordinator
//!
//! A run is driven by one coordinator loop. Resolvers execute as spawned tokio
//! tasks and report back through a `FuturesUnordered`; the value store and the
//! per-task states are only touched by the coordinator, between completions.

use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use serde_json::Value;
use tokio::task::JoinError;
use tracing::{debug, error, info, info_span, trace, warn, Instrument};
use uuid::Uuid;

use crate::application::result_extractor::ResultExtractor;
use crate::config::{CompletionMode, FlowManagerConfig};
use crate::domain::flow_definition::{FlowDefinition, ParamBinding, TaskSpec};
use crate::domain::resolver::ResolverRegistry;
use crate::domain::run_state::{RunState, TaskRunState};
use crate::domain::value_store::ValueStore;
use crate::error::FlowError;
use crate::types::ValueMap;

/// Executes flow definitions
///
/// Holds only configuration, so one manager can drive any number of
/// concurrent runs.
#[derive(Debug, Clone, Default)]
pub struct FlowManager {
    config: FlowManagerConfig,
}

impl FlowManager {
    /// Create a manager with the given configuration
    pub fn new(config: FlowManagerConfig) -> Self {
        Self { config }
    }

    /// Active configuration
    pub fn config(&self) -> &FlowManagerConfig {
        &self.config
    }

    /// Run `flow` to completion
    ///
    /// `expected` lists the result names the caller wants back. Names declared
    /// in `flow.results` are translated to their value; any other name is read
    /// as a value name directly. An empty list waits for every runnable task
    /// and returns every declared result.
    pub async fn run<I, S>(
        &self,
        flow: &FlowDefinition,
        initial: ValueMap,
        expected: I,
        resolvers: &ResolverRegistry,
    ) -> Result<ValueMap, FlowError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let run_id = Uuid::new_v4();
        let span = info_span!("flow_run", run_id = %run_id);

        let expected: Vec<String> = expected.into_iter().map(Into::into).collect();

        async move {
            if self.config.validate_definition {
                flow.validate(initial.keys().map(String::as_str))
                    .map_err(|e| {
                        error!(error = %e, "Flow definition rejected");
                        FlowError::from(e)
                    })?;
            }

            FlowRun::new(flow, resolvers, &self.config, initial, expected)
                .execute()
                .await
        }
        .instrument(span)
        .await
    }
}

/// Message sent back to the coordinator when a spawned resolver finishes
struct Completion {
    task: String,
    result: Result<anyhow::Result<ValueMap>, JoinError>,
}

type InFlight = FuturesUnordered<BoxFuture<'static, Completion>>;

/// State of a single run, owned by the coordinator
struct FlowRun<'a> {
    flow: &'a FlowDefinition,
    resolvers: &'a ResolverRegistry,
    config: &'a FlowManagerConfig,
    store: ValueStore,
    state: RunState,
    /// Names the caller asked for
    expected: Vec<String>,
    /// Value names backing `expected`
    expected_values: Vec<String>,
}

impl<'a> FlowRun<'a> {
    fn new(
        flow: &'a FlowDefinition,
        resolvers: &'a ResolverRegistry,
        config: &'a FlowManagerConfig,
        initial: ValueMap,
        expected: Vec<String>,
    ) -> Self {
        let expected_values = expected
            .iter()
            .map(|name| flow.value_for_result(name).to_string())
            .collect();

        Self {
            flow,
            resolvers,
            config,
            store: ValueStore::seeded(initial),
            state: RunState::new(flow.tasks.keys()),
            expected,
            expected_values,
        }
    }

    async fn execute(mut self) -> Result<ValueMap, FlowError> {
        info!(
            tasks = self.flow.tasks.len(),
            expected = ?self.expected,
            mode = ?self.config.completion_mode,
            "Starting flow run"
        );

        let mut in_flight: InFlight = FuturesUnordered::new();
        let mut failure: Option<FlowError> = None;

        loop {
            if self.expected_satisfied() {
                break;
            }

            if let Err(e) = self
                .promote_ready()
                .and_then(|_| self.launch_ready(&mut in_flight))
            {
                failure = Some(e);
                break;
            }

            let Some(completion) = in_flight.next().await else {
                break;
            };

            if let Err(e) = self.complete(completion) {
                failure = Some(e);
                break;
            }
        }

        // Dropping the JoinHandles detaches the tasks: they run to completion
        // in the background and their results are discarded
        if !in_flight.is_empty() {
            debug!(
                detached = self.state.count(TaskRunState::Running),
                "Detaching in-flight tasks"
            );
        }
        drop(in_flight);

        if let Some(e) = failure {
            error!(error = %e, "Aborting flow run");
            return Err(e);
        }

        let missing = self.store.missing(&self.expected_values);
        if !missing.is_empty() {
            let blocked = self.state.in_state(TaskRunState::Pending);
            warn!(?missing, ?blocked, "Flow run deadlocked");
            return Err(FlowError::Deadlock { missing, blocked });
        }

        let result = ResultExtractor::extract(&self.flow.results, &self.store, &self.expected);
        debug!(values = ?self.store.snapshot(), "Final value store");
        info!(
            done = ?self.state.done(),
            results = result.len(),
            "Flow run completed"
        );
        Ok(result)
    }

    /// Early return is only taken in dependency-closure mode with a non-empty
    /// expected set
    fn expected_satisfied(&self) -> bool {
        self.config.completion_mode == CompletionMode::DependencyClosure
            && !self.expected_values.is_empty()
            && self.store.contains_all(&self.expected_values)
    }

    fn promote_ready(&mut self) -> Result<(), FlowError> {
        let flow = self.flow;
        for name in self.state.in_state(TaskRunState::Pending) {
            let Some(task) = flow.tasks.get(&name) else {
                continue;
            };
            if self.store.contains_all(&task.requires) {
                self.state.mark_ready(&name)?;
                trace!(task = %name, "Task ready");
            }
        }
        Ok(())
    }

    fn launch_ready(&mut self, in_flight: &mut InFlight) -> Result<(), FlowError> {
        let flow = self.flow;
        for name in self.state.in_state(TaskRunState::Ready) {
            if let Some(limit) = self.config.max_concurrency {
                if in_flight.len() >= limit.get() {
                    trace!(limit = limit.get(), "Concurrency limit reached");
                    break;
                }
            }

            let Some(task) = flow.tasks.get(&name) else {
                continue;
            };

            self.state.mark_running(&name)?;

            let params = self.build_params(&name, task);
            let Some(future) = self.resolvers.invoke(&task.resolver.name, params) else {
                self.state.mark_failed(&name)?;
                return Err(FlowError::UnknownResolver {
                    task: name,
                    resolver: task.resolver.name.clone(),
                });
            };

            debug!(task = %name, resolver = %task.resolver.name, "Launching task");

            let span = info_span!("task", task = %name, resolver = %task.resolver.name);
            let handle = tokio::spawn(future.instrument(span));
            in_flight.push(Box::pin(async move {
                Completion {
                    task: name,
                    result: handle.await,
                }
            }));
        }
        Ok(())
    }

    /// Resolve a task's parameters against the store
    ///
    /// Without explicit bindings every required value is passed under its own
    /// name.
    fn build_params(&self, name: &str, task: &TaskSpec) -> ValueMap {
        let Some(bindings) = &task.resolver.params else {
            return task
                .requires
                .iter()
                .filter_map(|value| self.store.get(value).map(|v| (value.clone(), v.clone())))
                .collect();
        };

        bindings
            .iter()
            .map(|(param, binding)| {
                let value = match binding {
                    ParamBinding::Literal(v) => v.clone(),
                    ParamBinding::Value(value) => match self.store.get(value) {
                        Some(v) => v.clone(),
                        None => {
                            // Only reachable with validation disabled
                            warn!(task = %name, param = %param, value = %value, "Parameter bound to missing value");
                            Value::Null
                        }
                    },
                };
                (param.clone(), value)
            })
            .collect()
    }

    fn complete(&mut self, completion: Completion) -> Result<(), FlowError> {
        let Completion { task: name, result } = completion;

        let outputs = match result {
            Ok(Ok(outputs)) => outputs,
            Ok(Err(source)) => {
                self.state.mark_failed(&name)?;
                return Err(FlowError::Resolver { task: name, source });
            }
            Err(join_error) => {
                self.state.mark_failed(&name)?;
                return Err(FlowError::TaskPanicked {
                    task: name,
                    message: join_error.to_string(),
                });
            }
        };

        let flow = self.flow;
        let Some(task) = flow.tasks.get(&name) else {
            return Ok(());
        };

        // Check the whole contract before writing anything
        let mut writes = Vec::with_capacity(task.provides.len());
        for value in &task.provides {
            let field = task.resolver.output_field(value);
            let Some(output) = outputs.get(field) else {
                self.state.mark_failed(&name)?;
                return Err(FlowError::ContractViolation {
                    task: name,
                    value: value.clone(),
                    reason: format!("resolver output has no field '{}'", field),
                });
            };
            if self.store.contains(value) {
                self.state.mark_failed(&name)?;
                return Err(FlowError::ContractViolation {
                    task: name,
                    value: value.clone(),
                    reason: "value was already written".to_string(),
                });
            }
            writes.push((value, output.clone()));
        }

        for (value, output) in writes {
            if let Err(rejected) = self.store.insert_once(value, output) {
                self.state.mark_failed(&name)?;
                return Err(FlowError::ContractViolation {
                    task: name,
                    value: rejected.name,
                    reason: "value was already written".to_string(),
                });
            }
        }

        self.state.mark_done(&name)?;
        debug!(task = %name, provides = ?task.provides, "Task completed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn echo_registry() -> ResolverRegistry {
        let mut registry = ResolverRegistry::new();
        registry.register_fn("echo", |params: ValueMap| async move { Ok(params) });
        registry
    }

    #[tokio::test]
    async fn test_default_params_pass_required_values() {
        let flow = FlowDefinition::new()
            .task(
                "copy",
                TaskSpec::new("echo").requires(["input"]).provides(["input2"]).result("input2", "input"),
            )
            .result("out", "input2");

        let result = FlowManager::default()
            .run(
                &flow,
                ValueMap::from([("input".to_string(), json!(42))]),
                ["out"],
                &echo_registry(),
            )
            .await
            .unwrap();

        assert_eq!(result, ValueMap::from([("out".to_string(), json!(42))]));
    }

    #[tokio::test]
    async fn test_literal_and_value_bindings() {
        let flow = FlowDefinition::new().task(
            "t",
            TaskSpec::new("echo")
                .requires(["x"])
                .provides(["a", "b"])
                .param("a", ParamBinding::value("x"))
                .param("b", ParamBinding::literal("const")),
        );

        let result = FlowManager::default()
            .run(
                &flow,
                ValueMap::from([("x".to_string(), json!(1))]),
                ["a", "b"],
                &echo_registry(),
            )
            .await
            .unwrap();

        assert_eq!(result["a"], json!(1));
        assert_eq!(result["b"], json!("const"));
    }

    #[tokio::test]
    async fn test_expected_initial_value_returns_without_running() {
        let flow = FlowDefinition::new().task("never", TaskSpec::new("missing").provides(["y"]));

        let result = FlowManager::default()
            .run(
                &flow,
                ValueMap::from([("x".to_string(), json!("ready"))]),
                ["x"],
                &ResolverRegistry::new(),
            )
            .await
            .unwrap();

        assert_eq!(result["x"], json!("ready"));
    }

    #[tokio::test]
    async fn test_unknown_resolver_is_reported() {
        let flow = FlowDefinition::new().task("t", TaskSpec::new("nope").provides(["v"]));

        let err = FlowManager::default()
            .run(&flow, ValueMap::new(), ["v"], &ResolverRegistry::new())
            .await
            .unwrap_err();

        match err {
            FlowError::UnknownResolver { task, resolver } => {
                assert_eq!(task, "t");
                assert_eq!(resolver, "nope");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

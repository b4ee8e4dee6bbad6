use crate::error::DefinitionError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Static description of a data-flow graph
///
/// Tasks are keyed by name; `results` maps externally visible result names to
/// internal value names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowDefinition {
    /// The tasks in this flow
    pub tasks: BTreeMap<String, TaskSpec>,

    /// External result name -> internal value name
    #[serde(default)]
    pub results: BTreeMap<String, String>,
}

/// One unit of work and its value contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    /// Values that must exist before the task may start
    #[serde(default)]
    pub requires: BTreeSet<String>,

    /// Values the task must write on success
    #[serde(default)]
    pub provides: BTreeSet<String>,

    /// Resolver bound to the task
    pub resolver: ResolverRef,
}

/// Reference to a registered resolver plus its wiring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolverRef {
    /// Registry name of the resolver
    pub name: String,

    /// Resolver parameter -> binding. `None` passes every required value under its own name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<BTreeMap<String, ParamBinding>>,

    /// Provided value -> resolver output field. `None` means the names are identical.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<BTreeMap<String, String>>,
}

/// Source of a single resolver parameter
///
/// In JSON a string of exactly the form `"${name}"` reads value `name`, where
/// `name` is non-empty and has no `}`; any other JSON value is passed through
/// as a constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum ParamBinding {
    /// Read a value from the run's value store
    Value(String),
    /// A constant
    Literal(Value),
}

impl ParamBinding {
    /// Bind to a value name
    pub fn value(name: impl Into<String>) -> Self {
        ParamBinding::Value(name.into())
    }

    /// Bind to a constant
    pub fn literal(value: impl Into<Value>) -> Self {
        ParamBinding::Literal(value.into())
    }

    /// Value name this binding reads, if any
    pub fn value_name(&self) -> Option<&str> {
        match self {
            ParamBinding::Value(name) => Some(name),
            ParamBinding::Literal(_) => None,
        }
    }
}

impl From<Value> for ParamBinding {
    fn from(value: Value) -> Self {
        if let Some(name) = value
            .as_str()
            .and_then(|s| s.strip_prefix("${"))
            .and_then(|s| s.strip_suffix('}'))
            .filter(|name| !name.is_empty() && !name.contains('}'))
        {
            return ParamBinding::Value(name.to_string());
        }
        ParamBinding::Literal(value)
    }
}

impl From<ParamBinding> for Value {
    fn from(binding: ParamBinding) -> Self {
        match binding {
            ParamBinding::Value(name) => Value::String(format!("${{{}}}", name)),
            ParamBinding::Literal(value) => value,
        }
    }
}

impl ResolverRef {
    /// Reference a resolver with default wiring
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: None,
            results: None,
        }
    }

    /// Output field that carries `value`
    pub fn output_field<'a>(&'a self, value: &'a str) -> &'a str {
        self.results
            .as_ref()
            .and_then(|mapping| mapping.get(value))
            .map(String::as_str)
            .unwrap_or(value)
    }
}

impl TaskSpec {
    /// Create a task bound to `resolver` with no requirements or outputs
    pub fn new(resolver: impl Into<String>) -> Self {
        Self {
            requires: BTreeSet::new(),
            provides: BTreeSet::new(),
            resolver: ResolverRef::new(resolver),
        }
    }

    /// Add required values
    pub fn requires<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requires.extend(names.into_iter().map(Into::into));
        self
    }

    /// Add provided values
    pub fn provides<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.provides.extend(names.into_iter().map(Into::into));
        self
    }

    /// Bind a resolver parameter
    pub fn param(mut self, name: impl Into<String>, binding: ParamBinding) -> Self {
        self.resolver
            .params
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), binding);
        self
    }

    /// Map a provided value to a differently named resolver output
    pub fn result(mut self, value: impl Into<String>, output_field: impl Into<String>) -> Self {
        self.resolver
            .results
            .get_or_insert_with(BTreeMap::new)
            .insert(value.into(), output_field.into());
        self
    }
}

impl FlowDefinition {
    /// Create an empty flow
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a task
    pub fn task(mut self, name: impl Into<String>, task: TaskSpec) -> Self {
        self.tasks.insert(name.into(), task);
        self
    }

    /// Expose an internal value under an external result name
    pub fn result(mut self, external: impl Into<String>, value: impl Into<String>) -> Self {
        self.results.insert(external.into(), value.into());
        self
    }

    /// Parse a flow from its JSON form
    pub fn from_json(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Internal value name for an expected result
    ///
    /// Names declared in `results` are translated; anything else is taken as
    /// a value name as-is.
    pub fn value_for_result<'a>(&'a self, name: &'a str) -> &'a str {
        self.results.get(name).map(String::as_str).unwrap_or(name)
    }

    /// Validate the flow against the names of the initial inputs
    pub fn validate<'a, I>(&self, initial_names: I) -> Result<(), DefinitionError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let initial: HashSet<&str> = initial_names.into_iter().collect();

        // Each value has at most one producer, and never shadows an input
        let mut producers: HashMap<&str, &str> = HashMap::new();
        for (task_name, task) in &self.tasks {
            for value in &task.provides {
                if initial.contains(value.as_str()) {
                    return Err(DefinitionError::InputCollision {
                        task: task_name.clone(),
                        value: value.clone(),
                    });
                }
                if let Some(first) = producers.insert(value.as_str(), task_name.as_str()) {
                    return Err(DefinitionError::DuplicateProducer {
                        value: value.clone(),
                        first: first.to_string(),
                        second: task_name.clone(),
                    });
                }
            }
        }

        for (task_name, task) in &self.tasks {
            for value in &task.requires {
                if !initial.contains(value.as_str()) && !producers.contains_key(value.as_str()) {
                    return Err(DefinitionError::MissingProducer {
                        task: task_name.clone(),
                        value: value.clone(),
                    });
                }
            }

            if let Some(params) = &task.resolver.params {
                for (param, binding) in params {
                    if let Some(value) = binding.value_name() {
                        if !task.requires.contains(value) {
                            return Err(DefinitionError::UnrequiredParam {
                                task: task_name.clone(),
                                param: param.clone(),
                                value: value.to_string(),
                            });
                        }
                    }
                }
            }
        }

        for (result, value) in &self.results {
            if !initial.contains(value.as_str()) && !producers.contains_key(value.as_str()) {
                return Err(DefinitionError::UnknownResultValue {
                    result: result.clone(),
                    value: value.clone(),
                });
            }
        }

        self.check_for_cycles(&producers)
    }

    /// Task name -> tasks producing its required values
    fn dependency_map<'a>(
        &'a self,
        producers: &HashMap<&'a str, &'a str>,
    ) -> BTreeMap<&'a str, Vec<&'a str>> {
        self.tasks
            .iter()
            .map(|(task_name, task)| {
                let deps = task
                    .requires
                    .iter()
                    .filter_map(|value| producers.get(value.as_str()).copied())
                    .collect();
                (task_name.as_str(), deps)
            })
            .collect()
    }

    /// Check for cycles in the task dependencies
    fn check_for_cycles(&self, producers: &HashMap<&str, &str>) -> Result<(), DefinitionError> {
        let dep_map = self.dependency_map(producers);
        let mut visited = HashSet::new();
        let mut path = Vec::new();

        for task in dep_map.keys() {
            if let Some(cycle) = Self::find_cycle(task, &dep_map, &mut visited, &mut path) {
                return Err(DefinitionError::Cycle { tasks: cycle });
            }
        }

        Ok(())
    }

    /// Depth-first search returning the first cycle reachable from `task`,
    /// closed by repeating its first task
    fn find_cycle<'a>(
        task: &'a str,
        dep_map: &BTreeMap<&'a str, Vec<&'a str>>,
        visited: &mut HashSet<&'a str>,
        path: &mut Vec<&'a str>,
    ) -> Option<Vec<String>> {
        if let Some(pos) = path.iter().position(|t| *t == task) {
            let mut cycle: Vec<String> = path[pos..].iter().map(|t| t.to_string()).collect();
            cycle.push(task.to_string());
            return Some(cycle);
        }
        if !visited.insert(task) {
            return None;
        }

        path.push(task);
        if let Some(deps) = dep_map.get(task) {
            for dep in deps {
                if let Some(cycle) = Self::find_cycle(dep, dep_map, visited, path) {
                    return Some(cycle);
                }
            }
        }
        path.pop();

        None
    }
}

use thiserror::Error;

use crate::domain::run_state::TaskRunState;

/// Errors detected while checking a flow definition, before any task runs
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DefinitionError {
    /// Two tasks declare the same provided value
    #[error("Value '{value}' is provided by both '{first}' and '{second}'")]
    DuplicateProducer {
        /// Value name provided twice
        value: String,
        /// First task providing the value
        first: String,
        /// Second task providing the value
        second: String,
    },

    /// A task provides a value that is already an initial input
    #[error("Task '{task}' provides '{value}', which is already an initial input")]
    InputCollision {
        /// Offending task
        task: String,
        /// Value name supplied both ways
        value: String,
    },

    /// A required value has no producer and is not an initial input
    #[error("Task '{task}' requires '{value}', which is neither an initial input nor provided by any task")]
    MissingProducer {
        /// Task with the unsatisfiable requirement
        task: String,
        /// Value nobody provides
        value: String,
    },

    /// A parameter reads a value the task does not require
    #[error("Task '{task}' binds parameter '{param}' to '{value}', which is not in its requires")]
    UnrequiredParam {
        /// Offending task
        task: String,
        /// Resolver parameter name
        param: String,
        /// Value name the parameter reads
        value: String,
    },

    /// A flow result points at a value nothing produces
    #[error("Result '{result}' maps to '{value}', which is neither an initial input nor provided by any task")]
    UnknownResultValue {
        /// External result name
        result: String,
        /// Internal value name
        value: String,
    },

    /// The task dependency graph is not acyclic
    #[error("Cycle detected in task dependencies: {}", .tasks.join(" -> "))]
    Cycle {
        /// Tasks forming the cycle, in dependency order
        tasks: Vec<String>,
    },
}

/// Error type for a single flow run
#[derive(Error, Debug)]
pub enum FlowError {
    /// The definition failed validation; nothing was executed
    #[error("Invalid flow definition: {0}")]
    Definition(#[from] DefinitionError),

    /// A task references a resolver that is not registered
    #[error("Task '{task}' references unknown resolver '{resolver}'")]
    UnknownResolver {
        /// Task that could not be launched
        task: String,
        /// Missing resolver name
        resolver: String,
    },

    /// A task did not honor its declared output contract
    #[error("Task '{task}' violated its contract for value '{value}': {reason}")]
    ContractViolation {
        /// Offending task
        task: String,
        /// Value name concerned
        value: String,
        /// What went wrong
        reason: String,
    },

    /// No task can make progress and expected values are still missing
    #[error("Flow deadlocked: missing values [{}], blocked tasks [{}]", .missing.join(", "), .blocked.join(", "))]
    Deadlock {
        /// Expected value names that were never produced
        missing: Vec<String>,
        /// Tasks that never became ready
        blocked: Vec<String>,
    },

    /// A resolver failed; the run was aborted
    #[error("Task '{task}' failed: {source}")]
    Resolver {
        /// Failing task
        task: String,
        /// The resolver's own error
        #[source]
        source: anyhow::Error,
    },

    /// The coordinator attempted an illegal task state change
    #[error("Task '{task}' cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        /// Task concerned
        task: String,
        /// State the task was in
        from: TaskRunState,
        /// Requested state
        to: TaskRunState,
    },

    /// The spawned resolver task panicked or was cancelled
    #[error("Task '{task}' did not complete: {message}")]
    TaskPanicked {
        /// Failing task
        task: String,
        /// Join error description
        message: String,
    },
}

impl FlowError {
    /// Name of the task the error is attributed to, if any
    pub fn task(&self) -> Option<&str> {
        match self {
            FlowError::UnknownResolver { task, .. }
            | FlowError::ContractViolation { task, .. }
            | FlowError::Resolver { task, .. }
            | FlowError::InvalidTransition { task, .. }
            | FlowError::TaskPanicked { task, .. } => Some(task),
            FlowError::Definition(_) | FlowError::Deadlock { .. } => None,
        }
    }

    /// Short machine-readable code, stable across message changes
    pub fn error_code(&self) -> &'static str {
        match self {
            FlowError::Definition(_) => "ERR_FLOW_DEFINITION",
            FlowError::UnknownResolver { .. } => "ERR_FLOW_UNKNOWN_RESOLVER",
            FlowError::ContractViolation { .. } => "ERR_FLOW_CONTRACT_VIOLATION",
            FlowError::Deadlock { .. } => "ERR_FLOW_DEADLOCK",
            FlowError::Resolver { .. } => "ERR_FLOW_RESOLVER",
            FlowError::InvalidTransition { .. } => "ERR_FLOW_INVALID_TRANSITION",
            FlowError::TaskPanicked { .. } => "ERR_FLOW_TASK_PANICKED",
        }
    }
}

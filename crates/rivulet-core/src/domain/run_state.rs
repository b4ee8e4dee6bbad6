use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::FlowError;

/// Lifecycle of one task within one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskRunState {
    /// Waiting for required values
    Pending,

    /// All required values exist; not launched yet
    Ready,

    /// Resolver invoked, completion not yet observed
    Running,

    /// Outputs merged into the value store
    Done,

    /// Resolver failed or broke its contract
    Failed,
}

/// Per-task states for a single run
///
/// Transitions are checked: a task is only ever launched from `Ready`, so
/// concurrent completions can never cause a second launch.
#[derive(Debug, Clone)]
pub struct RunState {
    tasks: BTreeMap<String, TaskRunState>,
}

impl RunState {
    /// Start every named task as `Pending`
    pub fn new<I, S>(task_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tasks: task_names
                .into_iter()
                .map(|name| (name.into(), TaskRunState::Pending))
                .collect(),
        }
    }

    /// Current state of a task
    pub fn state(&self, task: &str) -> Option<TaskRunState> {
        self.tasks.get(task).copied()
    }

    /// `Pending -> Ready`
    pub fn mark_ready(&mut self, task: &str) -> Result<(), FlowError> {
        self.transition(task, TaskRunState::Pending, TaskRunState::Ready)
    }

    /// `Ready -> Running`
    pub fn mark_running(&mut self, task: &str) -> Result<(), FlowError> {
        self.transition(task, TaskRunState::Ready, TaskRunState::Running)
    }

    /// `Running -> Done`
    pub fn mark_done(&mut self, task: &str) -> Result<(), FlowError> {
        self.transition(task, TaskRunState::Running, TaskRunState::Done)
    }

    /// `Running -> Failed`
    pub fn mark_failed(&mut self, task: &str) -> Result<(), FlowError> {
        self.transition(task, TaskRunState::Running, TaskRunState::Failed)
    }

    fn transition(
        &mut self,
        task: &str,
        from: TaskRunState,
        to: TaskRunState,
    ) -> Result<(), FlowError> {
        match self.tasks.get_mut(task) {
            Some(state) if *state == from => {
                *state = to;
                Ok(())
            }
            Some(state) => Err(FlowError::InvalidTransition {
                task: task.to_string(),
                from: *state,
                to,
            }),
            None => Err(FlowError::InvalidTransition {
                task: task.to_string(),
                from,
                to,
            }),
        }
    }

    /// Task names currently in `state`, in name order
    pub fn in_state(&self, state: TaskRunState) -> Vec<String> {
        self.tasks
            .iter()
            .filter(|(_, s)| **s == state)
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Number of tasks currently in `state`
    pub fn count(&self, state: TaskRunState) -> usize {
        self.tasks.values().filter(|s| **s == state).count()
    }

    /// Names of tasks that finished successfully
    pub fn done(&self) -> BTreeSet<String> {
        self.in_state(TaskRunState::Done).into_iter().collect()
    }
}

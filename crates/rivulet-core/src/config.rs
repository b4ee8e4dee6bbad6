//! Configuration for flow runs
//!
//! Defaults can be overridden from the environment with [`FlowManagerConfig::load`].

use serde::{Deserialize, Serialize};
use std::env;
use std::num::NonZeroUsize;
use std::str::FromStr;
use tracing::{debug, warn};

/// When a run is considered finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionMode {
    /// Return as soon as every expected result exists; unrelated tasks still
    /// in flight are detached and their results discarded
    #[default]
    DependencyClosure,

    /// Wait until no task is ready or running
    FullCompletion,
}

impl FromStr for CompletionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "dependency_closure" | "closure" => Ok(CompletionMode::DependencyClosure),
            "full_completion" | "full" => Ok(CompletionMode::FullCompletion),
            other => Err(format!("Unknown completion mode: {}", other)),
        }
    }
}

/// Flow manager configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowManagerConfig {
    /// Termination policy
    #[serde(default)]
    pub completion_mode: CompletionMode,

    /// Upper bound on concurrently running resolvers; `None` is unbounded
    #[serde(default)]
    pub max_concurrency: Option<NonZeroUsize>,

    /// Validate the definition before every run
    #[serde(default = "default_validate_definition")]
    pub validate_definition: bool,
}

fn default_validate_definition() -> bool {
    true
}

impl Default for FlowManagerConfig {
    fn default() -> Self {
        Self {
            completion_mode: CompletionMode::default(),
            max_concurrency: None,
            validate_definition: default_validate_definition(),
        }
    }
}

impl FlowManagerConfig {
    /// Load configuration from environment variables, falling back to defaults
    ///
    /// Reads `RIVULET_COMPLETION_MODE`, `RIVULET_MAX_CONCURRENCY` and
    /// `RIVULET_VALIDATE_DEFINITION`. Invalid values are logged and ignored.
    pub fn load() -> Self {
        Self::load_from(|key| env::var(key).ok())
    }

    /// Same as [`FlowManagerConfig::load`] with a custom variable lookup
    pub fn load_from<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(mode) = lookup("RIVULET_COMPLETION_MODE") {
            match mode.parse::<CompletionMode>() {
                Ok(mode) => config.completion_mode = mode,
                Err(e) => warn!("Invalid RIVULET_COMPLETION_MODE value: {}", e),
            }
        }

        if let Some(limit) = lookup("RIVULET_MAX_CONCURRENCY") {
            match limit.parse::<usize>() {
                Ok(limit) => config.max_concurrency = NonZeroUsize::new(limit),
                Err(_) => warn!("Invalid RIVULET_MAX_CONCURRENCY value: {}", limit),
            }
        }

        if let Some(validate) = lookup("RIVULET_VALIDATE_DEFINITION") {
            match validate.to_lowercase().as_str() {
                "true" | "1" => config.validate_definition = true,
                "false" | "0" => config.validate_definition = false,
                _ => warn!("Invalid RIVULET_VALIDATE_DEFINITION value: {}", validate),
            }
        }

        debug!(?config, "Loaded flow manager configuration");
        config
    }

    /// Builder-style completion mode override
    pub fn with_completion_mode(mut self, mode: CompletionMode) -> Self {
        self.completion_mode = mode;
        self
    }

    /// Builder-style concurrency limit; `0` is raised to `1`
    pub fn with_max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = Some(NonZeroUsize::new(limit).unwrap_or(NonZeroUsize::MIN));
        self
    }

    /// Builder-style validation toggle
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate_definition = validate;
        self
    }
}

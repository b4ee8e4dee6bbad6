/// Flow definition model and static validation
pub mod flow_definition;

/// Write-once value space for a single run
pub mod value_store;

/// Per-task execution state for a single run
pub mod run_state;

/// Resolver trait and registry
pub mod resolver;

/// Run coordinator
pub mod flow_manager;

/// Projection of a finished run into caller-visible results
pub mod result_extractor;

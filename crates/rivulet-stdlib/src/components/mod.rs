/// General-purpose resolvers
pub mod builtin;

/// Resolvers for the todo processing pipeline
pub mod todo;

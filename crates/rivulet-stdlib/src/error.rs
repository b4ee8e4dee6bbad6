use thiserror::Error;

/// Errors raised by the todo pipeline's infrastructure
///
/// Invalid user input is not an error here; it travels through the flow as an
/// [`rivulet_core::Outcome::Err`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TodoError {
    /// The built-in input schema failed to compile
    #[error("Invalid input schema: {0}")]
    InvalidSchema(String),

    /// A stage received a value it could not decode
    #[error("Malformed value '{name}': {reason}")]
    MalformedValue {
        /// Value name
        name: String,
        /// Decoding failure
        reason: String,
    },

    /// The todo repository rejected an operation
    #[error("Storage error: {0}")]
    Storage(String),
}

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Named values exchanged with resolvers and returned from a run
///
/// Ordered so that results and logs are deterministic.
pub type ValueMap = BTreeMap<String, Value>;

/// A business failure carried as ordinary data
///
/// Resolvers report invalid domain input with this instead of failing the run,
/// so downstream tasks can branch on it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DomainError {
    /// Human-readable reason
    pub message: String,
}

impl DomainError {
    /// Create a domain error from a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Tagged result a task publishes for downstream tasks to branch on
///
/// Serialized as `{"ok": ...}` or `{"err": {"message": ...}}`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Outcome<T, E = DomainError> {
    /// The stage succeeded
    Ok(T),
    /// The stage hit a domain failure
    Err(E),
}

impl<T, E> Outcome<T, E> {
    /// Check whether this is the success variant
    #[inline]
    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok(_))
    }

    /// Convert into a std `Result`
    #[inline]
    pub fn into_result(self) -> Result<T, E> {
        match self {
            Outcome::Ok(value) => Ok(value),
            Outcome::Err(err) => Err(err),
        }
    }

    /// Map the success value, keeping a failure untouched
    pub fn and_then<U>(self, f: impl FnOnce(T) -> Outcome<U, E>) -> Outcome<U, E> {
        match self {
            Outcome::Ok(value) => f(value),
            Outcome::Err(err) => Outcome::Err(err),
        }
    }
}

impl<T, E> From<Result<T, E>> for Outcome<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Outcome::Ok(value),
            Err(err) => Outcome::Err(err),
        }
    }
}

impl<T, E> Outcome<T, E>
where
    T: Serialize + DeserializeOwned,
    E: Serialize + DeserializeOwned,
{
    /// Decode an outcome from a JSON value
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Encode the outcome as a JSON value
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

use async_trait::async_trait;
use rivulet_core::{Resolver, ResolverRegistry, ValueMap};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Registry name of [`Noop`]
pub const NOOP: &str = "builtin::Noop";
/// Registry name of [`Echo`]
pub const ECHO: &str = "builtin::Echo";
/// Registry name of [`Wait`]
pub const WAIT: &str = "builtin::Wait";
/// Registry name of [`ThrowError`]
pub const THROW_ERROR: &str = "builtin::ThrowError";

/// Does nothing and produces no outputs
#[derive(Debug, Default)]
pub struct Noop;

#[async_trait]
impl Resolver for Noop {
    async fn execute(&self, _params: ValueMap) -> anyhow::Result<ValueMap> {
        Ok(ValueMap::new())
    }
}

/// Returns its parameters as outputs
///
/// Combined with literal parameters and a results mapping this publishes
/// constants into a flow.
#[derive(Debug, Default)]
pub struct Echo;

#[async_trait]
impl Resolver for Echo {
    async fn execute(&self, params: ValueMap) -> anyhow::Result<ValueMap> {
        Ok(params)
    }
}

/// Sleeps for `ms` milliseconds, then outputs `result` if it was given
#[derive(Debug, Default)]
pub struct Wait;

#[async_trait]
impl Resolver for Wait {
    async fn execute(&self, mut params: ValueMap) -> anyhow::Result<ValueMap> {
        let ms = match params.get("ms") {
            None => 0,
            Some(v) => v
                .as_u64()
                .ok_or_else(|| anyhow::anyhow!("Parameter 'ms' must be a non-negative integer, got {}", v))?,
        };

        debug!(ms, "Waiting");
        tokio::time::sleep(Duration::from_millis(ms)).await;

        let mut outputs = ValueMap::new();
        if let Some(result) = params.remove("result") {
            outputs.insert("result".to_string(), result);
        }
        Ok(outputs)
    }
}

/// Always fails, with the `message` parameter as the error
#[derive(Debug, Default)]
pub struct ThrowError;

#[async_trait]
impl Resolver for ThrowError {
    async fn execute(&self, params: ValueMap) -> anyhow::Result<ValueMap> {
        let message = match params.get("message") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => "ThrowError resolver invoked".to_string(),
        };
        Err(anyhow::anyhow!(message))
    }
}

/// Register every built-in resolver under its `builtin::` name
pub fn register_builtins(registry: &mut ResolverRegistry) {
    registry
        .register(NOOP, Noop)
        .register(ECHO, Echo)
        .register(WAIT, Wait)
        .register(THROW_ERROR, ThrowError);
}

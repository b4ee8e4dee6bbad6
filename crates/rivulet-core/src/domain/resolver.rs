use async_trait::async_trait;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::types::ValueMap;

/// Executable behavior bound to a task
///
/// Receives the task's resolved parameters and produces named outputs. An
/// `Err` aborts the whole run; domain failures should be returned as data
/// (see [`crate::Outcome`]).
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Run the resolver
    async fn execute(&self, params: ValueMap) -> anyhow::Result<ValueMap>;
}

/// Adapter turning a plain async function into a [`Resolver`]
pub struct FnResolver<F> {
    func: F,
}

impl<F> FnResolver<F> {
    /// Wrap a function
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

#[async_trait]
impl<F, Fut> Resolver for FnResolver<F>
where
    F: Fn(ValueMap) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<ValueMap>> + Send + 'static,
{
    async fn execute(&self, params: ValueMap) -> anyhow::Result<ValueMap> {
        (self.func)(params).await
    }
}

/// Name to resolver lookup, shared read-only by every run
#[derive(Clone, Default)]
pub struct ResolverRegistry {
    resolvers: HashMap<String, Arc<dyn Resolver>>,
}

impl ResolverRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resolver object, replacing any previous one with the same name
    pub fn register<R>(&mut self, name: impl Into<String>, resolver: R) -> &mut Self
    where
        R: Resolver + 'static,
    {
        self.register_arc(name, Arc::new(resolver))
    }

    /// Register an already shared resolver
    pub fn register_arc(&mut self, name: impl Into<String>, resolver: Arc<dyn Resolver>) -> &mut Self {
        self.resolvers.insert(name.into(), resolver);
        self
    }

    /// Register a plain async function
    pub fn register_fn<F, Fut>(&mut self, name: impl Into<String>, func: F) -> &mut Self
    where
        F: Fn(ValueMap) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<ValueMap>> + Send + 'static,
    {
        self.register(name, FnResolver::new(func))
    }

    /// Builder-style variant of [`ResolverRegistry::register`]
    pub fn with<R>(mut self, name: impl Into<String>, resolver: R) -> Self
    where
        R: Resolver + 'static,
    {
        self.register(name, resolver);
        self
    }

    /// Look up a resolver
    pub fn get(&self, name: &str) -> Option<Arc<dyn Resolver>> {
        self.resolvers.get(name).cloned()
    }

    /// Check whether a resolver is registered
    pub fn contains(&self, name: &str) -> bool {
        self.resolvers.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.resolvers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Copy every resolver from `other`, overriding entries with the same name
    pub fn extend(&mut self, other: &ResolverRegistry) {
        for (name, resolver) in &other.resolvers {
            self.resolvers.insert(name.clone(), resolver.clone());
        }
    }

    /// Number of registered resolvers
    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    /// Check whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }

    /// Run a resolver by name; `None` if it is not registered
    pub(crate) fn invoke(
        &self,
        name: &str,
        params: ValueMap,
    ) -> Option<BoxFuture<'static, anyhow::Result<ValueMap>>> {
        let resolver = self.get(name)?;
        Some(Box::pin(async move { resolver.execute(params).await }))
    }
}

impl fmt::Debug for ResolverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverRegistry")
            .field("resolvers", &self.names())
            .finish()
    }
}

use crate::types::ValueMap;
use serde_json::Value;
use std::collections::HashMap;

/// Write-once value space for a single flow run
///
/// Owned exclusively by the run coordinator; every mutation goes through
/// [`ValueStore::insert_once`], which never overwrites an existing entry.
#[derive(Debug, Default, Clone)]
pub struct ValueStore {
    values: HashMap<String, Value>,
}

/// Returned when a name is written a second time
#[derive(Debug, Clone, PartialEq)]
pub struct AlreadyWritten {
    /// The name that already had a value
    pub name: String,
    /// The value that was rejected
    pub rejected: Value,
}

impl ValueStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with the caller's initial values
    pub fn seeded(initial: ValueMap) -> Self {
        Self {
            values: initial.into_iter().collect(),
        }
    }

    /// Set `name` if absent; a second write is rejected and the first value kept
    pub fn insert_once(&mut self, name: &str, value: Value) -> Result<(), AlreadyWritten> {
        if self.values.contains_key(name) {
            return Err(AlreadyWritten {
                name: name.to_string(),
                rejected: value,
            });
        }
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    /// Get a value by name
    #[inline]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Check whether a name has been written
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Check whether every name has been written
    pub fn contains_all<'a, I>(&self, names: I) -> bool
    where
        I: IntoIterator<Item = &'a String>,
    {
        names.into_iter().all(|name| self.contains(name))
    }

    /// Names from `names` that have not been written yet, in input order
    pub fn missing<'a, I>(&self, names: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        names
            .into_iter()
            .filter(|name| !self.contains(name))
            .cloned()
            .collect()
    }

    /// Number of written values
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check whether nothing has been written
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Copy of the current contents
    pub fn snapshot(&self) -> ValueMap {
        self.values
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

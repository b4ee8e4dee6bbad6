use crate::domain::value_store::ValueStore;
use crate::types::ValueMap;
use std::collections::BTreeMap;

/// Projects a finished run's value store into the caller-visible result
pub struct ResultExtractor;

impl ResultExtractor {
    /// Build the result mapping
    ///
    /// With an empty `only`, every `results` entry whose value exists is
    /// included under its external name. Otherwise just the names in `only`
    /// are returned: names declared in `results` are translated, anything else
    /// is a raw value name returned under itself. Values that were never
    /// produced are left out. Pure, so repeated calls over the same store agree.
    pub fn extract(
        results: &BTreeMap<String, String>,
        store: &ValueStore,
        only: &[String],
    ) -> ValueMap {
        if only.is_empty() {
            return results
                .iter()
                .filter_map(|(external, value)| {
                    store.get(value).map(|v| (external.clone(), v.clone()))
                })
                .collect();
        }

        only.iter()
            .filter_map(|name| {
                let value = results.get(name).unwrap_or(name);
                store.get(value).map(|v| (name.clone(), v.clone()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn store() -> ValueStore {
        let mut store = ValueStore::new();
        store.insert_once("finalResult", json!("All tasks completed")).unwrap();
        store.insert_once("resultA", json!("TaskA completed")).unwrap();
        store
    }

    fn results() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("parallelResult".to_string(), "finalResult".to_string()),
            ("neverProduced".to_string(), "ghost".to_string()),
        ])
    }

    #[test]
    fn test_projects_declared_results() {
        let result = ResultExtractor::extract(&results(), &store(), &["parallelResult".to_string()]);

        assert_eq!(
            result,
            ValueMap::from([("parallelResult".to_string(), json!("All tasks completed"))])
        );
    }

    #[test]
    fn test_raw_value_names_pass_through() {
        let result = ResultExtractor::extract(&results(), &store(), &["resultA".to_string()]);

        assert_eq!(
            result,
            ValueMap::from([("resultA".to_string(), json!("TaskA completed"))])
        );
    }

    #[test]
    fn test_empty_selection_projects_every_produced_result() {
        let result = ResultExtractor::extract(&results(), &store(), &[]);

        assert_eq!(result["parallelResult"], json!("All tasks completed"));
        assert!(!result.contains_key("neverProduced"));
    }

    #[test]
    fn test_projection_is_idempotent() {
        let results = results();
        let store = store();
        let expected = vec!["parallelResult".to_string(), "resultA".to_string()];

        let first = ResultExtractor::extract(&results, &store, &expected);
        let second = ResultExtractor::extract(&results, &store, &expected);
        assert_eq!(first, second);
    }
}

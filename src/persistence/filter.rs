//! Field filtering for persisted state
//!
//! A store persists either every field, only an include set, or everything
//! except an exclude set. The same filter decides which fields are trusted
//! from storage on load and which changes trigger an automatic save.

use std::collections::BTreeSet;

use crate::state::State;

/// Which fields of the state are persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum KeyFilter {
    /// Persist every field
    #[default]
    All,
    /// Persist only these fields
    Include(BTreeSet<String>),
    /// Persist everything except these fields
    Exclude(BTreeSet<String>),
}

impl KeyFilter {
    pub fn include<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        KeyFilter::Include(keys.into_iter().map(Into::into).collect())
    }

    pub fn exclude<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        KeyFilter::Exclude(keys.into_iter().map(Into::into).collect())
    }

    /// Combine optional include/exclude lists. Include wins when both are set.
    pub fn from_lists(include: Option<Vec<String>>, exclude: Option<Vec<String>>) -> Self {
        match (include, exclude) {
            (Some(include), Some(_)) => {
                log::warn!("Both include and exclude keys configured; exclude keys ignored");
                KeyFilter::include(include)
            }
            (Some(include), None) => KeyFilter::include(include),
            (None, Some(exclude)) => KeyFilter::exclude(exclude),
            (None, None) => KeyFilter::All,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, KeyFilter::All)
    }

    /// Whether `key` is persisted under this filter
    pub fn admits(&self, key: &str) -> bool {
        match self {
            KeyFilter::All => true,
            KeyFilter::Include(keys) => keys.contains(key),
            KeyFilter::Exclude(keys) => !keys.contains(key),
        }
    }

    /// Whether any of `keys` is persisted under this filter
    pub fn admits_any<'a>(&self, keys: impl IntoIterator<Item = &'a str>) -> bool {
        keys.into_iter().any(|key| self.admits(key))
    }

    /// The persisted part of `state`
    pub fn project(&self, state: &State) -> State {
        state
            .iter()
            .filter(|(key, _)| self.admits(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Merge a retrieved record with the live state.
    ///
    /// - Include: live state with the retrieved included fields laid over it.
    ///   Fields outside the include set always keep their live values.
    /// - Exclude: retrieved record, with every excluded field taken from the
    ///   live state (or dropped if the live state does not have it).
    /// - All: the retrieved record as is.
    pub fn reconcile(&self, retrieved: State, live: &State) -> State {
        match self {
            KeyFilter::All => retrieved,
            KeyFilter::Include(_) => {
                let mut merged = live.clone();
                merged.extend(retrieved.into_iter().filter(|(key, _)| self.admits(key)));
                merged
            }
            KeyFilter::Exclude(keys) => {
                let mut merged = retrieved;
                for key in keys {
                    match live.get(key) {
                        Some(value) => {
                            merged.insert(key.clone(), value.clone());
                        }
                        None => {
                            merged.remove(key);
                        }
                    }
                }
                merged
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn state(value: Value) -> State {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_project_include() {
        let filter = KeyFilter::include(["name"]);
        let projected = filter.project(&state(json!({ "name": "Ada", "token": "secret" })));
        assert_eq!(projected, state(json!({ "name": "Ada" })));
    }

    #[test]
    fn test_project_exclude() {
        let filter = KeyFilter::exclude(["token"]);
        let projected = filter.project(&state(json!({ "name": "Ada", "token": "secret" })));
        assert_eq!(projected, state(json!({ "name": "Ada" })));
    }

    #[test]
    fn test_project_can_be_empty() {
        let filter = KeyFilter::include(["missing"]);
        assert!(filter.project(&state(json!({ "name": "Ada" }))).is_empty());
    }

    #[test]
    fn test_include_takes_precedence() {
        let filter = KeyFilter::from_lists(Some(vec!["a".into()]), Some(vec!["a".into()]));
        assert_eq!(filter, KeyFilter::include(["a"]));
        assert_eq!(KeyFilter::from_lists(None, None), KeyFilter::All);
    }

    #[test]
    fn test_reconcile_include_keeps_live_fields() {
        let filter = KeyFilter::include(["score"]);
        let live = state(json!({ "score": 1, "session": "abc" }));
        let merged = filter.reconcile(state(json!({ "score": 42 })), &live);
        assert_eq!(merged, state(json!({ "score": 42, "session": "abc" })));
    }

    #[test]
    fn test_reconcile_include_ignores_stale_extra_fields() {
        let filter = KeyFilter::include(["score"]);
        let live = state(json!({ "score": 1, "session": "live" }));
        // Written before the include set was configured
        let retrieved = state(json!({ "score": 9, "session": "stale", "legacy": true }));

        let merged = filter.reconcile(retrieved, &live);
        assert_eq!(merged, state(json!({ "score": 9, "session": "live" })));
    }

    #[test]
    fn test_reconcile_exclude_uses_live_values() {
        let filter = KeyFilter::exclude(["token", "cursor"]);
        let live = state(json!({ "name": "Ada", "token": "live-token" }));
        // A stale record that somehow contains excluded fields
        let retrieved = state(json!({ "name": "Ada", "token": "stale", "cursor": 9 }));

        let merged = filter.reconcile(retrieved, &live);
        assert_eq!(merged, state(json!({ "name": "Ada", "token": "live-token" })));
    }

    #[test]
    fn test_admits_any() {
        let filter = KeyFilter::exclude(["token"]);
        assert!(!filter.admits_any(["token"]));
        assert!(filter.admits_any(["token", "name"]));
        assert!(!KeyFilter::include(["a"]).admits_any(std::iter::empty()));
    }
}

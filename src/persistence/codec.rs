//! Serialization strategy for persisted records
//!
//! A `Codec` is a pair of functions: state → text and text → state. The
//! default is plain JSON. `Codec::json_with` adds per-field replacer/reviver
//! hooks applied to every key of the tree.

use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::error::CodecError;
use crate::state::State;

pub type SerializeFn = Rc<dyn Fn(&State) -> Result<String, CodecError>>;
pub type DeserializeFn = Rc<dyn Fn(&str) -> Result<State, CodecError>>;

/// Called as `(key, value)` on the way out, parents before children. The
/// root is visited with an empty key.
pub type Replacer = Rc<dyn Fn(&str, Value) -> Value>;

/// Called as `(key, value)` on the way in, children before parents. The
/// root is visited last with an empty key.
pub type Reviver = Rc<dyn Fn(&str, Value) -> Value>;

#[derive(Clone)]
pub struct Codec {
    serialize: SerializeFn,
    deserialize: DeserializeFn,
}

impl Default for Codec {
    fn default() -> Self {
        Self::json()
    }
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec").finish_non_exhaustive()
    }
}

impl Codec {
    /// Custom strategy from two functions
    pub fn new(
        serialize: impl Fn(&State) -> Result<String, CodecError> + 'static,
        deserialize: impl Fn(&str) -> Result<State, CodecError> + 'static,
    ) -> Self {
        Self {
            serialize: Rc::new(serialize),
            deserialize: Rc::new(deserialize),
        }
    }

    /// Plain JSON object
    pub fn json() -> Self {
        Self::new(
            |state| Ok(serde_json::to_string(state)?),
            |text| into_state(serde_json::from_str(text)?),
        )
    }

    /// JSON with optional replacer and reviver hooks
    pub fn json_with(replacer: Option<Replacer>, reviver: Option<Reviver>) -> Self {
        Self::new(
            move |state| match &replacer {
                Some(replacer) => {
                    let tree = replace_tree("", Value::Object(state.clone()), replacer.as_ref());
                    Ok(serde_json::to_string(&tree)?)
                }
                None => Ok(serde_json::to_string(state)?),
            },
            move |text| {
                let tree: Value = serde_json::from_str(text)?;
                match &reviver {
                    Some(reviver) => into_state(revive_tree("", tree, reviver.as_ref())),
                    None => into_state(tree),
                }
            },
        )
    }

    pub fn serialize(&self, state: &State) -> Result<String, CodecError> {
        (self.serialize)(state)
    }

    pub fn deserialize(&self, text: &str) -> Result<State, CodecError> {
        (self.deserialize)(text)
    }
}

fn into_state(value: Value) -> Result<State, CodecError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(CodecError::NotAnObject),
    }
}

fn replace_tree(key: &str, value: Value, replacer: &dyn Fn(&str, Value) -> Value) -> Value {
    match replacer(key, value) {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| {
                    let v = replace_tree(&k, v, replacer);
                    (k, v)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .enumerate()
                .map(|(i, v)| replace_tree(&i.to_string(), v, replacer))
                .collect(),
        ),
        other => other,
    }
}

fn revive_tree(key: &str, value: Value, reviver: &dyn Fn(&str, Value) -> Value) -> Value {
    let value = match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| {
                    let v = revive_tree(&k, v, reviver);
                    (k, v)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .enumerate()
                .map(|(i, v)| revive_tree(&i.to_string(), v, reviver))
                .collect(),
        ),
        other => other,
    };
    reviver(key, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state(value: Value) -> State {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_json_rejects_non_object() {
        let codec = Codec::json();
        assert!(matches!(codec.deserialize("[1, 2]"), Err(CodecError::NotAnObject)));
        assert!(matches!(codec.deserialize("{not json"), Err(CodecError::Json(_))));
    }

    #[test]
    fn test_replacer_applies_to_nested_keys() {
        let replacer: Replacer = Rc::new(|key: &str, value: Value| match key {
            "password" => Value::String("***".into()),
            _ => value,
        });
        let codec = Codec::json_with(Some(replacer), None);

        let text = codec
            .serialize(&state(json!({ "user": { "password": "hunter2", "id": 1 } })))
            .unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, json!({ "user": { "password": "***", "id": 1 } }));
    }

    #[test]
    fn test_reviver_runs_children_first() {
        let order = Rc::new(std::cell::RefCell::new(Vec::new()));
        let reviver: Reviver = {
            let order = order.clone();
            Rc::new(move |key: &str, value: Value| {
                order.borrow_mut().push(key.to_string());
                match (key, value) {
                    ("count", Value::Number(n)) => json!(n.as_i64().unwrap_or(0) * 10),
                    (_, value) => value,
                }
            })
        };
        let codec = Codec::json_with(None, Some(reviver));

        let restored = codec.deserialize(r#"{"stats":{"count":4}}"#).unwrap();
        assert_eq!(restored, state(json!({ "stats": { "count": 40 } })));
        assert_eq!(*order.borrow(), vec!["count", "stats", ""]);
    }

    #[test]
    fn test_custom_codec() {
        let codec = Codec::new(
            |state| Ok(format!("v1:{}", serde_json::to_string(state)?)),
            |text| {
                let body = text
                    .strip_prefix("v1:")
                    .ok_or_else(|| CodecError::Custom("missing version tag".into()))?;
                into_state(serde_json::from_str(body)?)
            },
        );

        let original = state(json!({ "a": true }));
        let text = codec.serialize(&original).unwrap();
        assert!(text.starts_with("v1:"));
        assert_eq!(codec.deserialize(&text).unwrap(), original);
        assert!(matches!(codec.deserialize("{}"), Err(CodecError::Custom(_))));
    }
}

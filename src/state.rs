//! Reactive state container
//!
//! State is a flat object of field name → JSON value. The persistence layer
//! only talks to containers through `StateContainer`; `SharedState` is the
//! single-threaded implementation shipped with the crate.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use serde_json::Value;

use crate::events::{Listeners, Subscription};
use crate::persistence::KeyFilter;

/// A state snapshot: field name → value
pub type State = serde_json::Map<String, Value>;

/// The set of top-level fields touched by one mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    keys: BTreeSet<String>,
}

impl ChangeSet {
    /// Fields whose value differs between `before` and `after`, including
    /// fields present in only one of them.
    pub fn between(before: &State, after: &State) -> Self {
        let mut keys: BTreeSet<String> = after
            .iter()
            .filter(|(key, value)| before.get(*key) != Some(*value))
            .map(|(key, _)| key.clone())
            .collect();
        keys.extend(
            before
                .keys()
                .filter(|key| !after.contains_key(*key))
                .cloned(),
        );
        Self { keys }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }
}

/// Change listener registered with a container
pub type ChangeListener = Box<dyn FnMut(&ChangeSet)>;

/// An observable holder of a state object.
pub trait StateContainer {
    /// Copy of the current state
    fn snapshot(&self) -> State;

    /// Replace the whole state
    fn replace(&self, state: State);

    /// Listen for changes. The listener is only called when a changed field
    /// passes `scope`. Containers that cannot scope may notify on every change.
    fn subscribe(&self, scope: KeyFilter, listener: ChangeListener) -> Subscription;
}

struct Inner {
    state: RefCell<State>,
    listeners: Listeners<ChangeSet>,
}

/// Cheaply clonable, single-threaded shared state. Clones observe the same
/// state and listeners.
#[derive(Clone)]
pub struct SharedState {
    inner: Rc<Inner>,
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new(State::new())
    }
}

impl std::fmt::Debug for SharedState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedState")
            .field("state", &*self.inner.state.borrow())
            .field("listeners", &self.inner.listeners.len())
            .finish()
    }
}

impl SharedState {
    pub fn new(initial: State) -> Self {
        Self {
            inner: Rc::new(Inner {
                state: RefCell::new(initial),
                listeners: Listeners::new(),
            }),
        }
    }

    /// Build from a JSON value. Returns `None` unless it is an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self::new(map)),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.state.borrow().get(key).cloned()
    }

    /// Set a single field
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        let mut partial = State::new();
        partial.insert(key.into(), value.into());
        self.set_state(partial);
    }

    /// Merge `partial` into the current state
    pub fn set_state(&self, partial: State) {
        let mut next = self.snapshot();
        next.extend(partial);
        self.commit(next);
    }

    /// Swap in `next` and notify listeners of what changed. The state borrow
    /// is released before any listener runs.
    fn commit(&self, next: State) {
        let changes = {
            let mut state = self.inner.state.borrow_mut();
            let changes = ChangeSet::between(&state, &next);
            *state = next;
            changes
        };

        if !changes.is_empty() {
            self.inner.listeners.emit(&changes);
        }
    }
}

impl StateContainer for SharedState {
    fn snapshot(&self) -> State {
        self.inner.state.borrow().clone()
    }

    fn replace(&self, state: State) {
        self.commit(state);
    }

    fn subscribe(&self, scope: KeyFilter, mut listener: ChangeListener) -> Subscription {
        self.inner.listeners.add(move |changes: &ChangeSet| {
            if scope.admits_any(changes.keys()) {
                listener(changes);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;

    fn state(value: Value) -> State {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_change_set_between() {
        let before = state(json!({ "a": 1, "b": 2, "c": 3 }));
        let after = state(json!({ "a": 1, "b": 5, "d": 4 }));

        let changes = ChangeSet::between(&before, &after);
        assert_eq!(changes.keys().collect::<Vec<_>>(), vec!["b", "c", "d"]);
        assert_eq!(changes.len(), 3);
    }

    #[test]
    fn test_set_state_merges() {
        let shared = SharedState::new(state(json!({ "name": "Ada", "age": 36 })));
        shared.set_state(state(json!({ "age": 37 })));

        assert_eq!(shared.get("name"), Some(json!("Ada")));
        assert_eq!(shared.get("age"), Some(json!(37)));
    }

    #[test]
    fn test_replace_drops_missing_fields() {
        let shared = SharedState::new(state(json!({ "name": "Ada", "age": 36 })));
        shared.replace(state(json!({ "name": "Grace" })));

        assert_eq!(shared.snapshot(), state(json!({ "name": "Grace" })));
    }

    #[test]
    fn test_scoped_subscription() {
        let shared = SharedState::new(state(json!({ "name": "Ada", "token": "t" })));
        let calls = Rc::new(Cell::new(0));

        let _sub = {
            let calls = calls.clone();
            shared.subscribe(
                KeyFilter::exclude(["token"]),
                Box::new(move |_: &ChangeSet| calls.set(calls.get() + 1)),
            )
        };

        shared.set("token", "rotated");
        assert_eq!(calls.get(), 0);

        shared.set("name", "Grace");
        assert_eq!(calls.get(), 1);

        // No-op write is not a change
        shared.set("name", "Grace");
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_listener_can_read_state() {
        let shared = SharedState::default();
        let seen = Rc::new(RefCell::new(None));

        let _sub = {
            let reader = shared.clone();
            let seen = seen.clone();
            shared.subscribe(
                KeyFilter::All,
                Box::new(move |_: &ChangeSet| *seen.borrow_mut() = reader.get("n")),
            )
        };

        shared.set("n", 1);
        assert_eq!(*seen.borrow(), Some(json!(1)));
    }
}

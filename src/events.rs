//! Single-threaded listener registry
//!
//! Listeners are dispatched on the caller's stack. A `Subscription` owns the
//! registration: dropping it removes the listener.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

type Callback<T> = Rc<RefCell<dyn FnMut(&T)>>;

struct Registry<T> {
    next_id: Cell<u64>,
    entries: RefCell<Vec<(u64, Callback<T>)>>,
}

/// A set of listeners for events of type `T`.
pub struct Listeners<T: 'static> {
    registry: Rc<Registry<T>>,
}

impl<T: 'static> Default for Listeners<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> Listeners<T> {
    pub fn new() -> Self {
        Self {
            registry: Rc::new(Registry {
                next_id: Cell::new(0),
                entries: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Register a listener. It stays registered until the returned
    /// subscription is dropped.
    pub fn add(&self, listener: impl FnMut(&T) + 'static) -> Subscription {
        let id = self.registry.next_id.get();
        self.registry.next_id.set(id + 1);

        let callback: Callback<T> = Rc::new(RefCell::new(listener));
        self.registry.entries.borrow_mut().push((id, callback));

        let registry: Weak<Registry<T>> = Rc::downgrade(&self.registry);
        Subscription::new(move || {
            if let Some(registry) = registry.upgrade() {
                registry
                    .entries
                    .borrow_mut()
                    .retain(|(entry_id, _)| *entry_id != id);
            }
        })
    }

    /// Deliver `event` to every listener registered at the time of the call.
    ///
    /// Listeners may subscribe or unsubscribe while being called. A listener
    /// that re-enters `emit` for itself is skipped for the nested event.
    pub fn emit(&self, event: &T) {
        let callbacks: Vec<Callback<T>> = self
            .registry
            .entries
            .borrow()
            .iter()
            .map(|(_, callback)| Rc::clone(callback))
            .collect();

        for callback in callbacks {
            if let Ok(mut listener) = callback.try_borrow_mut() {
                listener(event);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.registry.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Owned registration handle. Dropping it unregisters the listener.
#[must_use = "dropping a Subscription unsubscribes its listener immediately"]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(unsubscribe: impl FnOnce() + 'static) -> Self {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    /// A subscription with nothing to release
    pub fn empty() -> Self {
        Self { unsubscribe: None }
    }

    /// Unregister now instead of at drop.
    pub fn unsubscribe(mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}

//! Key-value storage backends
//!
//! The platform interface stores raw strings. Serialization and encryption
//! are the store's responsibility, not the backend's.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use crate::error::BackendError;

/// String key → string value storage with atomic single-key operations.
pub trait Storage {
    /// Read a value by key. Returns `None` if not found.
    fn get(&self, key: &str) -> Result<Option<String>, BackendError>;

    /// Write a value under key, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), BackendError>;

    /// Remove a key. Removing a missing key succeeds.
    fn remove(&self, key: &str) -> Result<(), BackendError>;
}

/// In-process storage. Useful for tests and for apps that only need state to
/// survive a soft restart.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RefCell<HashMap<String, String>>,
    failing: Cell<bool>,
    writes: Cell<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail with `BackendError::Unavailable`
    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }

    /// Number of successful `set` calls so far
    pub fn write_count(&self) -> usize {
        self.writes.get()
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    fn check(&self) -> Result<(), BackendError> {
        if self.failing.get() {
            Err(BackendError::Unavailable)
        } else {
            Ok(())
        }
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, BackendError> {
        self.check()?;
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), BackendError> {
        self.check()?;
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), BackendError> {
        self.check()?;
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_basic() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("k").unwrap(), None);

        storage.set("k", "v1").unwrap();
        storage.set("k", "v2").unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("v2"));
        assert_eq!(storage.write_count(), 2);

        storage.remove("k").unwrap();
        storage.remove("k").unwrap();
        assert!(storage.is_empty());
    }

    #[test]
    fn test_memory_storage_failing() {
        let storage = MemoryStorage::new();
        storage.set_failing(true);

        assert!(matches!(storage.get("k"), Err(BackendError::Unavailable)));
        assert!(storage.set("k", "v").is_err());
        assert!(storage.remove("k").is_err());
        assert_eq!(storage.write_count(), 0);
    }
}

//! Persistence store: save/load/delete of a state container's snapshot
//!
//! Save path: container → filter → codec → [cipher] → storage.
//! Load path: storage → [cipher] → codec → reconcile → container.
//!
//! Save never raises: failures go to the error reporter and come back as
//! `false`. Load and delete return their errors.
//!
//! A load that finds no record saves the current live state and returns
//! `Ok(None)`, so after the first load a record exists whenever the live
//! state has persisted fields.

use std::rc::{Rc, Weak};

use crate::error::{Result, StoreError, StoreFailure};
use crate::events::Subscription;
use crate::platform::{AppState, Storage};
use crate::settings::StoreOptions;
use crate::state::{ChangeSet, State, StateContainer};

struct Inner {
    container: Rc<dyn StateContainer>,
    storage: Rc<dyn Storage>,
    options: StoreOptions,
}

impl Inner {
    fn name(&self) -> &str {
        &self.options.store_name
    }

    fn save(&self) -> bool {
        self.save_state(&self.container.snapshot())
    }

    fn save_state(&self, state: &State) -> bool {
        let filtered;
        let to_save = if self.options.filter.is_all() {
            state
        } else {
            filtered = self.options.filter.project(state);
            if filtered.is_empty() {
                log::warn!("Store '{}': no persisted fields in state, skipping save", self.name());
                return false;
            }
            &filtered
        };

        match self.write(to_save) {
            Ok(()) => {
                log::debug!("Store '{}': saved {} fields", self.name(), to_save.len());
                true
            }
            Err(failure) => {
                let err = StoreError::save(self.name(), failure);
                self.options.reporter.report(&err.report());
                false
            }
        }
    }

    fn write(&self, state: &State) -> std::result::Result<(), StoreFailure> {
        let mut record = self.options.codec.serialize(state)?;
        if let Some(secret) = &self.options.encryption_key {
            record = self.options.cipher.encrypt(&record, secret)?;
        }
        self.storage.set(self.name(), &record)?;
        Ok(())
    }

    /// Read and decode the record. An empty record counts as missing.
    fn read(&self) -> std::result::Result<Option<State>, StoreFailure> {
        let Some(record) = self.storage.get(self.name())?.filter(|r| !r.is_empty()) else {
            return Ok(None);
        };

        let text = match &self.options.encryption_key {
            Some(secret) => self.options.cipher.decrypt(&record, secret)?,
            None => record,
        };
        Ok(Some(self.options.codec.deserialize(&text)?))
    }

    fn load(&self) -> Result<Option<State>> {
        let retrieved = self
            .read()
            .map_err(|failure| StoreError::load(self.name(), failure))?;

        let Some(retrieved) = retrieved else {
            log::info!("Store '{}': no saved record, persisting current state", self.name());
            self.save();
            return Ok(None);
        };

        let reconciled = self
            .options
            .filter
            .reconcile(retrieved, &self.container.snapshot());
        self.container.replace(reconciled.clone());

        log::info!("Store '{}': loaded {} fields", self.name(), reconciled.len());
        Ok(Some(reconciled))
    }

    fn delete(&self) -> Result<()> {
        self.storage
            .remove(self.name())
            .map_err(|e| StoreError::delete(self.name(), e))?;
        log::info!("Store '{}': record deleted", self.name());
        Ok(())
    }
}

/// Persists one state container under one storage key.
///
/// Automatic triggers are subscriptions owned by the store; dropping the
/// store stops them.
pub struct PersistenceStore {
    inner: Rc<Inner>,
    subscriptions: Vec<Subscription>,
}

impl PersistenceStore {
    /// Build the store and attach the configured triggers. Does not load.
    pub fn new(
        container: Rc<dyn StateContainer>,
        storage: Rc<dyn Storage>,
        options: StoreOptions,
    ) -> Self {
        let inner = Rc::new(Inner {
            container,
            storage,
            options,
        });
        let mut subscriptions = Vec::new();

        if inner.options.save_automatically {
            let weak: Weak<Inner> = Rc::downgrade(&inner);
            subscriptions.push(inner.container.subscribe(
                inner.options.filter.clone(),
                Box::new(move |changes: &ChangeSet| {
                    if let Some(inner) = weak.upgrade() {
                        log::debug!(
                            "Store '{}': {} persisted fields changed, saving",
                            inner.name(),
                            changes.len()
                        );
                        inner.save();
                    }
                }),
            ));
        }

        if let Some(lifecycle) = &inner.options.lifecycle {
            let weak: Weak<Inner> = Rc::downgrade(&inner);
            subscriptions.push(lifecycle.subscribe(Box::new(move |state: AppState| {
                if state == AppState::Background {
                    if let Some(inner) = weak.upgrade() {
                        log::debug!("Store '{}': app backgrounded, saving", inner.name());
                        inner.save();
                    }
                }
            })));
        }

        Self {
            inner,
            subscriptions,
        }
    }

    /// Build the store and load it right away.
    pub fn open(
        container: Rc<dyn StateContainer>,
        storage: Rc<dyn Storage>,
        options: StoreOptions,
    ) -> Result<Self> {
        let store = Self::new(container, storage, options);
        store.load()?;
        Ok(store)
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn container(&self) -> &Rc<dyn StateContainer> {
        &self.inner.container
    }

    pub fn options(&self) -> &StoreOptions {
        &self.inner.options
    }

    /// Number of active automatic triggers
    pub fn trigger_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Save the container's current state. Returns `false` on failure or when
    /// the filter leaves nothing to save.
    pub fn save(&self) -> bool {
        self.inner.save()
    }

    /// Save an explicit snapshot instead of the live state
    pub fn save_state(&self, state: &State) -> bool {
        self.inner.save_state(state)
    }

    /// Restore the record into the container. Returns the applied state, or
    /// `None` when there was no record.
    pub fn load(&self) -> Result<Option<State>> {
        self.inner.load()
    }

    /// Remove the record. The container is left alone.
    pub fn delete(&self) -> Result<()> {
        self.inner.delete()
    }
}

impl std::fmt::Debug for PersistenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceStore")
            .field("options", &self.inner.options)
            .field("triggers", &self.subscriptions.len())
            .finish()
    }
}

//! Browser integrations (wasm32 only)
//!
//! - `LocalStorage`: `window.localStorage` as a `Storage` backend
//! - `VisibilityLifecycle`: `document.visibilitychange` as a lifecycle source

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, VisibilityState};

use crate::error::BackendError;
use crate::events::Subscription;
use crate::platform::{AppState, LifecycleSource, Storage};

fn js_error(err: JsValue) -> BackendError {
    BackendError::Rejected(
        err.as_string()
            .unwrap_or_else(|| format!("{err:?}")),
    )
}

/// `window.localStorage`
pub struct LocalStorage {
    storage: web_sys::Storage,
}

impl LocalStorage {
    pub fn new() -> Result<Self, BackendError> {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or(BackendError::Unavailable)?;
        Ok(Self { storage })
    }
}

impl Storage for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>, BackendError> {
        self.storage.get_item(key).map_err(js_error)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), BackendError> {
        self.storage.set_item(key, value).map_err(js_error)
    }

    fn remove(&self, key: &str) -> Result<(), BackendError> {
        self.storage.remove_item(key).map_err(js_error)
    }
}

/// Reports `Background` when the page becomes hidden (tab switch, minimize,
/// app switcher on mobile) and `Active` when it becomes visible again.
pub struct VisibilityLifecycle {
    document: Document,
}

impl VisibilityLifecycle {
    pub fn new() -> Result<Self, BackendError> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or(BackendError::Unavailable)?;
        Ok(Self { document })
    }

    pub fn current(&self) -> AppState {
        visibility_to_app_state(self.document.visibility_state())
    }
}

fn visibility_to_app_state(state: VisibilityState) -> AppState {
    match state {
        VisibilityState::Hidden => AppState::Background,
        _ => AppState::Active,
    }
}

impl LifecycleSource for VisibilityLifecycle {
    fn subscribe(&self, mut listener: Box<dyn FnMut(AppState)>) -> Subscription {
        let document_clone = self.document.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            listener(visibility_to_app_state(document_clone.visibility_state()));
        });

        if let Err(e) = self
            .document
            .add_event_listener_with_callback("visibilitychange", closure.as_ref().unchecked_ref())
        {
            log::warn!("Failed to listen for visibilitychange: {:?}", e);
            return Subscription::empty();
        }

        // The closure must stay alive while registered; it is dropped after
        // the listener is removed.
        let document = self.document.clone();
        Subscription::new(move || {
            if let Err(e) = document.remove_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            ) {
                log::warn!("Failed to remove visibilitychange listener: {:?}", e);
            }
            drop(closure);
        })
    }
}

//! State Store - persistence for reactive application state
//!
//! Core modules:
//! - `state`: Reactive state container (`StateContainer`, `SharedState`)
//! - `persistence`: Save/load/delete with filtering and encryption
//! - `platform`: Storage backends and lifecycle signals per platform
//! - `settings`: Store configuration
//! - `error`: Error types and reporting
//!
//! ```no_run
//! use std::rc::Rc;
//! use state_store::{MemoryStorage, PersistenceStore, SharedState, StoreOptions};
//!
//! let state = SharedState::default();
//! state.set("name", "Ada");
//! state.set("token", "secret");
//!
//! let store = PersistenceStore::new(
//!     Rc::new(state.clone()),
//!     Rc::new(MemoryStorage::new()),
//!     StoreOptions::new("profile").exclude(["token"]).save_automatically(true),
//! );
//! assert!(store.save());
//! ```

pub mod error;
pub mod events;
pub mod persistence;
pub mod platform;
pub mod settings;
pub mod state;

pub use error::{ErrorKind, ErrorReport, ErrorReporter, LogReporter, Severity, StoreError};
pub use events::Subscription;
pub use persistence::{AesGcmCipher, Cipher, Codec, KeyFilter, PersistenceStore};
pub use platform::{AppState, LifecycleEvents, LifecycleSource, MemoryStorage, Storage};
pub use settings::{StoreOptions, StoreSettings};
pub use state::{ChangeSet, SharedState, State, StateContainer};

#[cfg(not(target_arch = "wasm32"))]
pub use platform::FileStorage;
#[cfg(target_arch = "wasm32")]
pub use platform::{LocalStorage, VisibilityLifecycle};

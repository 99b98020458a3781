//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Storage (LocalStorage on web, a directory of files on native)
//! - Visibility/lifecycle detection

pub mod lifecycle;
pub mod storage;

#[cfg(not(target_arch = "wasm32"))]
pub mod file;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use lifecycle::{AppState, LifecycleEvents, LifecycleSource};
pub use storage::{MemoryStorage, Storage};

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStorage;
#[cfg(target_arch = "wasm32")]
pub use web::{LocalStorage, VisibilityLifecycle};

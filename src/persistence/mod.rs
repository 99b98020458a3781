//! Save/load persistence with filtering and encryption
//!
//! Features:
//! - Include/exclude field filtering, reconciled against live state on load
//! - Pluggable codec (JSON by default, replacer/reviver hooks)
//! - AES-256-GCM record envelope
//! - Automatic saves on state change and on app background

pub mod codec;
pub mod crypto;
pub mod filter;
pub mod store;

pub use codec::{Codec, Replacer, Reviver};
pub use crypto::{AesGcmCipher, Cipher};
pub use filter::KeyFilter;
pub use store::PersistenceStore;

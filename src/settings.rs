//! Store configuration
//!
//! `StoreSettings` is the plain-data part of the configuration and can be
//! read from JSON alongside the rest of an app's settings. `StoreOptions` is
//! what a `PersistenceStore` is built from: the settings plus the runtime
//! strategies (codec, cipher, error reporter, lifecycle source).

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::{ErrorReporter, LogReporter};
use crate::persistence::{AesGcmCipher, Cipher, Codec, KeyFilter};
use crate::platform::LifecycleSource;

/// Serializable store settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreSettings {
    /// Key of the backing record
    pub store_name: String,
    /// Secret for record encryption; `None` or empty stores plaintext
    pub encryption_key: Option<String>,
    /// Persist only these fields (wins over `exclude_keys`)
    pub include_keys: Option<Vec<String>>,
    /// Persist everything except these fields
    pub exclude_keys: Option<Vec<String>>,
    /// Save whenever a persisted field changes
    pub save_automatically: bool,
    /// Save when the app goes to the background
    pub save_on_background: bool,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            store_name: "state".to_string(),
            encryption_key: None,
            include_keys: None,
            exclude_keys: None,
            save_automatically: false,
            save_on_background: false,
        }
    }
}

/// Immutable runtime configuration of a `PersistenceStore`.
#[derive(Clone)]
pub struct StoreOptions {
    pub(crate) store_name: String,
    pub(crate) encryption_key: Option<String>,
    pub(crate) filter: KeyFilter,
    pub(crate) codec: Codec,
    pub(crate) cipher: Rc<dyn Cipher>,
    pub(crate) reporter: Rc<dyn ErrorReporter>,
    pub(crate) save_automatically: bool,
    pub(crate) lifecycle: Option<Rc<dyn LifecycleSource>>,
}

impl fmt::Debug for StoreOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreOptions")
            .field("store_name", &self.store_name)
            .field("encrypted", &self.encryption_key.is_some())
            .field("filter", &self.filter)
            .field("save_automatically", &self.save_automatically)
            .field("save_on_background", &self.lifecycle.is_some())
            .finish_non_exhaustive()
    }
}

impl StoreOptions {
    pub fn new(store_name: impl Into<String>) -> Self {
        Self {
            store_name: store_name.into(),
            encryption_key: None,
            filter: KeyFilter::All,
            codec: Codec::default(),
            cipher: Rc::new(AesGcmCipher),
            reporter: Rc::new(LogReporter),
            save_automatically: false,
            lifecycle: None,
        }
    }

    /// Build from serializable settings. `save_on_background` only takes
    /// effect when a lifecycle source is supplied.
    pub fn from_settings(
        settings: StoreSettings,
        lifecycle: Option<Rc<dyn LifecycleSource>>,
    ) -> Self {
        let mut options = Self::new(settings.store_name);
        options.filter = KeyFilter::from_lists(settings.include_keys, settings.exclude_keys);
        options.save_automatically = settings.save_automatically;

        if let Some(key) = settings.encryption_key {
            options = options.encryption_key(key);
        }
        match (settings.save_on_background, lifecycle) {
            (true, Some(source)) => options.lifecycle = Some(source),
            (true, None) => {
                log::warn!(
                    "Store '{}': saveOnBackground set without a lifecycle source",
                    options.store_name
                );
            }
            _ => {}
        }
        options
    }

    /// Encrypt the record with `secret`. An empty secret disables encryption.
    pub fn encryption_key(mut self, secret: impl Into<String>) -> Self {
        let secret = secret.into();
        self.encryption_key = (!secret.is_empty()).then_some(secret);
        self
    }

    pub fn include<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filter = KeyFilter::include(keys);
        self
    }

    /// Exclude `keys`. Ignored if an include set is already configured.
    pub fn exclude<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let KeyFilter::Include(_) = self.filter {
            log::warn!(
                "Store '{}': include keys already set; exclude keys ignored",
                self.store_name
            );
        } else {
            self.filter = KeyFilter::exclude(keys);
        }
        self
    }

    pub fn codec(mut self, codec: Codec) -> Self {
        self.codec = codec;
        self
    }

    pub fn cipher(mut self, cipher: impl Cipher + 'static) -> Self {
        self.cipher = Rc::new(cipher);
        self
    }

    pub fn reporter(mut self, reporter: impl ErrorReporter + 'static) -> Self {
        self.reporter = Rc::new(reporter);
        self
    }

    pub fn save_automatically(mut self, enabled: bool) -> Self {
        self.save_automatically = enabled;
        self
    }

    pub fn save_on_background(mut self, source: Rc<dyn LifecycleSource>) -> Self {
        self.lifecycle = Some(source);
        self
    }

    pub fn store_name(&self) -> &str {
        &self.store_name
    }

    pub fn filter(&self) -> &KeyFilter {
        &self.filter
    }

    pub fn is_encrypted(&self) -> bool {
        self.encryption_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::LifecycleEvents;

    #[test]
    fn test_settings_from_json() {
        let settings: StoreSettings = serde_json::from_str(
            r#"{ "storeName": "profile", "excludeKeys": ["token"], "saveAutomatically": true }"#,
        )
        .unwrap();

        assert_eq!(settings.store_name, "profile");
        assert_eq!(settings.exclude_keys, Some(vec!["token".to_string()]));
        assert!(settings.save_automatically);
        assert!(!settings.save_on_background);
        assert_eq!(settings.encryption_key, None);
    }

    #[test]
    fn test_options_from_settings() {
        let settings = StoreSettings {
            store_name: "profile".into(),
            encryption_key: Some("pw".into()),
            include_keys: Some(vec!["name".into()]),
            exclude_keys: Some(vec!["name".into()]),
            save_automatically: true,
            save_on_background: true,
        };
        let lifecycle: Rc<dyn LifecycleSource> = Rc::new(LifecycleEvents::new());
        let options = StoreOptions::from_settings(settings, Some(lifecycle));

        assert_eq!(options.store_name(), "profile");
        assert!(options.is_encrypted());
        assert_eq!(options.filter(), &KeyFilter::include(["name"]));
        assert!(options.save_automatically);
        assert!(options.lifecycle.is_some());
    }

    #[test]
    fn test_empty_secret_disables_encryption() {
        let options = StoreOptions::new("s").encryption_key("");
        assert!(!options.is_encrypted());
    }

    #[test]
    fn test_include_wins_over_exclude() {
        let options = StoreOptions::new("s").include(["a"]).exclude(["b"]);
        assert_eq!(options.filter(), &KeyFilter::include(["a"]));

        let options = StoreOptions::new("s").exclude(["b"]);
        assert_eq!(options.filter(), &KeyFilter::exclude(["b"]));
    }
}

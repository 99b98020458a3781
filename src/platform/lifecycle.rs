//! Application lifecycle signals (foreground/background)

use std::cell::Cell;

use serde::{Deserialize, Serialize};

use crate::events::{Listeners, Subscription};

/// Visibility state of the host application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AppState {
    /// In the foreground and receiving input
    #[default]
    Active,
    /// Visible but not focused (transitional on mobile)
    Inactive,
    /// Hidden, minimized or otherwise backgrounded
    Background,
}

impl AppState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppState::Active => "active",
            AppState::Inactive => "inactive",
            AppState::Background => "background",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" | "foreground" | "visible" => Some(AppState::Active),
            "inactive" => Some(AppState::Inactive),
            "background" | "hidden" => Some(AppState::Background),
            _ => None,
        }
    }
}

/// Source of lifecycle transitions.
pub trait LifecycleSource {
    fn subscribe(&self, listener: Box<dyn FnMut(AppState)>) -> Subscription;
}

/// Lifecycle source driven by the host: call `emit` when the app changes
/// state. Repeated reports of the current state are swallowed so listeners
/// only see transitions.
#[derive(Default)]
pub struct LifecycleEvents {
    current: Cell<AppState>,
    listeners: Listeners<AppState>,
}

impl LifecycleEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&self, next: AppState) {
        if self.current.replace(next) != next {
            log::debug!("App state -> {}", next.as_str());
            self.listeners.emit(&next);
        }
    }
}

impl LifecycleSource for LifecycleEvents {
    fn subscribe(&self, mut listener: Box<dyn FnMut(AppState)>) -> Subscription {
        self.listeners.add(move |state: &AppState| listener(*state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_only_transitions_are_delivered() {
        let events = LifecycleEvents::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let _sub = {
            let seen = seen.clone();
            events.subscribe(Box::new(move |state: AppState| seen.borrow_mut().push(state)))
        };

        events.emit(AppState::Active);
        events.emit(AppState::Background);
        events.emit(AppState::Background);
        events.emit(AppState::Active);

        assert_eq!(*seen.borrow(), vec![AppState::Background, AppState::Active]);
    }

    #[test]
    fn test_app_state_from_str() {
        assert_eq!(AppState::from_str("Background"), Some(AppState::Background));
        assert_eq!(AppState::from_str("hidden"), Some(AppState::Background));
        assert_eq!(AppState::from_str("visible"), Some(AppState::Active));
        assert_eq!(AppState::from_str("sleeping"), None);
    }
}

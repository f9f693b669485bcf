//! Recording key injector for tests.
//!
//! # Why a recording injector?
//!
//! The real injector posts events into the OS input stream, which presses
//! keys on the test machine and cannot be observed from Rust.  The
//! `RecordingKeyInjector` instead pushes each call into a `Mutex<Vec<...>>`
//! so assertions can check exactly what was injected and in what order.
//!
//! # Usage in tests
//!
//! ```ignore
//! let injector = Arc::new(RecordingKeyInjector::new());
//! let use_case = InjectKeysUseCase::new(injector.clone());
//!
//! use_case.inject_all(&events);
//!
//! assert_eq!(injector.events(), vec![(KeyCode(0x01), true)]);
//! ```
//!
//! # `should_fail` flag
//!
//! Build with [`RecordingKeyInjector::failing`] to make every call return
//! `InjectionError::Platform`, for exercising error paths.

use std::sync::Mutex;

use wiikey_core::KeyCode;

use crate::application::inject_keys::{InjectionError, KeyInjector};

/// Records `(key, pressed)` for every call, in call order.
#[derive(Debug, Default)]
pub struct RecordingKeyInjector {
    events: Mutex<Vec<(KeyCode, bool)>>,
    should_fail: bool,
}

impl RecordingKeyInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// An injector whose every call fails.  Failed calls are not recorded.
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// Everything injected so far.
    pub fn events(&self) -> Vec<(KeyCode, bool)> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn record(&self, key: KeyCode, pressed: bool) -> Result<(), InjectionError> {
        if self.should_fail {
            return Err(InjectionError::Platform("recording injector set to fail".into()));
        }
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((key, pressed));
        Ok(())
    }
}

impl KeyInjector for RecordingKeyInjector {
    fn key_down(&self, key: KeyCode) -> Result<(), InjectionError> {
        self.record(key, true)
    }

    fn key_up(&self, key: KeyCode) -> Result<(), InjectionError> {
        self.record(key, false)
    }
}

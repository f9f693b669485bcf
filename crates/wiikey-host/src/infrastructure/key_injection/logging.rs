//! Key injector that only logs.

use tracing::info;
use wiikey_core::KeyCode;

use crate::application::inject_keys::{InjectionError, KeyInjector};

/// Logs every key event at `info` and otherwise does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingKeyInjector;

impl LoggingKeyInjector {
    pub fn new() -> Self {
        Self
    }
}

impl KeyInjector for LoggingKeyInjector {
    fn key_down(&self, key: KeyCode) -> Result<(), InjectionError> {
        info!(%key, "key down");
        Ok(())
    }

    fn key_up(&self, key: KeyCode) -> Result<(), InjectionError> {
        info!(%key, "key up");
        Ok(())
    }
}

//! OS key injection implementations.
//!
//! The platform implementation is selected at compile time via
//! `#[cfg(target_os = ...)]`; [`platform_injector`] returns it.

pub mod logging;
pub mod recording;

#[cfg(target_os = "macos")]
pub mod macos;

use std::sync::Arc;

use crate::application::inject_keys::KeyInjector;

/// Returns the key injector for the current platform.
///
/// macOS posts real keyboard events through CoreGraphics.  Other platforms
/// only log the events they would have sent.
pub fn platform_injector() -> Arc<dyn KeyInjector> {
    #[cfg(target_os = "macos")]
    {
        Arc::new(macos::CoreGraphicsKeyInjector::new())
    }

    #[cfg(not(target_os = "macos"))]
    {
        tracing::warn!("no OS key injection on this platform; key events will only be logged");
        Arc::new(logging::LoggingKeyInjector::new())
    }
}

//! macOS key injection via CoreGraphics.
//!
//! Each key event goes through three calls:
//!
//! 1. `CGEventSourceCreate(kCGEventSourceStateHIDSystemState)` – an event
//!    source that looks like a physical keyboard.
//! 2. `CGEventCreateKeyboardEvent(source, keycode, down)` – the key event.
//! 3. `CGEventPost(kCGHIDEventTap, event)` – posts it at the HID level, the
//!    same level as real keyboard input.
//!
//! Mapping-file key codes are already `CGKeyCode` values and are passed
//! through unchanged.
//!
//! # Accessibility permission
//!
//! Posting at `kCGHIDEventTap` requires the process to be trusted under
//! System Settings → Privacy & Security → Accessibility.  Without it the
//! calls succeed but the events are silently discarded.

use core_graphics::event::{CGEvent, CGEventTapLocation, CGKeyCode};
use core_graphics::event_source::{CGEventSource, CGEventSourceStateID};
use wiikey_core::KeyCode;

use crate::application::inject_keys::{InjectionError, KeyInjector};

/// Posts key events into the macOS HID event stream.
#[derive(Debug, Default, Clone, Copy)]
pub struct CoreGraphicsKeyInjector;

impl CoreGraphicsKeyInjector {
    pub fn new() -> Self {
        Self
    }

    fn post(&self, key: KeyCode, down: bool) -> Result<(), InjectionError> {
        let source = CGEventSource::new(CGEventSourceStateID::HIDSystemState)
            .map_err(|_| InjectionError::Platform("CGEventSourceCreate failed".into()))?;
        let event = CGEvent::new_keyboard_event(source, key.0 as CGKeyCode, down)
            .map_err(|_| InjectionError::Platform("CGEventCreateKeyboardEvent failed".into()))?;
        event.post(CGEventTapLocation::HID);
        Ok(())
    }
}

impl KeyInjector for CoreGraphicsKeyInjector {
    fn key_down(&self, key: KeyCode) -> Result<(), InjectionError> {
        self.post(key, true)
    }

    fn key_up(&self, key: KeyCode) -> Result<(), InjectionError> {
        self.post(key, false)
    }
}

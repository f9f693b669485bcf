//! InjectKeysUseCase: delivers key-event intents to the OS input layer.
//!
//! This use case sits at the application layer and delegates to a
//! [`KeyInjector`] trait object for OS-level event injection.  The platform
//! implementations are in the infrastructure layer.

use std::sync::Arc;

use thiserror::Error;
use tracing::warn;
use wiikey_core::{KeyCode, KeyEvent};

/// Error type for key injection.
#[derive(Debug, Error)]
pub enum InjectionError {
    #[error("platform error: {0}")]
    Platform(String),
}

/// Platform-agnostic key injection.
///
/// Key codes are passed through unchanged; they are already in the
/// platform's native numbering (see the mapping file).
#[cfg_attr(test, mockall::automock)]
pub trait KeyInjector: Send + Sync {
    /// Emits a key press (key-down event).
    fn key_down(&self, key: KeyCode) -> Result<(), InjectionError>;

    /// Emits a key release (key-up event).
    fn key_up(&self, key: KeyCode) -> Result<(), InjectionError>;
}

/// The Inject Keys use case.
pub struct InjectKeysUseCase {
    injector: Arc<dyn KeyInjector>,
}

impl InjectKeysUseCase {
    pub fn new(injector: Arc<dyn KeyInjector>) -> Self {
        Self { injector }
    }

    /// Injects a single key event.
    ///
    /// # Errors
    ///
    /// Returns [`InjectionError`] if the OS event injection fails.
    pub fn handle_key_event(&self, event: &KeyEvent) -> Result<(), InjectionError> {
        if event.pressed {
            self.injector.key_down(event.key)
        } else {
            self.injector.key_up(event.key)
        }
    }

    /// Injects `events` in order and returns how many succeeded.
    ///
    /// A failed injection is logged and does not stop the remaining events.
    pub fn inject_all(&self, events: &[KeyEvent]) -> usize {
        events
            .iter()
            .filter(|event| match self.handle_key_event(event) {
                Ok(()) => true,
                Err(e) => {
                    warn!(
                        key = %event.key,
                        pressed = event.pressed,
                        error = %e,
                        "key injection failed"
                    );
                    false
                }
            })
            .count()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;
    use mockall::Sequence;
    use wiikey_core::GuitarControl;

    fn event(key: u16, pressed: bool) -> KeyEvent {
        KeyEvent {
            key: KeyCode(key),
            pressed,
            control: GuitarControl::FretGreen,
        }
    }

    #[test]
    fn test_pressed_event_calls_key_down() {
        // Arrange
        let mut mock = MockKeyInjector::new();
        mock.expect_key_down().with(eq(KeyCode(0x24))).times(1).returning(|_| Ok(()));
        mock.expect_key_up().never();
        let uc = InjectKeysUseCase::new(Arc::new(mock));

        // Act
        let result = uc.handle_key_event(&event(0x24, true));

        // Assert
        assert!(result.is_ok());
    }

    #[test]
    fn test_released_event_calls_key_up() {
        let mut mock = MockKeyInjector::new();
        mock.expect_key_up().with(eq(KeyCode(0x24))).times(1).returning(|_| Ok(()));
        mock.expect_key_down().never();
        let uc = InjectKeysUseCase::new(Arc::new(mock));

        assert!(uc.handle_key_event(&event(0x24, false)).is_ok());
    }

    #[test]
    fn test_inject_all_preserves_order() {
        // Arrange
        let mut seq = Sequence::new();
        let mut mock = MockKeyInjector::new();
        mock.expect_key_down()
            .with(eq(KeyCode(0x01)))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        mock.expect_key_up()
            .with(eq(KeyCode(0x02)))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        let uc = InjectKeysUseCase::new(Arc::new(mock));

        // Act
        let injected = uc.inject_all(&[event(0x01, true), event(0x02, false)]);

        // Assert
        assert_eq!(injected, 2);
    }

    #[test]
    fn test_inject_all_continues_after_failure() {
        let mut mock = MockKeyInjector::new();
        mock.expect_key_down()
            .with(eq(KeyCode(0x01)))
            .returning(|_| Err(InjectionError::Platform("denied".to_string())));
        mock.expect_key_down().with(eq(KeyCode(0x02))).returning(|_| Ok(()));
        let uc = InjectKeysUseCase::new(Arc::new(mock));

        assert_eq!(uc.inject_all(&[event(0x01, true), event(0x02, true)]), 1);
    }
}

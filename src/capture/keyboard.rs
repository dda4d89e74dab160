//! Synthetic copy keystroke backed by the `enigo` crate.
//!
//! | Platform | Shortcut |
//! |----------|----------|
//! | macOS    | ⌘C (Meta + C) |
//! | Windows  | Ctrl+C |
//! | Linux    | Ctrl+C |

use enigo::{Direction, Enigo, Key, Keyboard, Settings};

use super::CaptureError;

/// Delivers the platform "copy" shortcut to whichever window has focus.
pub trait KeystrokeSender: Send + Sync {
    fn send_copy(&self) -> Result<(), CaptureError>;
}

/// Modifier that forms the copy shortcut on this platform.
#[cfg(target_os = "macos")]
const COPY_MODIFIER: Key = Key::Meta;
#[cfg(not(target_os = "macos"))]
const COPY_MODIFIER: Key = Key::Control;

/// [`KeystrokeSender`] that posts real OS key events.
///
/// A new [`Enigo`] instance is created for each call because `Enigo` is not
/// `Send` and the handle is cheap to construct.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnigoKeystroke;

impl KeystrokeSender for EnigoKeystroke {
    fn send_copy(&self) -> Result<(), CaptureError> {
        let mut enigo = Enigo::new(&Settings::default())
            .map_err(|e| CaptureError::CaptureFailed(e.to_string()))?;

        enigo
            .key(COPY_MODIFIER, Direction::Press)
            .map_err(|e| CaptureError::CaptureFailed(e.to_string()))?;
        let click = enigo.key(Key::Unicode('c'), Direction::Click);
        // The modifier is released even when the click failed.
        let release = enigo.key(COPY_MODIFIER, Direction::Release);

        click.map_err(|e| CaptureError::CaptureFailed(e.to_string()))?;
        release.map_err(|e| CaptureError::CaptureFailed(e.to_string()))?;
        Ok(())
    }
}

//! Selection capture — read "what is selected" through the clipboard.
//!
//! # Overview
//!
//! There is no portable API that returns the selection of an arbitrary
//! foreground application.  Instead we use the clipboard as a side channel:
//!
//! 1. **Save** the user's clipboard and **clear** it ([`ClipboardGuard`]).
//! 2. **Simulate** ⌘C (or Ctrl+C) in the focused window.
//! 3. **Wait** a fixed, configurable delay for the app to write.
//! 4. **Read** the clipboard; anything there now is the fresh selection.
//! 5. **Restore** the saved clipboard on every exit path.
//!
//! Clearing before copying is what separates "the app copied nothing" from
//! "the app copied the same text that was already there".
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use read4me::capture::{EnigoKeystroke, SelectionCapturer, SystemClipboard};
//! use read4me::config::CaptureConfig;
//!
//! let capturer = SelectionCapturer::new(
//!     Arc::new(SystemClipboard),
//!     Arc::new(EnigoKeystroke),
//!     &CaptureConfig::default(),
//! );
//! let selection = capturer.capture_default().expect("capture failed");
//! println!("{:?}", selection.into_text());
//! ```

pub mod clipboard;
pub mod guard;
pub mod keyboard;
pub mod selection;

#[cfg(test)]
pub mod testing;

pub use clipboard::{ClipboardBackend, SystemClipboard};
pub use guard::{ClipboardGuard, ClipboardSnapshot};
pub use keyboard::{EnigoKeystroke, KeystrokeSender};
pub use selection::SelectionCapturer;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures of the clipboard facility.  Always recoverable.
#[derive(Debug, Clone, Error)]
pub enum ClipboardError {
    /// Could not open the system clipboard.
    #[error("cannot access clipboard: {0}")]
    Access(String),

    /// Could not read text from the clipboard.
    #[error("cannot read clipboard text: {0}")]
    Read(String),

    /// Could not write (or clear) the clipboard.
    #[error("cannot write clipboard: {0}")]
    Write(String),
}

/// Errors surfaced by [`SelectionCapturer::capture`].
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The user's clipboard could not be saved, so nothing was touched.
    #[error("clipboard unavailable: {0}")]
    Clipboard(#[from] ClipboardError),

    /// The synthetic copy keystroke could not be delivered.
    #[error("copy keystroke failed: {0}")]
    CaptureFailed(String),
}

// ---------------------------------------------------------------------------
// CapturedSelection
// ---------------------------------------------------------------------------

/// Outcome of one capture: fresh selection text, or nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapturedSelection {
    /// Non-empty text that the foreground app copied during this capture.
    Text(String),
    /// The app wrote nothing (or only whitespace) within the delay window.
    Nothing,
}

impl CapturedSelection {
    /// Classify raw clipboard content read after the copy.
    ///
    /// ```
    /// use read4me::capture::CapturedSelection;
    ///
    /// assert_eq!(CapturedSelection::from_clipboard(None), CapturedSelection::Nothing);
    /// assert_eq!(CapturedSelection::from_clipboard(Some(" \n".into())), CapturedSelection::Nothing);
    /// assert!(CapturedSelection::from_clipboard(Some("hi".into())).is_text());
    /// ```
    pub fn from_clipboard(content: Option<String>) -> Self {
        match content {
            Some(text) if !text.trim().is_empty() => CapturedSelection::Text(text),
            _ => CapturedSelection::Nothing,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, CapturedSelection::Text(_))
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            CapturedSelection::Text(text) => Some(text),
            CapturedSelection::Nothing => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_whitespace_are_nothing() {
        assert_eq!(
            CapturedSelection::from_clipboard(Some(String::new())),
            CapturedSelection::Nothing
        );
        assert_eq!(
            CapturedSelection::from_clipboard(Some("\t  \n".into())),
            CapturedSelection::Nothing
        );
    }

    #[test]
    fn text_is_kept_verbatim() {
        let sel = CapturedSelection::from_clipboard(Some("  Hello world ".into()));
        assert_eq!(sel.into_text().as_deref(), Some("  Hello world "));
    }

    #[test]
    fn clipboard_error_converts_into_capture_error() {
        let err: CaptureError = ClipboardError::Read("busy".into()).into();
        assert!(matches!(err, CaptureError::Clipboard(_)));
        assert!(err.to_string().contains("busy"));
    }
}

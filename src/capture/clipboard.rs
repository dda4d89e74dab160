//! Clipboard access backed by the `arboard` crate.
//!
//! [`ClipboardBackend`] is the narrow contract the capture path needs; the
//! production implementation [`SystemClipboard`] creates a short-lived
//! [`arboard::Clipboard`] handle per call rather than sharing one, because
//! `arboard::Clipboard` is not `Send` on all platforms and the handle is
//! cheap to create.

use arboard::Clipboard;

use super::ClipboardError;

// ---------------------------------------------------------------------------
// ClipboardBackend
// ---------------------------------------------------------------------------

/// Text-only view of the system clipboard.
///
/// Implementations must be `Send + Sync` so they can live behind an
/// `Arc<dyn ClipboardBackend>` shared with the blocking thread pool.
pub trait ClipboardBackend: Send + Sync {
    /// Current plain-text content.
    ///
    /// Returns `Ok(None)` when the clipboard is empty or holds non-text data
    /// (e.g. an image).  Emptiness is never an error.
    fn read_text(&self) -> Result<Option<String>, ClipboardError>;

    /// Replace the clipboard content with `text`.
    fn write_text(&self, text: &str) -> Result<(), ClipboardError>;

    /// Remove all clipboard content.
    fn clear(&self) -> Result<(), ClipboardError>;
}

// ---------------------------------------------------------------------------
// SystemClipboard
// ---------------------------------------------------------------------------

/// The OS clipboard.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClipboard;

impl ClipboardBackend for SystemClipboard {
    fn read_text(&self) -> Result<Option<String>, ClipboardError> {
        let mut clipboard = open_clipboard()?;
        match clipboard.get_text() {
            Ok(text) => Ok(Some(text)),
            Err(arboard::Error::ContentNotAvailable) => Ok(None),
            Err(e) => Err(ClipboardError::Read(e.to_string())),
        }
    }

    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        let mut clipboard = open_clipboard()?;
        clipboard
            .set_text(text)
            .map_err(|e| ClipboardError::Write(e.to_string()))
    }

    fn clear(&self) -> Result<(), ClipboardError> {
        let mut clipboard = open_clipboard()?;
        clipboard
            .clear()
            .map_err(|e| ClipboardError::Write(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// Open an `arboard::Clipboard` handle, mapping the error to [`ClipboardError`].
fn open_clipboard() -> Result<Clipboard, ClipboardError> {
    Clipboard::new().map_err(|e| ClipboardError::Access(e.to_string()))
}

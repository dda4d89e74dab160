//! Scoped save / clear / restore of the clipboard.
//!
//! [`ClipboardGuard::acquire`] snapshots the clipboard and clears it.  The
//! snapshot is written back by [`ClipboardGuard::restore`] or, failing that,
//! by `Drop`.  No exit path of the capture, including a panic, leaves the
//! user's clipboard cleared.

use super::{ClipboardBackend, ClipboardError};

// ---------------------------------------------------------------------------
// ClipboardSnapshot
// ---------------------------------------------------------------------------

/// Clipboard text captured at one instant.  `None` means "no text" (empty
/// clipboard or non-text content such as an image).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardSnapshot(Option<String>);

impl ClipboardSnapshot {
    pub fn text(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn is_absent(&self) -> bool {
        self.0.is_none()
    }
}

// ---------------------------------------------------------------------------
// ClipboardGuard
// ---------------------------------------------------------------------------

/// Owns one [`ClipboardSnapshot`] until it has been restored exactly once.
pub struct ClipboardGuard<'a> {
    clipboard: &'a dyn ClipboardBackend,
    /// `Some` until a restore succeeds.
    snapshot: Option<ClipboardSnapshot>,
    /// Error from the clear in `acquire`, if any.
    clear_error: Option<ClipboardError>,
}

impl<'a> ClipboardGuard<'a> {
    /// Save the current clipboard text, then clear the clipboard.
    ///
    /// # Errors
    ///
    /// Fails only when the clipboard cannot be *read*: the user's data could
    /// not be saved, so the clipboard is left untouched.  A failed clear is
    /// recorded (see [`clear_error`](Self::clear_error)) and the guard is
    /// still returned.
    pub fn acquire(clipboard: &'a dyn ClipboardBackend) -> Result<Self, ClipboardError> {
        let saved = clipboard.read_text()?;

        let clear_error = match clipboard.clear() {
            Ok(()) => None,
            Err(e) => {
                log::warn!("clipboard: clear failed, capture may see stale text: {e}");
                Some(e)
            }
        };

        Ok(Self {
            clipboard,
            snapshot: Some(ClipboardSnapshot(saved)),
            clear_error,
        })
    }

    /// The saved content, while it has not been restored yet.
    pub fn snapshot(&self) -> Option<&ClipboardSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn clear_error(&self) -> Option<&ClipboardError> {
        self.clear_error.as_ref()
    }

    pub fn is_restored(&self) -> bool {
        self.snapshot.is_none()
    }

    /// Write the snapshot back (or clear again if it was absent).
    ///
    /// The snapshot is only consumed once the write succeeds; after a
    /// failure it is kept and `Drop` makes one more attempt.  Calling this
    /// after a successful restore is a no-op.
    pub fn restore(&mut self) -> Result<(), ClipboardError> {
        let Some(snapshot) = self.snapshot.as_ref() else {
            return Ok(());
        };

        let result = match snapshot.text() {
            Some(text) => self.clipboard.write_text(text),
            None => self.clipboard.clear(),
        };

        if result.is_ok() {
            self.snapshot = None;
        }
        result
    }
}

impl Drop for ClipboardGuard<'_> {
    fn drop(&mut self) {
        if self.snapshot.is_none() {
            return;
        }
        if let Err(e) = self.restore() {
            log::error!("clipboard: could not restore original content: {e}");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! [`SelectionCapturer`] — clear → copy → wait → read, with restore.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use super::{
    CaptureError, CapturedSelection, ClipboardBackend, ClipboardGuard, KeystrokeSender,
};
use crate::config::CaptureConfig;

// ---------------------------------------------------------------------------
// SelectionCapturer
// ---------------------------------------------------------------------------

/// Extracts the foreground application's selection through the clipboard.
///
/// Captures are serialized: two overlapping calls never interleave their
/// clear / copy / read / restore sequences.
pub struct SelectionCapturer {
    clipboard: Arc<dyn ClipboardBackend>,
    keystroke: Arc<dyn KeystrokeSender>,
    copy_delay: Duration,
    settle_delay: Duration,
    retry_delay: Duration,
    /// Held for the whole of one capture.
    busy: Mutex<()>,
}

impl SelectionCapturer {
    pub fn new(
        clipboard: Arc<dyn ClipboardBackend>,
        keystroke: Arc<dyn KeystrokeSender>,
        config: &CaptureConfig,
    ) -> Self {
        Self {
            clipboard,
            keystroke,
            copy_delay: config.copy_delay(),
            settle_delay: config.settle_delay(),
            retry_delay: config.retry_delay(),
            busy: Mutex::new(()),
        }
    }

    /// [`capture`](Self::capture) with the configured copy delay.
    pub fn capture_default(&self) -> Result<CapturedSelection, CaptureError> {
        self.capture(self.copy_delay)
    }

    /// Capture the current selection.
    ///
    /// Blocks for roughly `settle_delay + copy_delay` (plus `retry_delay`
    /// when the first read finds nothing).  The user's clipboard is restored
    /// before this returns, whatever the outcome.
    ///
    /// # Errors
    ///
    /// * [`CaptureError::Clipboard`] — the clipboard could not be saved;
    ///   nothing was touched.
    /// * [`CaptureError::CaptureFailed`] — the copy keystroke could not be
    ///   sent; the clipboard has been restored.
    pub fn capture(&self, copy_delay: Duration) -> Result<CapturedSelection, CaptureError> {
        let _busy = self.busy.lock().unwrap_or_else(PoisonError::into_inner);

        let mut guard = ClipboardGuard::acquire(self.clipboard.as_ref())?;

        std::thread::sleep(self.settle_delay);
        self.keystroke.send_copy()?;
        std::thread::sleep(copy_delay);

        let mut selection = self.read_fresh(&guard);
        if !selection.is_text() && !self.retry_delay.is_zero() {
            log::debug!("capture: nothing yet, retrying in {:?}", self.retry_delay);
            std::thread::sleep(self.retry_delay);
            selection = self.read_fresh(&guard);
        }

        if let Err(e) = guard.restore() {
            // The guard keeps the snapshot and retries on drop.
            log::warn!("capture: restore failed, retrying: {e}");
        }

        match &selection {
            CapturedSelection::Text(text) => {
                log::debug!("capture: got {} chars", text.chars().count())
            }
            CapturedSelection::Nothing => log::debug!("capture: nothing selected"),
        }
        Ok(selection)
    }

    /// Read the clipboard and classify it.
    ///
    /// When the clear in `acquire` failed, the clipboard may still hold the
    /// user's old content; anything equal to the snapshot is then stale.
    fn read_fresh(&self, guard: &ClipboardGuard<'_>) -> CapturedSelection {
        let content = match self.clipboard.read_text() {
            Ok(content) => content,
            Err(e) => {
                log::warn!("capture: clipboard read failed: {e}");
                None
            }
        };

        if guard.clear_error().is_some()
            && content.as_deref() == guard.snapshot().and_then(|s| s.text())
        {
            return CapturedSelection::Nothing;
        }

        CapturedSelection::from_clipboard(content)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

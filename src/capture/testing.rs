//! In-memory clipboard and scripted keystroke doubles for unit tests.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};
use std::time::Duration;

use super::{ClipboardBackend, ClipboardError, KeystrokeSender};

// ---------------------------------------------------------------------------
// MemoryClipboard
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MemoryState {
    content: Option<String>,
    /// Every value the clipboard held, in order (initial value first).
    history: Vec<Option<String>>,
    fail_reads: usize,
    fail_writes: usize,
    fail_clears: usize,
}

/// Clipboard double with per-operation failure injection.
#[derive(Default)]
pub struct MemoryClipboard {
    state: Mutex<MemoryState>,
}

impl MemoryClipboard {
    pub fn empty() -> Self {
        let clip = Self::default();
        clip.state.lock().unwrap().history.push(None);
        clip
    }

    pub fn with_text(text: &str) -> Self {
        let clip = Self::default();
        {
            let mut st = clip.state.lock().unwrap();
            st.content = Some(text.to_string());
            st.history.push(Some(text.to_string()));
        }
        clip
    }

    pub fn content(&self) -> Option<String> {
        self.state.lock().unwrap().content.clone()
    }

    /// Set content directly, as another application would.  Never fails.
    pub fn set_content(&self, content: Option<String>) {
        let mut st = self.state.lock().unwrap();
        st.history.push(content.clone());
        st.content = content;
    }

    pub fn history(&self) -> Vec<Option<String>> {
        self.state.lock().unwrap().history.clone()
    }

    pub fn fail_reads(&self, n: usize) {
        self.state.lock().unwrap().fail_reads = n;
    }

    pub fn fail_writes(&self, n: usize) {
        self.state.lock().unwrap().fail_writes = n;
    }

    pub fn fail_clears(&self, n: usize) {
        self.state.lock().unwrap().fail_clears = n;
    }
}

impl ClipboardBackend for MemoryClipboard {
    fn read_text(&self) -> Result<Option<String>, ClipboardError> {
        let mut st = self.state.lock().unwrap();
        if st.fail_reads > 0 {
            st.fail_reads -= 1;
            return Err(ClipboardError::Read("injected read failure".into()));
        }
        Ok(st.content.clone())
    }

    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        let mut st = self.state.lock().unwrap();
        if st.fail_writes > 0 {
            st.fail_writes -= 1;
            return Err(ClipboardError::Write("injected write failure".into()));
        }
        st.content = Some(text.to_string());
        st.history.push(Some(text.to_string()));
        Ok(())
    }

    fn clear(&self) -> Result<(), ClipboardError> {
        let mut st = self.state.lock().unwrap();
        if st.fail_clears > 0 {
            st.fail_clears -= 1;
            return Err(ClipboardError::Write("injected clear failure".into()));
        }
        st.content = None;
        st.history.push(None);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ScriptedKeystroke
// ---------------------------------------------------------------------------

/// Plays the part of the foreground application: on "copy" it writes the
/// configured selection into a [`MemoryClipboard`], optionally after a delay.
pub struct ScriptedKeystroke {
    clipboard: Arc<MemoryClipboard>,
    selection: Mutex<Option<String>>,
    write_after: Duration,
    fail: bool,
    presses: AtomicUsize,
}

impl ScriptedKeystroke {
    /// An app with `selection` highlighted (`None` = nothing selected).
    pub fn new(clipboard: Arc<MemoryClipboard>, selection: Option<&str>) -> Self {
        Self {
            clipboard,
            selection: Mutex::new(selection.map(str::to_string)),
            write_after: Duration::ZERO,
            fail: false,
            presses: AtomicUsize::new(0),
        }
    }

    /// A slow app that writes `write_after` after the keystroke.
    pub fn slow(mut self, write_after: Duration) -> Self {
        self.write_after = write_after;
        self
    }

    /// Keystroke delivery always fails (missing input permission).
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn select(&self, selection: Option<&str>) {
        *self.selection.lock().unwrap() = selection.map(str::to_string);
    }

    pub fn presses(&self) -> usize {
        self.presses.load(Ordering::SeqCst)
    }
}

impl KeystrokeSender for ScriptedKeystroke {
    fn send_copy(&self) -> Result<(), super::CaptureError> {
        if self.fail {
            return Err(super::CaptureError::CaptureFailed(
                "injected keystroke failure".into(),
            ));
        }
        self.presses.fetch_add(1, Ordering::SeqCst);

        let Some(text) = self.selection.lock().unwrap().clone() else {
            return Ok(());
        };

        if self.write_after.is_zero() {
            self.clipboard.set_content(Some(text));
        } else {
            let clipboard = Arc::clone(&self.clipboard);
            let delay = self.write_after;
            std::thread::spawn(move || {
                std::thread::sleep(delay);
                clipboard.set_content(Some(text));
            });
        }
        Ok(())
    }
}

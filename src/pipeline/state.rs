//! Orchestrator phase and shared application state.
//!
//! [`SharedState`] is a type alias for `Arc<Mutex<AppState>>`; the
//! orchestrator mutates it and `main` (or a test) reads it.

use std::sync::{Arc, Mutex};

// ---------------------------------------------------------------------------
// PipelineState
// ---------------------------------------------------------------------------

/// Phase of the speak pipeline.
///
/// ```text
/// Idle ──speak──▶ Capturing ──captured──▶ Idle   (speech runs on its own)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineState {
    /// No capture in flight.
    #[default]
    Idle,
    /// A clipboard capture is waiting for the foreground app.
    Capturing,
}

impl PipelineState {
    pub fn is_busy(&self) -> bool {
        matches!(self, PipelineState::Capturing)
    }

    pub fn label(&self) -> &'static str {
        match self {
            PipelineState::Idle => "Idle",
            PipelineState::Capturing => "Capturing",
        }
    }
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct AppState {
    pub pipeline: PipelineState,
    /// Text of the most recent successful capture.
    pub last_selection: Option<String>,
    /// Most recent recovered error, for display.
    pub last_error: Option<String>,
    /// Captures started so far.
    pub captures: u64,
    /// Speak requests folded into a pending follow-up capture.
    pub coalesced: u64,
}

/// Thread-safe handle to [`AppState`].
///
/// Do **not** hold the lock across `.await` points.
pub type SharedState = Arc<Mutex<AppState>>;

pub fn new_shared_state() -> SharedState {
    Arc::new(Mutex::new(AppState::default()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

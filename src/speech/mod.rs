//! Speech output — single-flight control of an offline TTS process.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │ SpeechController  (Mutex<current session>)                │
//! │   speak(text) ──▶ terminate current ──▶ SpeechEngine::launch
//! │   stop()      ──▶ terminate current                        │
//! │   watcher thread ──▶ try_wait ──▶ Idle on natural exit     │
//! └───────────────────────────┬───────────────────────────────┘
//!                             ▼
//!               CommandEngine (say / espeak-ng child process)
//! ```

pub mod controller;
pub mod engine;
pub mod state;

#[cfg(test)]
pub mod testing;

pub use controller::{SpeakOutcome, SpeakTicket, SpeechController};
pub use engine::{CommandEngine, ProcessExit, SpeechEngine, SpeechProcess, SpeechRequest};
pub use state::{SessionId, SessionStatus, SessionSummary, SpeechState, SpeechStatus};

use thiserror::Error;

/// Errors from the speech subsystem.
#[derive(Debug, Clone, Error)]
pub enum SpeechError {
    /// The TTS engine could not be started (missing binary, bad voice, …).
    #[error("speech engine unavailable: {0}")]
    EngineUnavailable(String),

    /// The TTS process exited abnormally while speaking.
    #[error("speech engine failed: {0}")]
    EngineProcess(String),
}

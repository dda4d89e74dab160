//! Orchestration of hotkey actions into capture and speech.
//!
//! # Architecture
//!
//! ```text
//! HotkeyAction (mpsc)
//!        │
//!        ▼
//! Orchestrator::run()  ← async tokio task
//!        │
//!        ├─ Speak → spawn_blocking(SelectionCapturer::capture)  → Capturing
//!        │            └─ text → spawn_blocking(SpeechController::speak_with_ticket)
//!        │
//!        └─ Stop  → spawn_blocking(SpeechController::stop)
//!
//! SharedState (Arc<Mutex<AppState>>) ←─── last selection, last error, counters
//! ```

pub mod runner;
pub mod state;

pub use runner::{Orchestrator, PipelineError};
pub use state::{new_shared_state, AppState, PipelineState, SharedState};

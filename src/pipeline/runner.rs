//! Orchestrator — turns hotkey actions into capture and speech calls.
//!
//! [`Orchestrator`] owns the [`SharedState`] and responds to
//! [`HotkeyAction`]s received over a `tokio::sync::mpsc` channel.
//!
//! # Flow
//!
//! ```text
//! HotkeyAction::Speak
//!   └─▶ ticket = speech.ticket()
//!       spawn_blocking(capturer.capture)                 [Capturing]
//!         ├─ Text    → spawn_blocking(speak_with_ticket) [Idle]
//!         ├─ Nothing → log only
//!         └─ Err     → log (+ notify when the engine is missing)
//!
//! HotkeyAction::Stop
//!   └─▶ drop any pending follow-up, spawn_blocking(speech.stop)
//! ```
//!
//! Captures and engine shutdown block, so they run on the blocking pool and
//! the loop keeps receiving actions while a capture waits for the
//! foreground application.  A speak that arrives during a capture is
//! coalesced: at most one follow-up capture runs, and the in-flight result
//! is discarded in favour of it.

use std::sync::{Arc, PoisonError};

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::capture::{CaptureError, CapturedSelection, SelectionCapturer};
use crate::config::SpeechConfig;
use crate::hotkey::HotkeyAction;
use crate::notify::Notifier;
use crate::speech::{SpeakOutcome, SpeakTicket, SpeechController, SpeechError};

use super::state::{AppState, PipelineState, SharedState};

// ---------------------------------------------------------------------------
// PipelineError
// ---------------------------------------------------------------------------

/// Errors that surface inside the orchestrator.  None of them are fatal.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("capture failed: {0}")]
    Capture(#[from] CaptureError),

    #[error("speech failed: {0}")]
    Speech(#[from] SpeechError),

    /// A blocking task panicked or was cancelled.
    #[error("internal error: {0}")]
    Internal(String),
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

type CaptureResult = Result<CapturedSelection, CaptureError>;

struct InFlightCapture {
    handle: JoinHandle<CaptureResult>,
    ticket: SpeakTicket,
}

/// Wires the selection capturer to the speech controller.
///
/// Create with [`Orchestrator::new`], then call [`run`](Self::run) inside a
/// tokio task.
pub struct Orchestrator {
    state: SharedState,
    capturer: Arc<SelectionCapturer>,
    speech: Arc<SpeechController>,
    notifier: Arc<dyn Notifier>,
    rate_wpm: u32,
    voice: Option<String>,
}

impl Orchestrator {
    pub fn new(
        state: SharedState,
        capturer: Arc<SelectionCapturer>,
        speech: Arc<SpeechController>,
        notifier: Arc<dyn Notifier>,
        speech_config: &SpeechConfig,
    ) -> Self {
        Self {
            state,
            capturer,
            speech,
            notifier,
            rate_wpm: speech_config.rate_wpm,
            voice: speech_config.voice.clone(),
        }
    }

    // -----------------------------------------------------------------------
    // Main async loop
    // -----------------------------------------------------------------------

    /// Run until `actions` is closed.
    ///
    /// On close the in-flight capture (if any) is allowed to finish so the
    /// clipboard is restored, then speech is stopped.
    pub async fn run(self, mut actions: mpsc::Receiver<HotkeyAction>) {
        let mut in_flight: Option<InFlightCapture> = None;
        let mut pending = false;
        let mut open = true;

        while open || in_flight.is_some() {
            tokio::select! {
                biased;

                action = actions.recv(), if open => match action {
                    Some(HotkeyAction::Speak) => {
                        if in_flight.is_some() {
                            pending = true;
                            self.with_state(|st| st.coalesced += 1);
                            log::debug!("pipeline: speak coalesced into a follow-up capture");
                        } else {
                            in_flight = Some(self.start_capture());
                        }
                    }
                    Some(HotkeyAction::Stop) => {
                        pending = false;
                        self.stop().await;
                    }
                    None => {
                        open = false;
                        // No new keystrokes once shutting down.
                        pending = false;
                        log::info!("pipeline: hotkey channel closed, orchestrator shutting down");
                    }
                },

                joined = join_capture(&mut in_flight) => {
                    let finished = in_flight.take();
                    self.set_pipeline(PipelineState::Idle);

                    if pending {
                        pending = false;
                        log::debug!("pipeline: discarding capture in favour of a newer request");
                        in_flight = Some(self.start_capture());
                        continue;
                    }
                    if let Some(capture) = finished {
                        self.handle_captured(capture.ticket, joined).await;
                    }
                }
            }
        }

        self.stop().await;
    }

    // -----------------------------------------------------------------------
    // Handlers
    // -----------------------------------------------------------------------

    fn start_capture(&self) -> InFlightCapture {
        let ticket = self.speech.ticket();
        self.with_state(|st| {
            st.pipeline = PipelineState::Capturing;
            st.captures += 1;
        });
        log::debug!("pipeline: Speak → Capturing");

        let capturer = Arc::clone(&self.capturer);
        InFlightCapture {
            handle: tokio::task::spawn_blocking(move || capturer.capture_default()),
            ticket,
        }
    }

    async fn handle_captured(
        &self,
        ticket: SpeakTicket,
        joined: Result<CaptureResult, tokio::task::JoinError>,
    ) {
        let text = match joined {
            Ok(Ok(CapturedSelection::Text(text))) => text,
            Ok(Ok(CapturedSelection::Nothing)) => {
                log::info!("pipeline: nothing selected");
                return;
            }
            Ok(Err(e @ CaptureError::CaptureFailed(_))) => {
                // Same outcome as an empty selection, reported separately.
                log::warn!("pipeline: nothing captured, {e}");
                let message = PipelineError::from(e).to_string();
                self.with_state(|st| st.last_error = Some(message));
                return;
            }
            Ok(Err(e)) => {
                self.record_error(e.into());
                return;
            }
            Err(e) => {
                self.record_error(PipelineError::Internal(e.to_string()));
                return;
            }
        };

        log::debug!("pipeline: captured {} chars", text.chars().count());
        self.with_state(|st| st.last_selection = Some(text.clone()));

        let speech = Arc::clone(&self.speech);
        let rate = self.rate_wpm;
        let voice = self.voice.clone();
        let spoken = tokio::task::spawn_blocking(move || {
            speech.speak_with_ticket(ticket, &text, rate, voice.as_deref())
        })
        .await;

        match spoken {
            Ok(Ok(SpeakOutcome::Started(id))) => log::debug!("pipeline: speaking as session {id}"),
            Ok(Ok(SpeakOutcome::Cancelled)) => log::info!("pipeline: speak cancelled by stop"),
            Ok(Ok(SpeakOutcome::Skipped)) => {}
            Ok(Err(e @ SpeechError::EngineUnavailable(_))) => {
                self.notifier.notify(
                    "Speech engine unavailable",
                    &format!("{e}. Install the engine or set speech.program in the config."),
                );
                self.record_error(e.into());
            }
            Ok(Err(e)) => self.record_error(e.into()),
            Err(e) => self.record_error(PipelineError::Internal(e.to_string())),
        }
    }

    async fn stop(&self) {
        let speech = Arc::clone(&self.speech);
        match tokio::task::spawn_blocking(move || speech.stop()).await {
            Ok(true) => log::info!("pipeline: speech stopped"),
            Ok(false) => log::debug!("pipeline: stop while idle"),
            Err(e) => self.record_error(PipelineError::Internal(e.to_string())),
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn with_state(&self, f: impl FnOnce(&mut AppState)) {
        let mut st = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut st);
    }

    fn set_pipeline(&self, state: PipelineState) {
        self.with_state(|st| st.pipeline = state);
    }

    fn record_error(&self, error: PipelineError) {
        log::error!("pipeline error: {error}");
        self.with_state(|st| st.last_error = Some(error.to_string()));
    }
}

/// Resolves when the in-flight capture finishes; pending forever if none.
async fn join_capture(
    in_flight: &mut Option<InFlightCapture>,
) -> Result<CaptureResult, tokio::task::JoinError> {
    match in_flight {
        Some(capture) => (&mut capture.handle).await,
        None => std::future::pending().await,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

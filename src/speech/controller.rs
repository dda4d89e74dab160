//! [`SpeechController`] — single-flight ownership of the speech process.
//!
//! All reads and writes of the current session happen under one `Mutex`.
//! `speak` terminates any running session before launching the next one
//! (supersession), and `stop` is idempotent.
//!
//! # Stop always wins
//!
//! Every `stop` advances a *stop epoch*.  The orchestrator takes a
//! [`SpeakTicket`] when a speak request is dispatched (before the capture
//! delay) and launches with [`SpeechController::speak_with_ticket`]; if a
//! stop landed in between, the ticket is stale and nothing is launched.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use super::engine::{ProcessExit, SpeechEngine, SpeechProcess, SpeechRequest};
use super::state::{SessionId, SessionStatus, SessionSummary, SpeechState, SpeechStatus};
use super::SpeechError;

/// How often a terminating or watched process is polled for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Stop epoch observed when a speak request was dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeakTicket(u64);

/// Result of a successful `speak` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeakOutcome {
    /// A new engine process is speaking.
    Started(SessionId),
    /// The text was empty after trimming; nothing changed.
    Skipped,
    /// A stop arrived after the request was dispatched; nothing launched.
    Cancelled,
}

// ---------------------------------------------------------------------------
// Internal state
// ---------------------------------------------------------------------------

struct ActiveSession {
    id: SessionId,
    process: Box<dyn SpeechProcess>,
}

#[derive(Default)]
struct Inner {
    state: SpeechState,
    current: Option<ActiveSession>,
    next_id: u64,
    stop_epoch: u64,
    last: Option<SessionSummary>,
}

impl Inner {
    /// Reap session `id` if its process has exited on its own.
    ///
    /// Returns `true` once there is nothing left to watch for `id`.
    fn poll_exit(&mut self, id: SessionId) -> bool {
        let Some(session) = self.current.as_mut().filter(|s| s.id == id) else {
            return true;
        };

        let exit = match session.process.try_wait() {
            Ok(None) => return false,
            Ok(Some(exit)) => Some(exit),
            Err(e) => {
                log::warn!("speech: cannot poll session {id}: {e}");
                None
            }
        };

        match exit {
            Some(exit) if !exit.success => log::warn!(
                "speech: {}",
                SpeechError::EngineProcess(format!("session {id} exited with {:?}", exit.code))
            ),
            _ => log::info!("speech: session {id} finished"),
        }

        self.current = None;
        self.state = SpeechState::Idle;
        self.last = Some(SessionSummary {
            id,
            status: SessionStatus::Completed,
            exit,
        });
        true
    }
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// SpeechController
// ---------------------------------------------------------------------------

/// Owns at most one running speech engine process.
///
/// Share it behind an `Arc`; every method takes `&self`.
pub struct SpeechController {
    engine: Arc<dyn SpeechEngine>,
    inner: Arc<Mutex<Inner>>,
    grace: Duration,
}

impl SpeechController {
    /// * `engine` — launches the TTS processes.
    /// * `grace`  — how long a terminated process may take to exit before
    ///   it is killed.
    pub fn new(engine: Arc<dyn SpeechEngine>, grace: Duration) -> Self {
        Self {
            engine,
            inner: Arc::new(Mutex::new(Inner::default())),
            grace,
        }
    }

    /// Ticket for a speak request dispatched now.
    pub fn ticket(&self) -> SpeakTicket {
        SpeakTicket(lock(&self.inner).stop_epoch)
    }

    /// Speak `text`, superseding any running session.
    pub fn speak(
        &self,
        text: &str,
        rate_wpm: u32,
        voice: Option<&str>,
    ) -> Result<SpeakOutcome, SpeechError> {
        self.speak_with_ticket(self.ticket(), text, rate_wpm, voice)
    }

    /// Speak `text` unless a `stop` happened after `ticket` was taken.
    ///
    /// # Errors
    ///
    /// [`SpeechError::EngineUnavailable`] if the engine cannot be launched;
    /// the controller is then `Idle` (any previous session has already been
    /// terminated).
    pub fn speak_with_ticket(
        &self,
        ticket: SpeakTicket,
        text: &str,
        rate_wpm: u32,
        voice: Option<&str>,
    ) -> Result<SpeakOutcome, SpeechError> {
        let text = text.trim();
        if text.is_empty() {
            log::info!("speech: no text to speak");
            return Ok(SpeakOutcome::Skipped);
        }

        let mut inner = lock(&self.inner);
        if inner.stop_epoch != ticket.0 {
            log::info!("speech: request cancelled by a later stop");
            return Ok(SpeakOutcome::Cancelled);
        }

        self.end_current(&mut inner, SessionStatus::Stopped);

        let request = SpeechRequest {
            text: text.to_string(),
            rate_wpm,
            voice: voice.map(str::to_string),
        };
        let process = match self.engine.launch(&request) {
            Ok(process) => process,
            Err(e) => {
                inner.state = SpeechState::Idle;
                log::error!("speech: {e}");
                return Err(e);
            }
        };

        inner.next_id += 1;
        let id = SessionId(inner.next_id);
        log::info!(
            "speech: session {id} started with {} (pid {}, {} chars)",
            self.engine.name(),
            process.id(),
            text.chars().count()
        );
        inner.current = Some(ActiveSession { id, process });
        inner.state = SpeechState::Running;
        drop(inner);

        self.spawn_watcher(id);
        Ok(SpeakOutcome::Started(id))
    }

    /// Stop speaking.  Returns `true` if a session was running.
    ///
    /// Calling this while idle is a no-op (apart from invalidating
    /// outstanding tickets).
    pub fn stop(&self) -> bool {
        let mut inner = lock(&self.inner);
        inner.stop_epoch += 1;

        if inner.current.is_none() {
            log::debug!("speech: stop while idle");
            return false;
        }
        self.end_current(&mut inner, SessionStatus::Stopped);
        true
    }

    pub fn status(&self) -> SpeechStatus {
        let mut inner = lock(&self.inner);
        if let Some(id) = inner.current.as_ref().map(|s| s.id) {
            inner.poll_exit(id);
        }
        SpeechStatus {
            state: inner.state,
            current: inner.current.as_ref().map(|s| s.id),
            last: inner.last.clone(),
        }
    }

    pub fn is_speaking(&self) -> bool {
        self.status().state == SpeechState::Running
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Terminate the current session (if any) and record it as `status`.
    fn end_current(&self, inner: &mut Inner, status: SessionStatus) {
        let Some(mut session) = inner.current.take() else {
            return;
        };

        inner.state = SpeechState::Stopping;
        let exit = shut_down(session.process.as_mut(), self.grace);
        log::info!("speech: session {} stopped", session.id);

        inner.last = Some(SessionSummary {
            id: session.id,
            status,
            exit,
        });
        inner.state = SpeechState::Idle;
    }

    /// Watch session `id` for natural exit on a background thread.
    fn spawn_watcher(&self, id: SessionId) {
        let inner = Arc::clone(&self.inner);
        let spawned = thread::Builder::new()
            .name(format!("speech-watch-{}", id.0))
            .spawn(move || loop {
                thread::sleep(POLL_INTERVAL);
                if lock(&inner).poll_exit(id) {
                    break;
                }
            });

        if let Err(e) = spawned {
            // `status()` still reaps the session when polled.
            log::warn!("speech: cannot spawn exit watcher for {id}: {e}");
        }
    }
}

impl Drop for SpeechController {
    fn drop(&mut self) {
        let mut inner = lock(&self.inner);
        self.end_current(&mut inner, SessionStatus::Stopped);
    }
}

/// Graceful terminate, wait up to `grace`, then kill and reap.
fn shut_down(process: &mut dyn SpeechProcess, grace: Duration) -> Option<ProcessExit> {
    if let Ok(Some(exit)) = process.try_wait() {
        return Some(exit);
    }

    if let Err(e) = process.terminate(true) {
        log::warn!("speech: graceful terminate of pid {} failed: {e}", process.id());
    }

    let deadline = Instant::now() + grace;
    loop {
        match process.try_wait() {
            Ok(Some(exit)) => return Some(exit),
            Ok(None) => {}
            Err(e) => log::warn!("speech: cannot poll pid {}: {e}", process.id()),
        }
        if Instant::now() >= deadline {
            break;
        }
        thread::sleep(POLL_INTERVAL);
    }

    log::warn!(
        "speech: pid {} ignored termination for {:?}, killing",
        process.id(),
        grace
    );
    if let Err(e) = process.terminate(false) {
        log::warn!("speech: kill of pid {} failed: {e}", process.id());
    }
    match process.wait() {
        Ok(exit) => Some(exit),
        Err(e) => {
            log::error!("speech: cannot reap pid {}: {e}", process.id());
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

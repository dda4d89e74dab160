//! Speech state machine types.
//!
//! [`SpeechState`] is the controller's state; [`SessionStatus`] is the
//! lifecycle of one [`SessionId`].  [`SpeechStatus`] is the snapshot handed
//! out by `SpeechController::status`.

use std::fmt;

use super::engine::ProcessExit;

// ---------------------------------------------------------------------------
// SpeechState
// ---------------------------------------------------------------------------

/// States of the speech controller.
///
/// ```text
/// Idle ──speak──▶ Running ──natural exit──▶ Idle
///                    │
///                    ├──stop──▶ Stopping ──process gone──▶ Idle
///                    └──speak─▶ Stopping ──process gone──▶ Running (new session)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpeechState {
    /// No engine process exists.
    #[default]
    Idle,
    /// Exactly one engine process is speaking.
    Running,
    /// The current engine process is being terminated.
    Stopping,
}

impl SpeechState {
    /// ```
    /// use read4me::speech::SpeechState;
    ///
    /// assert!(!SpeechState::Idle.is_busy());
    /// assert!(SpeechState::Running.is_busy());
    /// assert!(SpeechState::Stopping.is_busy());
    /// ```
    pub fn is_busy(&self) -> bool {
        !matches!(self, SpeechState::Idle)
    }

    pub fn label(&self) -> &'static str {
        match self {
            SpeechState::Idle => "Idle",
            SpeechState::Running => "Speaking",
            SpeechState::Stopping => "Stopping",
        }
    }
}

// ---------------------------------------------------------------------------
// SessionId / SessionStatus
// ---------------------------------------------------------------------------

/// Monotonically increasing identifier of one engine invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Running,
    /// Terminated by `stop` or superseded by a newer `speak`.
    Stopped,
    /// The engine exited on its own (successfully or not).
    Completed,
}

/// What is known about a session once it has ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub id: SessionId,
    pub status: SessionStatus,
    /// `None` when the exit status could not be collected.
    pub exit: Option<ProcessExit>,
}

// ---------------------------------------------------------------------------
// SpeechStatus
// ---------------------------------------------------------------------------

/// Point-in-time view of the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechStatus {
    pub state: SpeechState,
    /// The running session, if any.
    pub current: Option<SessionId>,
    /// The most recently ended session.
    pub last: Option<SessionSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_idle() {
        assert_eq!(SpeechState::default(), SpeechState::Idle);
    }

    #[test]
    fn labels() {
        assert_eq!(SpeechState::Idle.label(), "Idle");
        assert_eq!(SpeechState::Running.label(), "Speaking");
        assert_eq!(SpeechState::Stopping.label(), "Stopping");
    }

    #[test]
    fn session_ids_order_and_display() {
        assert!(SessionId(2) > SessionId(1));
        assert_eq!(SessionId(7).to_string(), "#7");
    }
}

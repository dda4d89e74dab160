//! Speech engine process lifecycle.
//!
//! # Overview
//!
//! [`SpeechEngine`] launches one text-to-speech process per request and
//! hands back a [`SpeechProcess`] handle.  The controller only ever talks to
//! these two traits, so a different backend can be dropped in without
//! touching its state machine.
//!
//! [`CommandEngine`] is the production implementation: it runs `say` or
//! `espeak-ng` and writes the text to the child's stdin, which avoids any
//! argument length or quoting limits.

use std::io::{self, Write};
use std::process::{Child, Command, ExitStatus, Stdio};

use super::SpeechError;
use crate::config::{SpeechBackend, SpeechConfig};

// ---------------------------------------------------------------------------
// Request / exit types
// ---------------------------------------------------------------------------

/// Everything the engine needs to speak one piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechRequest {
    pub text: String,
    pub rate_wpm: u32,
    pub voice: Option<String>,
}

/// How an engine process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessExit {
    pub success: bool,
    /// `None` when the process was ended by a signal.
    pub code: Option<i32>,
}

impl From<ExitStatus> for ProcessExit {
    fn from(status: ExitStatus) -> Self {
        Self {
            success: status.success(),
            code: status.code(),
        }
    }
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Handle to one running engine process.
pub trait SpeechProcess: Send {
    /// OS process id (or a synthetic id for test doubles).
    fn id(&self) -> u32;

    /// Non-blocking exit check.  Returns `Ok(Some(_))` once the process has
    /// exited and been reaped.
    fn try_wait(&mut self) -> io::Result<Option<ProcessExit>>;

    /// Ask the process to exit (`graceful`, SIGTERM on Unix) or force it
    /// (SIGKILL).
    fn terminate(&mut self, graceful: bool) -> io::Result<()>;

    /// Block until the process has exited.
    fn wait(&mut self) -> io::Result<ProcessExit>;
}

/// Launches speech processes.
pub trait SpeechEngine: Send + Sync {
    /// Short name for logs (e.g. `"say"`).
    fn name(&self) -> &str;

    /// Start speaking `request`.
    ///
    /// # Errors
    ///
    /// [`SpeechError::EngineUnavailable`] when the process cannot be started
    /// or does not accept the text.
    fn launch(&self, request: &SpeechRequest) -> Result<Box<dyn SpeechProcess>, SpeechError>;
}

// ---------------------------------------------------------------------------
// CommandEngine
// ---------------------------------------------------------------------------

/// Runs an offline TTS command line tool.
#[derive(Debug, Clone)]
pub struct CommandEngine {
    backend: SpeechBackend,
    program: String,
}

impl CommandEngine {
    pub fn new(backend: SpeechBackend) -> Self {
        let program = match backend {
            SpeechBackend::Say => "say",
            SpeechBackend::EspeakNg => "espeak-ng",
        };
        Self {
            backend,
            program: program.to_string(),
        }
    }

    /// Build from config, honouring a `program` override.
    pub fn from_config(config: &SpeechConfig) -> Self {
        let mut engine = Self::new(config.backend);
        if let Some(program) = &config.program {
            engine.program = program.clone();
        }
        engine
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Command line arguments for `request` (the text itself goes to stdin).
    pub fn args(&self, request: &SpeechRequest) -> Vec<String> {
        let rate_flag = match self.backend {
            SpeechBackend::Say => "-r",
            SpeechBackend::EspeakNg => "-s",
        };

        let mut args = vec![rate_flag.to_string(), request.rate_wpm.to_string()];
        if let Some(voice) = request.voice.as_deref().filter(|v| !v.is_empty()) {
            args.push("-v".into());
            args.push(voice.to_string());
        }
        if self.backend == SpeechBackend::EspeakNg {
            args.push("--stdin".into());
        }
        args
    }
}

impl SpeechEngine for CommandEngine {
    fn name(&self) -> &str {
        &self.program
    }

    fn launch(&self, request: &SpeechRequest) -> Result<Box<dyn SpeechProcess>, SpeechError> {
        let mut child = Command::new(&self.program)
            .args(self.args(request))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .spawn()
            .map_err(|e| SpeechError::EngineUnavailable(format!("{}: {e}", self.program)))?;

        // Dropping stdin after the write closes it, which tells the engine
        // the text is complete.
        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = stdin.write_all(request.text.as_bytes()) {
                let _ = child.kill();
                let _ = child.wait();
                return Err(SpeechError::EngineUnavailable(format!(
                    "{} rejected input: {e}",
                    self.program
                )));
            }
        }

        Ok(Box::new(ChildProcess { child }))
    }
}

// ---------------------------------------------------------------------------
// ChildProcess
// ---------------------------------------------------------------------------

/// [`SpeechProcess`] over a `std::process::Child`.
struct ChildProcess {
    child: Child,
}

impl SpeechProcess for ChildProcess {
    fn id(&self) -> u32 {
        self.child.id()
    }

    fn try_wait(&mut self) -> io::Result<Option<ProcessExit>> {
        Ok(self.child.try_wait()?.map(ProcessExit::from))
    }

    fn terminate(&mut self, graceful: bool) -> io::Result<()> {
        if graceful {
            send_sigterm(&self.child)
        } else {
            self.child.kill()
        }
    }

    fn wait(&mut self) -> io::Result<ProcessExit> {
        Ok(self.child.wait()?.into())
    }
}

#[cfg(unix)]
fn send_sigterm(child: &Child) -> io::Result<()> {
    let pid = libc::pid_t::try_from(child.id())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"))?;
    // SAFETY: plain kill(2) on a pid we own and have not reaped yet.
    let rc = unsafe { libc::kill(pid, libc::SIGTERM) };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

/// No polite termination signal exists here; the grace window still applies
/// to engines that already finished.
#[cfg(not(unix))]
fn send_sigterm(_child: &Child) -> io::Result<()> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

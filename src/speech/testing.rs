//! Fake speech engine for unit tests.
//!
//! Tracks how many fake processes are alive at once, so single-flight can be
//! asserted directly.

use std::collections::HashMap;
use std::io;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};
use std::time::{Duration, Instant};

use super::engine::{ProcessExit, SpeechEngine, SpeechProcess, SpeechRequest};
use super::SpeechError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeEvent {
    Launched { pid: u32, text: String },
    Terminated { pid: u32, graceful: bool },
    Reaped { pid: u32 },
}

#[derive(Default)]
struct FakeState {
    requests: Vec<SpeechRequest>,
    events: Vec<FakeEvent>,
    alive: usize,
    max_alive: usize,
    next_pid: u32,
    /// Exit status each pid will report once it is gone.
    exits: HashMap<u32, ProcessExit>,
}

/// Engine double.  Clones share state.
#[derive(Clone, Default)]
pub struct FakeEngine {
    state: Arc<Mutex<FakeState>>,
    unavailable: Arc<AtomicBool>,
    ignore_graceful: Arc<AtomicBool>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every launch fails with `EngineUnavailable` while set.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Processes launched from now on ignore SIGTERM.
    pub fn set_ignore_graceful(&self, ignore: bool) {
        self.ignore_graceful.store(ignore, Ordering::SeqCst);
    }

    pub fn launched_texts(&self) -> Vec<String> {
        let st = self.state.lock().unwrap();
        st.requests.iter().map(|r| r.text.clone()).collect()
    }

    pub fn requests(&self) -> Vec<SpeechRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn events(&self) -> Vec<FakeEvent> {
        self.state.lock().unwrap().events.clone()
    }

    pub fn alive(&self) -> usize {
        self.state.lock().unwrap().alive
    }

    pub fn max_alive(&self) -> usize {
        self.state.lock().unwrap().max_alive
    }

    /// Make the most recently launched process exit on its own.
    pub fn finish_latest(&self, success: bool) {
        let mut st = self.state.lock().unwrap();
        let pid = st.next_pid;
        st.exits.insert(
            pid,
            ProcessExit {
                success,
                code: Some(if success { 0 } else { 1 }),
            },
        );
    }
}

impl SpeechEngine for FakeEngine {
    fn name(&self) -> &str {
        "fake"
    }

    fn launch(&self, request: &SpeechRequest) -> Result<Box<dyn SpeechProcess>, SpeechError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(SpeechError::EngineUnavailable("fake engine offline".into()));
        }

        let mut st = self.state.lock().unwrap();
        st.next_pid += 1;
        let pid = st.next_pid;
        st.alive += 1;
        st.max_alive = st.max_alive.max(st.alive);
        st.requests.push(request.clone());
        st.events.push(FakeEvent::Launched {
            pid,
            text: request.text.clone(),
        });

        Ok(Box::new(FakeProcess {
            pid,
            state: Arc::clone(&self.state),
            ignore_graceful: self.ignore_graceful.load(Ordering::SeqCst),
            reaped: None,
        }))
    }
}

struct FakeProcess {
    pid: u32,
    state: Arc<Mutex<FakeState>>,
    ignore_graceful: bool,
    reaped: Option<ProcessExit>,
}

impl FakeProcess {
    fn reap(&mut self, st: &mut FakeState, exit: ProcessExit) -> ProcessExit {
        if self.reaped.is_none() {
            st.alive -= 1;
            st.events.push(FakeEvent::Reaped { pid: self.pid });
            self.reaped = Some(exit);
        }
        exit
    }
}

impl SpeechProcess for FakeProcess {
    fn id(&self) -> u32 {
        self.pid
    }

    fn try_wait(&mut self) -> io::Result<Option<ProcessExit>> {
        if let Some(exit) = self.reaped {
            return Ok(Some(exit));
        }
        let state = Arc::clone(&self.state);
        let mut st = state.lock().unwrap();
        match st.exits.get(&self.pid).copied() {
            Some(exit) => Ok(Some(self.reap(&mut st, exit))),
            None => Ok(None),
        }
    }

    fn terminate(&mut self, graceful: bool) -> io::Result<()> {
        let mut st = self.state.lock().unwrap();
        st.events.push(FakeEvent::Terminated {
            pid: self.pid,
            graceful,
        });
        if graceful && self.ignore_graceful {
            return Ok(());
        }
        st.exits.entry(self.pid).or_insert(ProcessExit {
            success: false,
            code: None,
        });
        Ok(())
    }

    fn wait(&mut self) -> io::Result<ProcessExit> {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(exit) = self.try_wait()? {
                return Ok(exit);
            }
            if Instant::now() > deadline {
                return Err(io::Error::new(io::ErrorKind::TimedOut, "fake never exited"));
            }
            std::thread::sleep(Duration::from_millis(5));
        }
    }
}

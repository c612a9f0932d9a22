//! Reference interpreter runtime.
//!
//! Engine executes scripts, one process per thread, grouped into sessions. Every process
//! calls a debugger safe point before each statement.

mod process;
pub mod script;
mod session;

pub use process::ScriptProcess;
pub use script::Script;
pub use session::{ScriptSession, Worker};

use crate::debugger::command::Resolver;
use crate::debugger::{Process, ProcessId, Session, SessionId};
use indexmap::IndexMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("line {line}: {message}")]
    Parse { line: i32, message: String },
    #[error("unknown function `{0}`")]
    UnknownFunction(String),
    #[error("unknown variable `{0}`")]
    UnknownVariable(String),
    #[error("line {0} not found in current block")]
    LineNotFound(i32),
    #[error("type mismatch: {0} and {1}")]
    TypeMismatch(&'static str, &'static str),
    #[error("integer overflow")]
    Overflow,
    #[error("interpreter panic: {0}")]
    Panic(String),
    #[error("unhandled error: {0}")]
    Failed(String),
    #[error("process cancelled")]
    Cancelled,
    #[error(transparent)]
    IO(#[from] std::io::Error),
}

/// Receiver of lines printed by scripts.
pub type OutputSink = Arc<dyn Fn(ProcessId, &str) + Send + Sync>;

/// Registry of sessions.
pub struct Engine {
    sid_gen: AtomicU32,
    pid_gen: Arc<AtomicU32>,
    sessions: Mutex<IndexMap<SessionId, Arc<ScriptSession>>>,
    sink: Option<OutputSink>,
}

impl Engine {
    pub fn new() -> Arc<Self> {
        Self::build(None)
    }

    /// Create an engine, every process of this engine sends printed lines into `sink`.
    pub fn with_output(sink: OutputSink) -> Arc<Self> {
        Self::build(Some(sink))
    }

    fn build(sink: Option<OutputSink>) -> Arc<Self> {
        Arc::new(Self {
            sid_gen: AtomicU32::new(1),
            pid_gen: Arc::new(AtomicU32::new(1)),
            sessions: Mutex::default(),
            sink,
        })
    }

    fn sessions_map(&self) -> MutexGuard<'_, IndexMap<SessionId, Arc<ScriptSession>>> {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn create_session(&self) -> Arc<ScriptSession> {
        let sid = SessionId(self.sid_gen.fetch_add(1, Ordering::SeqCst));
        let session = Arc::new(ScriptSession::new(sid, self.pid_gen.clone(), self.sink.clone()));
        self.sessions_map().insert(sid, session.clone());
        session
    }

    /// Close a session: stop its debugger and cancel its processes.
    pub fn close_session(&self, sid: SessionId) {
        let Some(session) = self.sessions_map().shift_remove(&sid) else {
            return;
        };
        // debugger may be already stopped
        let _ = session.stop_debugger();
        session
            .script_processes()
            .iter()
            .for_each(|process| process.cancel());
    }

    pub fn session(&self, sid: SessionId) -> Option<Arc<ScriptSession>> {
        self.sessions_map().get(&sid).cloned()
    }

    pub fn sessions(&self) -> Vec<Arc<ScriptSession>> {
        self.sessions_map().values().cloned().collect()
    }

    /// Find process in all sessions.
    pub fn process(&self, pid: ProcessId) -> Option<Arc<ScriptProcess>> {
        self.sessions()
            .into_iter()
            .find_map(|session| session.process(pid))
    }
}

impl Resolver for Engine {
    fn process(&self, pid: ProcessId) -> Option<Arc<dyn Process>> {
        Engine::process(self, pid).map(|p| p as Arc<dyn Process>)
    }

    fn session(&self, sid: SessionId) -> Option<Arc<dyn Session>> {
        Engine::session(self, sid).map(|s| s as Arc<dyn Session>)
    }
}

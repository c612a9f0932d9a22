//! Text commands of the console.
//!
//! Every command (except of a session and process management ones) maps to a single
//! handler from [`crate::debugger::command`].

pub mod parser;

use crate::debugger::command::{attach, pause, policy, r#break, status};
use crate::debugger::{Error, ProcessId, SessionId};

#[derive(thiserror::Error, Debug)]
pub enum CommandError {
    #[error("malformed command: {0}")]
    Parsing(String),
    #[error(transparent)]
    Handle(#[from] Error),
    #[error(transparent)]
    Runtime(#[from] crate::runtime::RuntimeError),
}

pub type CommandResult<T> = Result<T, CommandError>;

/// External commands that can be processed by the console.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Start a debugger for the console session.
    Start,
    /// Stop the debugger.
    Stop,
    Policy(policy::Command),
    Status(status::Command),
    Attach(attach::Command),
    Breakpoint(r#break::Command),
    Pause(pause::Command),
    Continue,
    StepOver(ProcessId),
    StepInto(ProcessId),
    Backtrace(ProcessId),
    Stack(ProcessId, usize),
    /// Create a new interpreter session.
    NewSession,
    /// Execute loaded scripts (all or one by name), optionally in another session.
    Run {
        script: Option<String>,
        session: Option<SessionId>,
    },
    SkipInput,
    Help {
        command: Option<String>,
        reason: Option<String>,
    },
}

use crate::debugger::{Debugger, ProcessSnapshot, SessionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Processes,
    Sessions,
}

pub enum ExecutionResult {
    Processes(Vec<ProcessSnapshot>),
    Sessions(Vec<SessionId>),
}

/// Attached processes and sessions.
pub struct Status<'a> {
    dbg: &'a Debugger,
}

impl<'a> Status<'a> {
    pub fn new(debugger: &'a Debugger) -> Self {
        Self { dbg: debugger }
    }

    pub fn handle(&self, cmd: Command) -> ExecutionResult {
        match cmd {
            Command::Processes => ExecutionResult::Processes(self.dbg.processes()),
            Command::Sessions => ExecutionResult::Sessions(self.dbg.sessions()),
        }
    }
}

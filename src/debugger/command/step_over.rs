use crate::debugger::command::HandleResult;
use crate::debugger::{Debugger, ProcessId};

/// Step a process over its current statement. Other parked processes are resumed too.
pub struct StepOver<'a> {
    dbg: &'a Debugger,
}

impl<'a> StepOver<'a> {
    pub fn new(debugger: &'a Debugger) -> Self {
        Self { dbg: debugger }
    }

    pub fn handle(&self, pid: ProcessId) -> HandleResult<()> {
        self.dbg.step_over(pid)
    }
}

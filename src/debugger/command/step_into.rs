use crate::debugger::command::HandleResult;
use crate::debugger::{Debugger, ProcessId};

/// Step a process into its current statement. Other parked processes are resumed too.
pub struct StepInto<'a> {
    dbg: &'a Debugger,
}

impl<'a> StepInto<'a> {
    pub fn new(debugger: &'a Debugger) -> Self {
        Self { dbg: debugger }
    }

    pub fn handle(&self, pid: ProcessId) -> HandleResult<()> {
        self.dbg.step_into(pid)
    }
}

use crate::debugger::command::HandleResult;
use crate::debugger::{Debugger, ProcessId, StackVariable};

/// Variables of a frame window of a paused process.
pub struct Stack<'a> {
    dbg: &'a Debugger,
}

impl<'a> Stack<'a> {
    pub fn new(debugger: &'a Debugger) -> Self {
        Self { dbg: debugger }
    }

    pub fn handle(&self, pid: ProcessId, window: usize) -> HandleResult<Vec<StackVariable>> {
        self.dbg.stack(pid, window)
    }
}

use crate::debugger::command::HandleResult;
use crate::debugger::{CallStack, Debugger, ProcessId};

/// Call stack of a paused process.
pub struct Backtrace<'a> {
    dbg: &'a Debugger,
}

impl<'a> Backtrace<'a> {
    pub fn new(debugger: &'a Debugger) -> Self {
        Self { dbg: debugger }
    }

    pub fn handle(&self, pid: ProcessId) -> HandleResult<CallStack> {
        self.dbg.call_stack(pid)
    }
}

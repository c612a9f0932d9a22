use crate::debugger::command::HandleResult;
use crate::debugger::{Debugger, Error};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Request a pause, don't wait for it.
    Request,
    /// Request a pause and wait until debugger is paused.
    RequestAndWait,
    /// Wait until some process breaks. Fails right away if no pause is requested and
    /// there is no running process.
    WaitForBreak,
}

pub struct Pause<'a> {
    dbg: &'a Debugger,
}

impl<'a> Pause<'a> {
    pub fn new(debugger: &'a Debugger) -> Self {
        Self { dbg: debugger }
    }

    /// Handle command, `yield_hook` is called while waiting for the pause.
    pub fn handle(&self, cmd: Command, yield_hook: impl FnMut()) -> HandleResult<()> {
        match cmd {
            Command::Request => {
                self.dbg.pause();
                Ok(())
            }
            Command::RequestAndWait => {
                self.dbg.pause();
                self.dbg.wait_for_pause(yield_hook)
            }
            Command::WaitForBreak => {
                if !self.dbg.is_pause_requested() && self.dbg.running_count() == 0 {
                    return Err(Error::NothingToWait);
                }
                self.dbg.wait_for_pause(yield_hook)
            }
        }
    }
}

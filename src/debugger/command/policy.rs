use crate::debugger::Debugger;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    BreakOnException(bool),
    BreakOnStart(bool),
}

/// Change debugger break policies.
pub struct Policy<'a> {
    dbg: &'a Debugger,
}

impl<'a> Policy<'a> {
    pub fn new(debugger: &'a Debugger) -> Self {
        Self { dbg: debugger }
    }

    pub fn handle(&self, cmd: Command) {
        match cmd {
            Command::BreakOnException(value) => self.dbg.set_break_on_exception(value),
            Command::BreakOnStart(value) => self.dbg.set_break_on_start(value),
        }
    }
}

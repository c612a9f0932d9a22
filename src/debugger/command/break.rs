use crate::debugger::{Breakpoint, Debugger};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Add a breakpoint or remove the same one.
    Toggle(Breakpoint),
    Info,
}

pub enum ExecutionResult {
    New(Breakpoint),
    Removed(Breakpoint),
    Dump(Vec<Breakpoint>),
}

pub struct Break<'a> {
    dbg: &'a Debugger,
}

impl<'a> Break<'a> {
    pub fn new(debugger: &'a Debugger) -> Self {
        Self { dbg: debugger }
    }

    pub fn handle(&self, cmd: &Command) -> ExecutionResult {
        match cmd {
            Command::Toggle(brkpt) => {
                let added =
                    self.dbg
                        .toggle_breakpoint(&brkpt.locator, brkpt.line, brkpt.line_pos);
                if added {
                    ExecutionResult::New(brkpt.clone())
                } else {
                    ExecutionResult::Removed(brkpt.clone())
                }
            }
            Command::Info => ExecutionResult::Dump(self.dbg.breakpoints()),
        }
    }
}

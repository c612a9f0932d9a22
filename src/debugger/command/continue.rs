use crate::debugger::Debugger;

/// Resume all parked processes.
pub struct Continue<'a> {
    dbg: &'a Debugger,
}

impl<'a> Continue<'a> {
    pub fn new(debugger: &'a Debugger) -> Self {
        Self { dbg: debugger }
    }

    pub fn handle(&self) {
        self.dbg.run()
    }
}

use crate::debugger::command::{HandleResult, Resolver};
use crate::debugger::{Debugger, Error, ProcessId, SessionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    AttachProcess(ProcessId),
    DetachProcess(ProcessId),
    AttachSession(SessionId),
    DetachSession(SessionId),
}

/// Attach or detach processes and sessions by their identifiers.
pub struct Attach<'a, R: Resolver + ?Sized> {
    dbg: &'a Debugger,
    resolver: &'a R,
}

impl<'a, R: Resolver + ?Sized> Attach<'a, R> {
    pub fn new(debugger: &'a Debugger, resolver: &'a R) -> Self {
        Self {
            dbg: debugger,
            resolver,
        }
    }

    pub fn handle(&self, cmd: Command) -> HandleResult<()> {
        match cmd {
            Command::AttachProcess(pid) => {
                let process = self
                    .resolver
                    .process(pid)
                    .ok_or(Error::ProcessNotFound(pid))?;
                self.dbg.attach(process);
            }
            Command::DetachProcess(pid) => {
                if !self.dbg.is_attached(pid) {
                    return Err(Error::ProcessNotAttached(pid));
                }
                self.dbg.detach(pid);
            }
            Command::AttachSession(sid) => {
                let session = self
                    .resolver
                    .session(sid)
                    .ok_or(Error::SessionNotFound(sid))?;
                self.dbg.attach_session(session);
            }
            Command::DetachSession(sid) => {
                if !self.dbg.is_session_attached(sid) {
                    return Err(Error::SessionNotFound(sid));
                }
                self.dbg.detach_session(sid);
            }
        }
        Ok(())
    }
}

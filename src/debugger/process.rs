//! Capabilities that a debugger requires from interpreter processes and sessions.
//!
//! Processes and sessions are owned by the interpreter; a debugger only keeps shared
//! references to them and identifies them by [`ProcessId`] and [`SessionId`].

use crate::debugger::introspect::{FrameInfo, VariableInfo};
use crate::debugger::locator::DebugLocator;
use crate::debugger::{Debugger, WeakDebugger};
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProcessId(pub u32);

impl Display for ProcessId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u32);

impl Display for SessionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stepping request armed on a process by the debugger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepMode {
    /// Break at the next statement of the current or an outer frame.
    Over,
    /// Break at the next statement, entering calls.
    Into,
}

/// Debugger wide settings that a process break predicate takes into account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BreakPolicy {
    pub break_on_exception: bool,
}

/// "Debugged by" back-reference stored at the process (or session) side.
///
/// Only a debugger writes into the slot, while holding its own state lock, so attach and
/// detach update both sides of the relation atomically. The slot keeps a weak reference,
/// dropping the last debugger handle never leaves a dangling link.
#[derive(Default)]
pub struct DebuggerSlot {
    debugger: Mutex<Option<WeakDebugger>>,
}

impl DebuggerSlot {
    /// Return debugger that currently debugs an owner of this slot.
    pub fn get(&self) -> Option<Debugger> {
        let debugger = self
            .debugger
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        debugger.as_ref().and_then(WeakDebugger::upgrade)
    }

    /// Return true if owner of this slot is debugged by `debugger`.
    pub fn is(&self, debugger: &Debugger) -> bool {
        let current = self
            .debugger
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        current.as_ref().map(|w| w.points_to(debugger)) == Some(true)
    }

    pub(super) fn set(&self, debugger: Option<&Debugger>) {
        *self
            .debugger
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = debugger.map(Debugger::downgrade);
    }

    /// Clear the slot only if it still points to `debugger`.
    pub(super) fn release(&self, debugger: &Debugger) -> bool {
        let mut current = self
            .debugger
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if current.as_ref().map(|w| w.points_to(debugger)) == Some(true) {
            *current = None;
            true
        } else {
            false
        }
    }
}

/// Worker process as seen by the debugger.
///
/// Every method may be called from a controller thread while the worker thread is parked
/// inside [`Debugger::safe_point`], implementations must not block on the worker.
pub trait Process: Send + Sync {
    fn id(&self) -> ProcessId;

    /// Session that owns this process.
    fn session_id(&self) -> SessionId;

    /// True while the process executes a request.
    fn is_running(&self) -> bool;

    /// True while the process is in a non-interruptible loading phase.
    fn is_loading(&self) -> bool {
        false
    }

    /// Process own break condition (pending step request, failed statement, etc.).
    fn should_break(&self, policy: BreakPolicy) -> anyhow::Result<bool>;

    /// Source location of the statement that the process is about to execute.
    fn current_location(&self) -> Option<DebugLocator>;

    fn set_step_mode(&self, mode: StepMode);

    /// Execution frames, innermost first.
    fn call_stack(&self) -> anyhow::Result<Vec<FrameInfo>>;

    /// Variables visible in a frame window (0 is the innermost frame).
    fn stack_window(&self, window: usize) -> anyhow::Result<Vec<VariableInfo>>;

    fn debugger_slot(&self) -> &DebuggerSlot;

    /// Return debugger attached to this process (if any).
    fn debugged_by(&self) -> Option<Debugger> {
        self.debugger_slot().get()
    }
}

/// Group of processes.
///
/// While a session is attached, the interpreter is expected to attach every new process
/// of the session with [`Debugger::attach_started`].
pub trait Session: Send + Sync {
    fn id(&self) -> SessionId;

    /// Snapshot of processes currently owned by the session.
    fn processes(&self) -> Vec<Arc<dyn Process>>;

    fn debugger_slot(&self) -> &DebuggerSlot;

    fn debugged_by(&self) -> Option<Debugger> {
        self.debugger_slot().get()
    }
}

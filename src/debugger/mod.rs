pub mod breakpoint;
pub mod command;
mod error;
pub mod introspect;
pub mod locator;
pub mod process;
mod sync;

pub use breakpoint::Breakpoint;
pub use error::Error;
pub use introspect::{CallStack, CallStackFrame, FrameInfo, StackVariable, VariableInfo};
pub use locator::DebugLocator;
pub use process::{BreakPolicy, DebuggerSlot, Process, ProcessId, Session, SessionId, StepMode};

use crate::debugger::breakpoint::BreakpointRegistry;
use crate::debugger::sync::PauseGate;
use crate::{hl_debug, hl_info, weak_error};
use indexmap::{IndexMap, IndexSet};
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use strum_macros::Display;

/// Upper bound for a single wait iteration of [`Debugger::wait_for_pause`].
pub const MAX_WAIT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Process status from the debugger point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ProcessStatus {
    #[strum(serialize = "idle")]
    Idle,
    #[strum(serialize = "running")]
    Running,
    #[strum(serialize = "paused")]
    Paused,
    #[strum(serialize = "broken")]
    Broken,
}

/// Attached process state.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessSnapshot {
    pub pid: ProcessId,
    pub session_id: SessionId,
    pub is_running: bool,
    /// True if process is parked at a safe point.
    pub is_parked: bool,
    /// True if process parked due to its own break condition.
    pub did_break: bool,
    pub location: Option<DebugLocator>,
}

impl ProcessSnapshot {
    pub fn status(&self) -> ProcessStatus {
        match (self.is_running, self.is_parked, self.did_break) {
            (_, _, true) => ProcessStatus::Broken,
            (_, true, false) => ProcessStatus::Paused,
            (true, false, false) => ProcessStatus::Running,
            (false, false, false) => ProcessStatus::Idle,
        }
    }
}

/// Debugger state, every field guarded by a single lock.
struct State {
    owner: Option<SessionId>,
    breakpoints: BreakpointRegistry,
    processes: IndexMap<ProcessId, Arc<dyn Process>>,
    sessions: IndexMap<SessionId, Arc<dyn Session>>,
    broken: IndexSet<ProcessId>,
    parked: HashSet<ProcessId>,
    pause_requested: bool,
    paused_count: usize,
    break_on_start: bool,
    break_on_exception: bool,
    disposed: bool,
}

impl State {
    fn running_count(&self) -> usize {
        self.processes.values().filter(|p| p.is_running()).count()
    }

    fn is_paused(&self) -> bool {
        !self.disposed && self.pause_requested && self.running_count() == self.paused_count
    }

    fn policy(&self) -> BreakPolicy {
        BreakPolicy {
            break_on_exception: self.break_on_exception,
        }
    }
}

struct Shared {
    state: Mutex<State>,
    gate: PauseGate,
    wait_poll_interval: Duration,
}

/// Debugger builder structure.
pub struct DebuggerBuilder {
    break_on_start: bool,
    break_on_exception: bool,
    wait_poll_interval: Duration,
}

impl Default for DebuggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DebuggerBuilder {
    pub fn new() -> Self {
        Self {
            break_on_start: false,
            break_on_exception: false,
            wait_poll_interval: MAX_WAIT_POLL_INTERVAL,
        }
    }

    pub fn with_break_on_start(self, break_on_start: bool) -> Self {
        Self {
            break_on_start,
            ..self
        }
    }

    pub fn with_break_on_exception(self, break_on_exception: bool) -> Self {
        Self {
            break_on_exception,
            ..self
        }
    }

    /// Set a poll interval of [`Debugger::wait_for_pause`], interval is clamped to
    /// [`MAX_WAIT_POLL_INTERVAL`].
    pub fn with_wait_poll_interval(self, interval: Duration) -> Self {
        Self {
            wait_poll_interval: interval.min(MAX_WAIT_POLL_INTERVAL),
            ..self
        }
    }

    /// Create a debugger owned by a session.
    pub fn build(self, owner: SessionId) -> Debugger {
        let state = State {
            owner: Some(owner),
            breakpoints: BreakpointRegistry::default(),
            processes: IndexMap::new(),
            sessions: IndexMap::new(),
            broken: IndexSet::new(),
            parked: HashSet::new(),
            pause_requested: false,
            paused_count: 0,
            break_on_start: self.break_on_start,
            break_on_exception: self.break_on_exception,
            disposed: false,
        };

        hl_info!(target: "debugger", "debugger started by session {owner}");

        Debugger {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                gate: PauseGate::default(),
                wait_poll_interval: self.wait_poll_interval,
            }),
        }
    }
}

/// Weak handle of a debugger, used as a "debugged by" back-reference.
#[derive(Clone)]
pub struct WeakDebugger(Weak<Shared>);

impl WeakDebugger {
    pub fn upgrade(&self) -> Option<Debugger> {
        self.0.upgrade().map(|shared| Debugger { shared })
    }

    fn points_to(&self, debugger: &Debugger) -> bool {
        std::ptr::eq(self.0.as_ptr(), Arc::as_ptr(&debugger.shared))
    }
}

/// Main structure of the debugger.
///
/// Debugger is a reactive object: worker threads call [`Debugger::safe_point`] at every
/// evaluated statement, controller threads call pause/run/step/inspect methods. The handle
/// is cheap to clone, all clones refer to the same debugger.
///
/// Lock order: debugger state lock first, then locks internal to process or session
/// handles. Process and session handles must not call into a debugger while holding their
/// own locks.
#[derive(Clone)]
pub struct Debugger {
    shared: Arc<Shared>,
}

impl PartialEq for Debugger {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl Eq for Debugger {}

impl std::fmt::Debug for Debugger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debugger")
            .field("ptr", &Arc::as_ptr(&self.shared))
            .finish()
    }
}

impl Debugger {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn downgrade(&self) -> WeakDebugger {
        WeakDebugger(Arc::downgrade(&self.shared))
    }

    /// Return session that owns this debugger, [`None`] after debugger stop.
    pub fn owner(&self) -> Option<SessionId> {
        self.lock().owner
    }

    pub fn is_disposed(&self) -> bool {
        self.lock().disposed
    }

    pub fn break_on_start(&self) -> bool {
        self.lock().break_on_start
    }

    pub fn set_break_on_start(&self, value: bool) {
        let mut state = self.lock();
        if !state.disposed {
            state.break_on_start = value;
        }
    }

    pub fn break_on_exception(&self) -> bool {
        self.lock().break_on_exception
    }

    pub fn set_break_on_exception(&self, value: bool) {
        let mut state = self.lock();
        if !state.disposed {
            state.break_on_exception = value;
        }
    }

    // --------------------------------- attach/detach ---------------------------------------------

    /// Attach a process. Process debugged by another debugger is detached from it first.
    pub fn attach(&self, process: Arc<dyn Process>) {
        self.release_foreign_process(process.as_ref());
        let mut state = self.lock();
        if state.disposed {
            return;
        }
        self.attach_locked(&mut state, process);
    }

    /// Attach a process that is just created by a session debugged by this debugger.
    /// If break on start enabled the process will break at its first safe point.
    pub fn attach_started(&self, process: Arc<dyn Process>) {
        self.release_foreign_process(process.as_ref());
        let mut state = self.lock();
        if state.disposed {
            return;
        }
        if state.break_on_start {
            process.set_step_mode(StepMode::Into);
        }
        self.attach_locked(&mut state, process);
    }

    fn release_foreign_process(&self, process: &dyn Process) {
        if let Some(other) = process.debugged_by().filter(|d| d != self) {
            other.detach(process.id());
        }
    }

    fn attach_locked(&self, state: &mut State, process: Arc<dyn Process>) {
        let pid = process.id();
        process.debugger_slot().set(Some(self));
        if state.processes.insert(pid, process).is_none() {
            hl_info!(target: "debugger", "process {pid} attached");
        }
    }

    /// Detach a process, no-op if process is not attached.
    /// If process is parked it leaves a safe point.
    pub fn detach(&self, pid: ProcessId) {
        let mut state = self.lock();
        self.detach_locked(&mut state, pid);
    }

    fn detach_locked(&self, state: &mut State, pid: ProcessId) {
        if let Some(process) = state.processes.shift_remove(&pid) {
            state.broken.shift_remove(&pid);
            process.debugger_slot().release(self);
            hl_info!(target: "debugger", "process {pid} detached");

            self.pulse_locked(state);
            // pause may converge without this process
            self.shared.gate.wake();
        }
    }

    /// Attach a session and all its processes.
    pub fn attach_session(&self, session: Arc<dyn Session>) {
        if let Some(other) = session.debugged_by().filter(|d| d != self) {
            other.detach_session(session.id());
        }
        let processes = session.processes();
        processes
            .iter()
            .for_each(|p| self.release_foreign_process(p.as_ref()));

        let mut state = self.lock();
        if state.disposed {
            return;
        }

        let sid = session.id();
        session.debugger_slot().set(Some(self));
        state.sessions.insert(sid, session);
        hl_info!(target: "debugger", "session {sid} attached");

        for process in processes {
            self.attach_locked(&mut state, process);
        }
    }

    /// Detach every process of a session and then session itself.
    pub fn detach_session(&self, sid: SessionId) {
        let mut state = self.lock();
        if !state.sessions.contains_key(&sid) {
            return;
        }

        let pids: Vec<_> = state
            .processes
            .values()
            .filter(|p| p.session_id() == sid)
            .map(|p| p.id())
            .collect();
        for pid in pids {
            self.detach_locked(&mut state, pid);
        }

        if let Some(session) = state.sessions.shift_remove(&sid) {
            session.debugger_slot().release(self);
            hl_info!(target: "debugger", "session {sid} detached");
        }
    }

    pub fn is_attached(&self, pid: ProcessId) -> bool {
        self.lock().processes.contains_key(&pid)
    }

    pub fn is_session_attached(&self, sid: SessionId) -> bool {
        self.lock().sessions.contains_key(&sid)
    }

    /// Return attached processes state.
    pub fn processes(&self) -> Vec<ProcessSnapshot> {
        let state = self.lock();
        state
            .processes
            .values()
            .map(|p| ProcessSnapshot {
                pid: p.id(),
                session_id: p.session_id(),
                is_running: p.is_running(),
                is_parked: state.parked.contains(&p.id()),
                did_break: state.broken.contains(&p.id()),
                location: p.current_location(),
            })
            .collect()
    }

    /// Return attached sessions.
    pub fn sessions(&self) -> Vec<SessionId> {
        self.lock().sessions.keys().copied().collect()
    }

    /// Return processes parked because of their break conditions.
    pub fn broken_processes(&self) -> Vec<ProcessId> {
        self.lock().broken.iter().copied().collect()
    }

    // --------------------------------- pause/run -------------------------------------------------

    /// Request a pause. Every attached process parks at its next safe point.
    pub fn pause(&self) {
        let mut state = self.lock();
        if state.disposed {
            return;
        }
        self.pause_locked(&mut state);
    }

    fn pause_locked(&self, state: &mut State) {
        if !state.pause_requested {
            hl_debug!(target: "debugger", "pause requested");
        }
        state.pause_requested = true;
        self.shared.gate.wake();
    }

    /// Resume all parked processes.
    pub fn run(&self) {
        let mut state = self.lock();
        if state.disposed {
            return;
        }
        self.run_locked(&mut state);
    }

    fn run_locked(&self, state: &mut State) {
        if state.pause_requested {
            hl_debug!(target: "debugger", "resume {} parked processes", state.paused_count);
        }
        state.pause_requested = false;
        state.broken.clear();
        self.shared.gate.release_all();
    }

    /// Wake every parked process to re-check whether it must stay parked, pause
    /// state is not changed.
    pub fn pulse(&self) {
        let state = self.lock();
        self.pulse_locked(&state);
    }

    fn pulse_locked(&self, state: &State) {
        if state.pause_requested {
            self.shared.gate.pulse();
        }
    }

    pub fn is_pause_requested(&self) -> bool {
        self.lock().pause_requested
    }

    /// True when pause requested and every running attached process is parked.
    pub fn is_paused(&self) -> bool {
        self.lock().is_paused()
    }

    /// Count of threads parked at safe points.
    pub fn paused_count(&self) -> usize {
        self.lock().paused_count
    }

    /// Count of attached processes that are executing a request.
    pub fn running_count(&self) -> usize {
        self.lock().running_count()
    }

    /// Block until debugger is paused.
    ///
    /// Pause state is re-checked at least every [`MAX_WAIT_POLL_INTERVAL`], `yield_hook` is
    /// called on each iteration without the debugger lock held. A controller that is itself
    /// a debugged process passes a hook that lets it leave its own safe point duties.
    ///
    /// Return [`Error::Disposed`] if debugger is stopped while waiting.
    pub fn wait_for_pause(&self, mut yield_hook: impl FnMut()) -> Result<(), Error> {
        let mut state = self.lock();
        loop {
            if state.disposed {
                return Err(Error::Disposed);
            }
            if state.is_paused() {
                return Ok(());
            }

            state = self
                .shared
                .gate
                .wait_wake(state, self.shared.wait_poll_interval);
            drop(state);
            yield_hook();
            state = self.lock();
        }
    }

    // --------------------------------- steps -----------------------------------------------------

    /// Step over the current statement of a process.
    ///
    /// Note that all parked processes are resumed, not only the target one. Others break
    /// again only if their own break conditions are satisfied.
    pub fn step_over(&self, pid: ProcessId) -> Result<(), Error> {
        self.step(pid, StepMode::Over)
    }

    /// Step into the current statement of a process.
    ///
    /// Like [`Debugger::step_over`], resumes all parked processes.
    pub fn step_into(&self, pid: ProcessId) -> Result<(), Error> {
        self.step(pid, StepMode::Into)
    }

    fn step(&self, pid: ProcessId, mode: StepMode) -> Result<(), Error> {
        let mut state = self.lock();
        if !state.is_paused() {
            return Err(Error::NotPaused);
        }
        let process = state
            .processes
            .get(&pid)
            .ok_or(Error::ProcessNotFound(pid))?;
        process.set_step_mode(mode);
        hl_debug!(target: "debugger", "process {pid} step {mode:?}");
        self.run_locked(&mut state);
        Ok(())
    }

    // --------------------------------- breakpoints -----------------------------------------------

    /// Add a breakpoint or remove it if exactly the same one exists.
    /// Return true if breakpoint was added, always false for a stopped debugger.
    pub fn toggle_breakpoint(&self, locator: &str, line: i32, line_pos: i32) -> bool {
        let mut state = self.lock();
        if state.disposed {
            return false;
        }
        let added = state
            .breakpoints
            .toggle(Breakpoint::new(locator, line, line_pos));
        hl_debug!(
            target: "debugger",
            "breakpoint {locator}:{line}:{line_pos} {}, total {}",
            if added { "added" } else { "removed" },
            state.breakpoints.len()
        );
        added
    }

    pub fn breakpoints(&self) -> Vec<Breakpoint> {
        self.lock().breakpoints.snapshot()
    }

    // --------------------------------- safe point ------------------------------------------------

    /// Safe point hook, called by a worker thread before each evaluated statement.
    ///
    /// Parks the calling thread while a pause is requested and the process is attached.
    /// Never fails and never panics: hook errors are logged and ignored.
    pub fn safe_point(&self, process: &dyn Process) {
        match panic::catch_unwind(AssertUnwindSafe(|| self.try_safe_point(process))) {
            Ok(result) => {
                weak_error!(result, "safe point:");
            }
            Err(_) => {
                ::log::warn!(target: "debugger", "safe point: process handle panicked");
            }
        }
    }

    fn try_safe_point(&self, process: &dyn Process) -> Result<(), Error> {
        if process.is_loading() {
            return Ok(());
        }

        let pid = process.id();
        let mut state = self.lock();
        if state.disposed || !state.processes.contains_key(&pid) {
            return Ok(());
        }

        if Self::should_break(&state, process)? {
            state.broken.insert(pid);
            self.pause_locked(&mut state);
            match process.current_location() {
                Some(location) => {
                    hl_info!(target: "debugger", "process {pid} break at {location}")
                }
                None => hl_info!(target: "debugger", "process {pid} break"),
            }
        }

        while state.pause_requested && state.processes.contains_key(&pid) {
            state.paused_count += 1;
            state.parked.insert(pid);
            state = self.shared.gate.park(state);
            state.parked.remove(&pid);
            state.paused_count -= 1;
        }

        Ok(())
    }

    fn should_break(state: &State, process: &dyn Process) -> Result<bool, Error> {
        if process.should_break(state.policy()).map_err(Error::Hook)? {
            return Ok(true);
        }
        Ok(process
            .current_location()
            .map(|location| state.breakpoints.hit(&location))
            .unwrap_or_default())
    }

    // --------------------------------- introspection ---------------------------------------------

    fn paused_process(&self, pid: ProcessId) -> Result<Arc<dyn Process>, Error> {
        let state = self.lock();
        if !state.is_paused() {
            return Err(Error::NotPaused);
        }
        state
            .processes
            .get(&pid)
            .cloned()
            .ok_or(Error::ProcessNotFound(pid))
    }

    /// Return call stack of a process, innermost frame first. Debugger must be paused.
    pub fn call_stack(&self, pid: ProcessId) -> Result<CallStack, Error> {
        let process = self.paused_process(pid)?;
        let frames = process.call_stack().map_err(Error::Hook)?;
        Ok(CallStack::build(pid, frames))
    }

    /// Return variables of a frame window of a process. Debugger must be paused.
    ///
    /// Process is unlinked from the debugger during evaluation, so evaluation never
    /// breaks at safe points.
    pub fn stack(&self, pid: ProcessId, window: usize) -> Result<Vec<StackVariable>, Error> {
        let process = self.paused_process(pid)?;
        let depth = process.call_stack().map_err(Error::Hook)?.len();
        if window >= depth {
            return Err(Error::WindowNotFound(window));
        }

        let vars = {
            let _unlink = Unlink::new(self, process.clone());
            process.stack_window(window).map_err(Error::Hook)?
        };
        Ok(introspect::stack_variables(vars))
    }

    // --------------------------------- shutdown --------------------------------------------------

    /// Stop the debugger: resume everything, detach all sessions and processes.
    /// Any call after stop is no-op.
    pub fn stop(&self) {
        let (sessions, processes) = {
            let mut state = self.lock();
            if state.disposed {
                return;
            }
            self.run_locked(&mut state);
            (
                state.sessions.keys().copied().collect::<Vec<_>>(),
                state.processes.keys().copied().collect::<Vec<_>>(),
            )
        };

        sessions.into_iter().for_each(|sid| self.detach_session(sid));
        processes.into_iter().for_each(|pid| self.detach(pid));

        let mut state = self.lock();
        // attached concurrently with the shutdown
        for (_, process) in state.processes.drain(..) {
            process.debugger_slot().release(self);
        }
        for (_, session) in state.sessions.drain(..) {
            session.debugger_slot().release(self);
        }
        state.broken.clear();
        state.pause_requested = false;
        state.disposed = true;
        let owner = state.owner.take();
        self.shared.gate.release_all();
        self.shared.gate.wake();

        if let Some(owner) = owner {
            hl_info!(target: "debugger", "debugger of session {owner} stopped");
        }
    }
}

/// Temporary clears the "debugged by" link of a process, link restores on drop if process
/// is still attached.
struct Unlink<'a> {
    debugger: &'a Debugger,
    process: Arc<dyn Process>,
}

impl<'a> Unlink<'a> {
    fn new(debugger: &'a Debugger, process: Arc<dyn Process>) -> Self {
        {
            let _state = debugger.lock();
            process.debugger_slot().release(debugger);
        }
        Self { debugger, process }
    }
}

impl Drop for Unlink<'_> {
    fn drop(&mut self) {
        let state = self.debugger.lock();
        if !state.disposed && state.processes.contains_key(&self.process.id()) {
            self.process.debugger_slot().set(Some(self.debugger));
        }
    }
}

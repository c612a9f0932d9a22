use crate::debugger::{
    Debugger, DebuggerBuilder, DebuggerSlot, Error, Process, ProcessId, Session, SessionId,
};
use crate::runtime::process::ScriptProcess;
use crate::runtime::script::Script;
use crate::runtime::{OutputSink, RuntimeError};
use crate::{hl_info, hl_warn};
use indexmap::IndexMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

/// Thread that executes a process.
pub type Worker = JoinHandle<Result<(), RuntimeError>>;

/// Group of script processes, may own a debugger.
pub struct ScriptSession {
    id: SessionId,
    pid_gen: Arc<AtomicU32>,
    processes: Mutex<IndexMap<ProcessId, Arc<ScriptProcess>>>,
    /// Debugger owned by this session.
    debugger: Mutex<Option<Debugger>>,
    sink: Option<OutputSink>,
    slot: DebuggerSlot,
}

impl ScriptSession {
    pub(super) fn new(id: SessionId, pid_gen: Arc<AtomicU32>, sink: Option<OutputSink>) -> Self {
        Self {
            id,
            pid_gen,
            processes: Mutex::default(),
            debugger: Mutex::default(),
            sink,
            slot: DebuggerSlot::default(),
        }
    }

    fn processes_map(&self) -> MutexGuard<'_, IndexMap<ProcessId, Arc<ScriptProcess>>> {
        self.processes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn owned_debugger(&self) -> MutexGuard<'_, Option<Debugger>> {
        self.debugger
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Create a new process for a script. If the session is debugged, process is
    /// attached to the debugger before it starts.
    pub fn create_process(&self, script: Arc<Script>) -> Arc<ScriptProcess> {
        let pid = ProcessId(self.pid_gen.fetch_add(1, Ordering::SeqCst));
        let process = Arc::new(ScriptProcess::new(pid, self.id, script, self.sink.clone()));
        self.processes_map().insert(pid, process.clone());

        if let Some(debugger) = self.debugged_by() {
            debugger.attach_started(process.clone());
        }
        process
    }

    /// Execute a process on a new thread. When execution is over, process is removed from
    /// the session and detached from its debugger.
    pub fn spawn(self: &Arc<Self>, process: Arc<ScriptProcess>) -> Result<Worker, RuntimeError> {
        let session = self.clone();
        let handle = thread::Builder::new()
            .name(format!("process-{}", process.id()))
            .spawn(move || {
                let result = process.execute();
                match &result {
                    Ok(()) => {
                        hl_info!(target: "runtime", "process {} finished", process.id())
                    }
                    Err(e) => {
                        hl_warn!(target: "runtime", "process {} terminated: {e}", process.id())
                    }
                }
                session.finish(&process);
                result
            })?;
        Ok(handle)
    }

    /// Create and execute a process.
    pub fn run_script(
        self: &Arc<Self>,
        script: Arc<Script>,
    ) -> Result<(Arc<ScriptProcess>, Worker), RuntimeError> {
        let process = self.create_process(script);
        let handle = self.spawn(process.clone())?;
        Ok((process, handle))
    }

    fn finish(&self, process: &ScriptProcess) {
        self.processes_map().shift_remove(&process.id());
        if let Some(debugger) = process.debugged_by() {
            debugger.detach(process.id());
        }
    }

    pub fn process(&self, pid: ProcessId) -> Option<Arc<ScriptProcess>> {
        self.processes_map().get(&pid).cloned()
    }

    pub fn script_processes(&self) -> Vec<Arc<ScriptProcess>> {
        self.processes_map().values().cloned().collect()
    }

    /// Start a debugger owned by this session.
    pub fn start_debugger(&self, builder: DebuggerBuilder) -> Result<Debugger, Error> {
        let mut owned = self.owned_debugger();
        if owned.is_some() {
            return Err(Error::AlreadyStarted(self.id));
        }
        let debugger = builder.build(self.id);
        *owned = Some(debugger.clone());
        Ok(debugger)
    }

    /// Stop a debugger owned by this session.
    pub fn stop_debugger(&self) -> Result<(), Error> {
        let debugger = self.owned_debugger().take().ok_or(Error::NotStarted)?;
        debugger.stop();
        Ok(())
    }

    /// Return debugger owned by this session.
    pub fn debugger(&self) -> Option<Debugger> {
        self.owned_debugger().clone()
    }
}

impl Session for ScriptSession {
    fn id(&self) -> SessionId {
        self.id
    }

    fn processes(&self) -> Vec<Arc<dyn Process>> {
        self.processes_map()
            .values()
            .map(|p| p.clone() as Arc<dyn Process>)
            .collect()
    }

    fn debugger_slot(&self) -> &DebuggerSlot {
        &self.slot
    }
}

use crate::debugger::{
    BreakPolicy, DebugLocator, DebuggerSlot, FrameInfo, Process, ProcessId, SessionId, StepMode,
    VariableInfo,
};
use crate::runtime::script::{Block, Line, Operand, Script, Statement, Value};
use crate::runtime::{OutputSink, RuntimeError};
use crate::hl_debug;
use indexmap::IndexMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

struct Frame {
    /// [`None`] for a script main block.
    function: Option<String>,
    pc: usize,
    vars: IndexMap<String, Value>,
}

impl Frame {
    fn name(&self) -> &str {
        self.function.as_deref().unwrap_or("main")
    }
}

struct StepRequest {
    mode: StepMode,
    /// Frame count at the moment of request.
    depth: usize,
}

#[derive(Default)]
struct Execution {
    frames: Vec<Frame>,
    step: Option<StepRequest>,
    /// Error raised by the current statement, not yet propagated.
    error: Option<String>,
    output: Vec<String>,
}

/// Process that executes a single script on its own thread.
pub struct ScriptProcess {
    id: ProcessId,
    session_id: SessionId,
    script: Arc<Script>,
    running: AtomicBool,
    loading: AtomicBool,
    cancelled: AtomicBool,
    execution: Mutex<Execution>,
    sink: Option<OutputSink>,
    slot: DebuggerSlot,
}

impl ScriptProcess {
    pub(super) fn new(
        id: ProcessId,
        session_id: SessionId,
        script: Arc<Script>,
        sink: Option<OutputSink>,
    ) -> Self {
        Self {
            id,
            session_id,
            script,
            running: AtomicBool::new(false),
            loading: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
            execution: Mutex::default(),
            sink,
            slot: DebuggerSlot::default(),
        }
    }

    pub fn script(&self) -> &Script {
        &self.script
    }

    /// Request process termination at the next statement.
    /// Process is detached from its debugger, so it leaves a safe point if parked.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        if let Some(debugger) = self.debugged_by() {
            debugger.detach(self.id);
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Return lines printed by the script.
    pub fn output(&self) -> Vec<String> {
        self.execution().output.clone()
    }

    fn execution(&self) -> MutexGuard<'_, Execution> {
        self.execution
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn safe_point(&self) {
        // execution lock must not be held here
        if let Some(debugger) = self.debugged_by() {
            debugger.safe_point(self);
        }
    }

    fn location(&self, line: &Line) -> DebugLocator {
        DebugLocator::new(self.script.name.as_str(), line.number, line.column)
    }

    fn block(&self, function: Option<&str>) -> Result<&Block, RuntimeError> {
        self.script
            .block(function)
            .ok_or_else(|| RuntimeError::UnknownFunction(function.unwrap_or("main").to_string()))
    }

    /// Register function declarations. Safe points of this phase never break.
    fn load(&self) {
        self.loading.store(true, Ordering::SeqCst);
        for name in self.script.functions.keys() {
            hl_debug!(target: "runtime", "process {}: load function `{name}`", self.id);
            self.safe_point();
        }
        self.loading.store(false, Ordering::SeqCst);
    }

    /// Execute script until the end, an error or cancellation.
    /// A panic inside the interpreter is reported as [`RuntimeError::Panic`], process
    /// is not running after return in any case.
    pub fn execute(&self) -> Result<(), RuntimeError> {
        self.running.store(true, Ordering::SeqCst);
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            self.load();
            {
                let mut exec = self.execution();
                exec.frames.clear();
                exec.frames.push(Frame {
                    function: None,
                    pc: 0,
                    vars: IndexMap::new(),
                });
            }
            self.execute_inner()
        }))
        .unwrap_or_else(|payload| Err(RuntimeError::Panic(panic_message(payload.as_ref()))));
        self.running.store(false, Ordering::SeqCst);
        result
    }

    fn execute_inner(&self) -> Result<(), RuntimeError> {
        loop {
            if self.is_cancelled() {
                return Err(RuntimeError::Cancelled);
            }

            let Some(line) = self.next_line()? else {
                return Ok(());
            };

            self.safe_point();

            if let Err(e) = self.execute_line(&line) {
                if matches!(e, RuntimeError::Failed(_)) {
                    // unhandled error, gives a debugger a chance to break at failed statement
                    self.execution().error = Some(e.to_string());
                    self.safe_point();
                    self.execution().error = None;
                }
                return Err(e);
            }
        }
    }

    /// Return next statement to execute, pops finished frames.
    fn next_line(&self) -> Result<Option<Line>, RuntimeError> {
        let mut exec = self.execution();
        loop {
            let Some(frame) = exec.frames.last() else {
                return Ok(None);
            };
            let block = self.block(frame.function.as_deref())?;
            if let Some(line) = block.lines.get(frame.pc) {
                return Ok(Some(line.clone()));
            }

            exec.frames.pop();
            if let Some(caller) = exec.frames.last_mut() {
                caller.pc += 1;
            }
        }
    }

    fn execute_line(&self, line: &Line) -> Result<(), RuntimeError> {
        let mut exec = self.execution();
        let depth = exec.frames.len();
        let frame = exec
            .frames
            .last_mut()
            .ok_or(RuntimeError::Cancelled)?;

        let mut printed = None;
        let mut sleep = None;
        match &line.statement {
            Statement::Set { var, lhs, rhs } => {
                let lhs = eval(&frame.vars, lhs)?;
                let value = match rhs {
                    None => lhs,
                    Some(rhs) => match (lhs, eval(&frame.vars, rhs)?) {
                        (Value::Integer(a), Value::Integer(b)) => {
                            Value::Integer(a.checked_add(b).ok_or(RuntimeError::Overflow)?)
                        }
                        (Value::String(a), b) => Value::String(format!("{a}{}", plain(&b))),
                        (a, b) => {
                            return Err(RuntimeError::TypeMismatch(
                                a.type_name(),
                                b.type_name(),
                            ))
                        }
                    },
                };
                frame.vars.insert(var.clone(), value);
                frame.pc += 1;
            }
            Statement::Print(operand) => {
                let text = plain(&eval(&frame.vars, operand)?);
                frame.pc += 1;
                exec.output.push(text.clone());
                printed = Some(text);
            }
            Statement::Call(function) => {
                if !self.script.functions.contains_key(function) {
                    return Err(RuntimeError::UnknownFunction(function.clone()));
                }
                // caller pc stays at the call statement until callee returns
                exec.frames.push(Frame {
                    function: Some(function.clone()),
                    pc: 0,
                    vars: IndexMap::new(),
                });
            }
            Statement::Return => {
                exec.frames.pop();
                if let Some(caller) = exec.frames.last_mut() {
                    caller.pc += 1;
                }
            }
            Statement::Sleep(ms) => {
                frame.pc += 1;
                sleep = Some(Duration::from_millis(*ms));
            }
            Statement::Fail(message) => {
                return Err(RuntimeError::Failed(message.clone()));
            }
            Statement::Goto(target) => {
                let block = self.block(frame.function.as_deref())?;
                frame.pc = block
                    .position(*target)
                    .ok_or(RuntimeError::LineNotFound(*target))?;
            }
            Statement::Nop => {
                frame.pc += 1;
            }
        }
        drop(exec);

        hl_debug!(target: "runtime", "process {} (depth {depth}): {}", self.id, line.text);
        if let (Some(text), Some(sink)) = (printed, &self.sink) {
            sink(self.id, &text);
        }
        if let Some(duration) = sleep {
            thread::sleep(duration);
        }
        Ok(())
    }
}

fn eval(vars: &IndexMap<String, Value>, operand: &Operand) -> Result<Value, RuntimeError> {
    match operand {
        Operand::Literal(value) => Ok(value.clone()),
        Operand::Variable(name) => vars
            .get(name)
            .cloned()
            .ok_or_else(|| RuntimeError::UnknownVariable(name.clone())),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

fn plain(value: &Value) -> String {
    match value {
        Value::Integer(i) => i.to_string(),
        Value::String(s) => s.clone(),
    }
}

impl Process for ScriptProcess {
    fn id(&self) -> ProcessId {
        self.id
    }

    fn session_id(&self) -> SessionId {
        self.session_id
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    fn should_break(&self, policy: BreakPolicy) -> anyhow::Result<bool> {
        let mut exec = self.execution();
        if exec.error.is_some() {
            return Ok(policy.break_on_exception);
        }

        let depth = exec.frames.len();
        let hit = match exec.step {
            None => false,
            Some(StepRequest {
                mode: StepMode::Into,
                ..
            }) => true,
            Some(StepRequest {
                mode: StepMode::Over,
                depth: step_depth,
            }) => depth <= step_depth,
        };
        if hit {
            exec.step = None;
        }
        Ok(hit)
    }

    fn current_location(&self) -> Option<DebugLocator> {
        let exec = self.execution();
        let frame = exec.frames.last()?;
        let line = self.script.block(frame.function.as_deref())?.lines.get(frame.pc)?;
        Some(self.location(line))
    }

    fn set_step_mode(&self, mode: StepMode) {
        let mut exec = self.execution();
        let depth = exec.frames.len();
        exec.step = Some(StepRequest { mode, depth });
    }

    fn call_stack(&self) -> anyhow::Result<Vec<FrameInfo>> {
        let exec = self.execution();
        let frames = exec
            .frames
            .iter()
            .rev()
            .map(|frame| {
                let line = self
                    .script
                    .block(frame.function.as_deref())
                    .and_then(|block| block.lines.get(frame.pc));
                FrameInfo {
                    description: frame.name().to_string(),
                    location: line.map(|l| self.location(l)),
                    program_locator: match frame.function {
                        None => self.script.name.clone(),
                        Some(ref function) => format!("{}:{function}", self.script.name),
                    },
                    statement: line.map(|l| l.text.clone()).unwrap_or_default(),
                }
            })
            .collect();
        Ok(frames)
    }

    fn stack_window(&self, window: usize) -> anyhow::Result<Vec<VariableInfo>> {
        let exec = self.execution();
        let frame = exec
            .frames
            .iter()
            .rev()
            .nth(window)
            .ok_or_else(|| anyhow::anyhow!("frame window {window} not exists"))?;
        Ok(frame
            .vars
            .iter()
            .map(|(name, value)| VariableInfo {
                name: name.clone(),
                type_name: value.type_name().to_string(),
                value: value.to_string(),
            })
            .collect())
    }

    fn debugger_slot(&self) -> &DebuggerSlot {
        &self.slot
    }
}

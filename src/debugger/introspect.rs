use crate::debugger::locator::DebugLocator;
use crate::debugger::process::ProcessId;

/// Execution frame as reported by a process.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameInfo {
    /// Human readable frame description (called operator name, etc.).
    pub description: String,
    pub location: Option<DebugLocator>,
    /// Locator of the program or operator that the frame executes.
    pub program_locator: String,
    pub statement: String,
}

/// Variable as reported by a process.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableInfo {
    pub name: String,
    pub type_name: String,
    pub value: String,
}

/// Single frame of a frozen call stack.
#[derive(Debug, Clone, PartialEq)]
pub struct CallStackFrame {
    /// Zero-based frame number, 0 is the innermost frame.
    pub index: usize,
    pub description: String,
    pub location: Option<DebugLocator>,
    pub program_locator: String,
    pub statement: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallStack {
    pub pid: ProcessId,
    pub frames: Vec<CallStackFrame>,
}

impl CallStack {
    pub(super) fn build(pid: ProcessId, frames: Vec<FrameInfo>) -> Self {
        let frames = frames
            .into_iter()
            .enumerate()
            .map(|(index, frame)| CallStackFrame {
                index,
                description: frame.description,
                location: frame.location,
                program_locator: frame.program_locator,
                statement: frame.statement,
            })
            .collect();
        Self { pid, frames }
    }

    /// Return innermost frame.
    pub fn top(&self) -> Option<&CallStackFrame> {
        self.frames.first()
    }
}

/// Variable of a frame window.
#[derive(Debug, Clone, PartialEq)]
pub struct StackVariable {
    pub index: usize,
    pub name: String,
    pub type_name: String,
    pub value: String,
}

pub(super) fn stack_variables(vars: Vec<VariableInfo>) -> Vec<StackVariable> {
    vars.into_iter()
        .enumerate()
        .map(|(index, var)| StackVariable {
            index,
            name: var.name,
            type_name: var.type_name,
            value: var.value,
        })
        .collect()
}

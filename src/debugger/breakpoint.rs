use crate::debugger::locator::DebugLocator;
use indexmap::IndexSet;
use std::fmt::{Display, Formatter};

/// Breakpoint representation.
///
/// Two breakpoints are equal only if all three components are equal, so a whole line
/// breakpoint (`line_pos == -1`) and a column breakpoint on the same line are different
/// entries of a registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Breakpoint {
    pub locator: String,
    pub line: i32,
    pub line_pos: i32,
}

impl Breakpoint {
    pub fn new(locator: impl Into<String>, line: i32, line_pos: i32) -> Self {
        Self {
            locator: locator.into(),
            line,
            line_pos,
        }
    }

    /// True if breakpoint matches any column of its line.
    pub fn is_whole_line(&self) -> bool {
        self.line_pos == -1
    }

    /// Return true if program located at `location` must stop at this breakpoint.
    pub fn matches(&self, location: &DebugLocator) -> bool {
        self.locator == location.locator
            && self.line == location.line
            && (self.is_whole_line() || self.line_pos == location.line_pos)
    }
}

impl Display for Breakpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_whole_line() {
            write!(f, "{}:{}", self.locator, self.line)
        } else {
            write!(f, "{}:{}:{}", self.locator, self.line, self.line_pos)
        }
    }
}

/// Ordered set of breakpoints without duplicates.
#[derive(Debug, Default)]
pub(super) struct BreakpointRegistry {
    breakpoints: IndexSet<Breakpoint>,
}

impl BreakpointRegistry {
    /// Remove breakpoint if exists or add it otherwise.
    /// Return true if breakpoint was added.
    pub(super) fn toggle(&mut self, brkpt: Breakpoint) -> bool {
        if self.breakpoints.shift_remove(&brkpt) {
            false
        } else {
            self.breakpoints.insert(brkpt)
        }
    }

    /// Return true if at least one breakpoint matches a location.
    pub(super) fn hit(&self, location: &DebugLocator) -> bool {
        self.breakpoints.iter().any(|brkpt| brkpt.matches(location))
    }

    pub(super) fn snapshot(&self) -> Vec<Breakpoint> {
        self.breakpoints.iter().cloned().collect()
    }

    pub(super) fn len(&self) -> usize {
        self.breakpoints.len()
    }
}

use std::fmt::{Display, Formatter};

/// Position inside a source document or a synthetic program/operator reference.
///
/// `line_pos` is a column on the `line`, `-1` means that column is unknown.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DebugLocator {
    pub locator: String,
    pub line: i32,
    pub line_pos: i32,
}

impl DebugLocator {
    pub fn new(locator: impl Into<String>, line: i32, line_pos: i32) -> Self {
        Self {
            locator: locator.into(),
            line,
            line_pos,
        }
    }

    /// Locator for a whole line.
    pub fn at_line(locator: impl Into<String>, line: i32) -> Self {
        Self::new(locator, line, -1)
    }
}

impl Display for DebugLocator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.line_pos == -1 {
            write!(f, "{}:{}", self.locator, self.line)
        } else {
            write!(f, "{}:{}:{}", self.locator, self.line, self.line_pos)
        }
    }
}

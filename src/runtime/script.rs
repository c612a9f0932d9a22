//! Line oriented script language.
//!
//! ```text
//! fn greet
//!     set msg = "hello"
//!     print msg
//! end
//! set n = 1
//! call greet
//! set n = n + 1
//! goto 6
//! ```
//!
//! Statements: `set <var> = <operand> [+ <operand>]`, `print <operand>`, `call <fn>`, `ret`,
//! `sleep <ms>`, `fail <message>`, `goto <line>`, `nop`. Empty lines and lines started with
//! `#` are skipped.

use crate::runtime::RuntimeError;
use indexmap::IndexMap;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Integer(i64),
    String(String),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "Integer",
            Value::String(_) => "String",
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{i}"),
            Value::String(s) => write!(f, "\"{s}\""),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Literal(Value),
    Variable(String),
}

impl Operand {
    fn parse(src: &str, line: i32) -> Result<Self, RuntimeError> {
        let src = src.trim();
        if let Some(s) = src.strip_prefix('"') {
            let s = s.strip_suffix('"').ok_or_else(|| RuntimeError::Parse {
                line,
                message: "unterminated string".to_string(),
            })?;
            return Ok(Operand::Literal(Value::String(s.to_string())));
        }
        if let Ok(i) = src.parse::<i64>() {
            return Ok(Operand::Literal(Value::Integer(i)));
        }
        if !src.is_empty() && src.chars().all(|c| c.is_alphanumeric() || c == '_') {
            return Ok(Operand::Variable(src.to_string()));
        }
        Err(RuntimeError::Parse {
            line,
            message: format!("invalid operand `{src}`"),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Set {
        var: String,
        lhs: Operand,
        rhs: Option<Operand>,
    },
    Print(Operand),
    Call(String),
    Return,
    Sleep(u64),
    Fail(String),
    Goto(i32),
    Nop,
}

/// Parsed statement with its position in a script.
#[derive(Debug, Clone)]
pub struct Line {
    /// 1-based line number.
    pub number: i32,
    /// 1-based column of the first statement character.
    pub column: i32,
    pub text: String,
    pub statement: Statement,
}

/// Sequence of statements (script main part or a function body).
#[derive(Debug, Clone, Default)]
pub struct Block {
    pub lines: Vec<Line>,
}

impl Block {
    /// Return index of the statement located at the line.
    pub fn position(&self, line: i32) -> Option<usize> {
        self.lines.iter().position(|l| l.number == line)
    }
}

#[derive(Debug, Clone)]
pub struct Script {
    pub name: String,
    pub main: Block,
    /// Function declarations, with a line of `fn` keyword.
    pub functions: IndexMap<String, (i32, Block)>,
}

impl Script {
    /// Parse script source.
    pub fn parse(name: impl Into<String>, source: &str) -> Result<Self, RuntimeError> {
        let mut main = Block::default();
        let mut functions = IndexMap::new();
        let mut current_fn: Option<(String, i32, Block)> = None;

        for (idx, raw) in source.lines().enumerate() {
            let number = idx as i32 + 1;
            let text = raw.trim();
            if text.is_empty() || text.starts_with('#') {
                continue;
            }
            let column = (raw.len() - raw.trim_start().len()) as i32 + 1;

            let (keyword, rest) = text
                .split_once(char::is_whitespace)
                .map(|(k, r)| (k, r.trim()))
                .unwrap_or((text, ""));

            let statement = match keyword {
                "fn" => {
                    if current_fn.is_some() {
                        return Err(RuntimeError::Parse {
                            line: number,
                            message: "nested functions are not supported".to_string(),
                        });
                    }
                    if rest.is_empty() {
                        return Err(RuntimeError::Parse {
                            line: number,
                            message: "function name expected".to_string(),
                        });
                    }
                    current_fn = Some((rest.to_string(), number, Block::default()));
                    continue;
                }
                "end" => {
                    let (fn_name, fn_line, body) =
                        current_fn.take().ok_or_else(|| RuntimeError::Parse {
                            line: number,
                            message: "`end` without `fn`".to_string(),
                        })?;
                    functions.insert(fn_name, (fn_line, body));
                    continue;
                }
                "set" => {
                    let (var, expr) = rest.split_once('=').ok_or_else(|| RuntimeError::Parse {
                        line: number,
                        message: "`=` expected".to_string(),
                    })?;
                    let (lhs, rhs) = match expr.split_once('+') {
                        Some((lhs, rhs)) => (
                            Operand::parse(lhs, number)?,
                            Some(Operand::parse(rhs, number)?),
                        ),
                        None => (Operand::parse(expr, number)?, None),
                    };
                    Statement::Set {
                        var: var.trim().to_string(),
                        lhs,
                        rhs,
                    }
                }
                "print" => Statement::Print(Operand::parse(rest, number)?),
                "call" => Statement::Call(rest.to_string()),
                "ret" => Statement::Return,
                "sleep" => Statement::Sleep(rest.parse().map_err(|_| RuntimeError::Parse {
                    line: number,
                    message: format!("invalid duration `{rest}`"),
                })?),
                "fail" => Statement::Fail(rest.to_string()),
                "goto" => Statement::Goto(rest.parse().map_err(|_| RuntimeError::Parse {
                    line: number,
                    message: format!("invalid line `{rest}`"),
                })?),
                "nop" => Statement::Nop,
                _ => {
                    return Err(RuntimeError::Parse {
                        line: number,
                        message: format!("unknown statement `{keyword}`"),
                    })
                }
            };

            let line = Line {
                number,
                column,
                text: text.to_string(),
                statement,
            };
            match current_fn {
                Some((_, _, ref mut body)) => body.lines.push(line),
                None => main.lines.push(line),
            }
        }

        if let Some((fn_name, fn_line, _)) = current_fn {
            return Err(RuntimeError::Parse {
                line: fn_line,
                message: format!("function `{fn_name}` is not closed"),
            });
        }

        Ok(Self {
            name: name.into(),
            main,
            functions,
        })
    }

    /// Return code block by function name, [`None`] name means main block.
    pub fn block(&self, function: Option<&str>) -> Option<&Block> {
        match function {
            None => Some(&self.main),
            Some(name) => self.functions.get(name).map(|(_, block)| block),
        }
    }
}

use crate::debugger::process::{ProcessId, SessionId};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    // --------------------------------- usage errors ----------------------------------------------
    #[error("debugger is running, pause it first")]
    NotPaused,
    #[error("debugger already stopped")]
    Disposed,
    #[error("debugger already started for session {0}")]
    AlreadyStarted(SessionId),
    #[error("debugger is not started")]
    NotStarted,
    #[error("no running process may break")]
    NothingToWait,

    // --------------------------------- debugger entity not found----------------------------------
    #[error("process {0} not found")]
    ProcessNotFound(ProcessId),
    #[error("process {0} is not attached")]
    ProcessNotAttached(ProcessId),
    #[error("session {0} not found")]
    SessionNotFound(SessionId),
    #[error("frame window {0} not found")]
    WindowNotFound(usize),

    // --------------------------------- third party errors ----------------------------------------
    #[error("hook: {0}")]
    Hook(anyhow::Error),
}

impl Error {
    /// Return a hint to an interface - continue debugging after error or stop whole process.
    pub fn is_fatal(&self) -> bool {
        match self {
            Error::NotPaused => false,
            Error::AlreadyStarted(_) => false,
            Error::NotStarted => false,
            Error::NothingToWait => false,
            Error::ProcessNotFound(_) => false,
            Error::ProcessNotAttached(_) => false,
            Error::SessionNotFound(_) => false,
            Error::WindowNotFound(_) => false,
            Error::Hook(_) => false,

            // currently fatal errors
            Error::Disposed => true,
        }
    }
}

#[macro_export]
macro_rules! _error {
    ($log_fn: path, $res: expr) => {
        match $res {
            Ok(value) => Some(value),
            Err(e) => {
                $log_fn!(target: "debugger", "{:#}", e);
                None
            }
        }
    };
    ($log_fn: path, $res: expr, $msg: tt) => {
        match $res {
            Ok(value) => Some(value),
            Err(e) => {
                $log_fn!(target: "debugger", concat!($msg, " {:#}"), e);
                None
            }
        }
    };
}

/// Transforms `Result` into `Option` and logs an error if it occurs.
#[macro_export]
macro_rules! weak_error {
    ($res: expr) => {
        $crate::_error!(::log::warn, $res)
    };
    ($res: expr, $msg: tt) => {
        $crate::_error!(::log::warn, $res, $msg)
    };
}

/// Transforms `Result` into `Option` and put error into debug logs if it occurs.
#[macro_export]
macro_rules! muted_error {
    ($res: expr) => {
        $crate::_error!(::log::debug, $res)
    };
    ($res: expr, $msg: tt) => {
        $crate::_error!(::log::debug, $res, $msg)
    };
}

//! Control plane of a debugger.
//!
//! Contains commands and corresponding command handlers. Command is a request to the
//! debugger that defines an action and its input arguments. Command handler validates
//! the command, tells the debugger what exactly to do and returns the result.

pub mod attach;
pub mod backtrace;
pub mod r#break;
pub mod r#continue;
pub mod pause;
pub mod policy;
pub mod stack;
pub mod status;
pub mod step_into;
pub mod step_over;

pub use attach::Attach;
pub use backtrace::Backtrace;
pub use pause::Pause;
pub use policy::Policy;
pub use r#break::Break;
pub use r#continue::Continue;
pub use stack::Stack;
pub use status::Status;
pub use step_into::StepInto;
pub use step_over::StepOver;

use crate::debugger::{Error, Process, ProcessId, Session, SessionId};
use std::sync::Arc;

pub type HandleResult<T> = Result<T, Error>;

/// Resolves processes and sessions of an interpreter by their identifiers.
pub trait Resolver {
    fn process(&self, pid: ProcessId) -> Option<Arc<dyn Process>>;

    fn session(&self, sid: SessionId) -> Option<Arc<dyn Session>>;
}

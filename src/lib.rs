pub mod debugger;
pub mod log;
pub mod runtime;
pub mod ui;

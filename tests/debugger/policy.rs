use crate::common::{join_worker, wait_paused, wait_until, DebugEnv};
use crate::common::{CALL_SCRIPT, LOOP_SCRIPT};
use haltline::debugger::command::policy::Command;
use haltline::debugger::command::Policy;
use haltline::debugger::{DebugLocator, DebuggerBuilder, Error, Process, Session};
use haltline::runtime::{RuntimeError, Script};
use serial_test::serial;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const FAIL_SCRIPT: &str = "\
set x = 1
fail boom
print x
";

#[test]
#[serial]
fn test_break_on_exception() {
    let env = DebugEnv::new();
    assert!(!env.debugger.break_on_exception());
    Policy::new(&env.debugger).handle(Command::BreakOnException(true));
    assert!(env.debugger.break_on_exception());

    let (process, worker) = env.run("script1", FAIL_SCRIPT);
    wait_paused(&env.debugger);
    assert_eq!(env.debugger.broken_processes(), vec![process.id()]);
    assert_eq!(
        process.current_location(),
        Some(DebugLocator::new("script1", 2, 1))
    );
    assert_eq!(env.debugger.stack(process.id(), 0).unwrap()[0].value, "1");

    env.debugger.run();
    assert!(matches!(join_worker(worker), Err(RuntimeError::Failed(m)) if m == "boom"));
    assert!(process.output().is_empty());
}

#[test]
#[serial]
fn test_no_break_on_exception_by_default() {
    let env = DebugEnv::new();
    let (_, worker) = env.run("script1", FAIL_SCRIPT);
    assert!(matches!(join_worker(worker), Err(RuntimeError::Failed(_))));
    assert!(!env.debugger.is_pause_requested());
}

#[test]
#[serial]
fn test_break_on_start() {
    let env = DebugEnv::with_builder(DebuggerBuilder::new().with_break_on_start(true));
    assert!(env.debugger.break_on_start());

    // function declarations are loaded without breaks, first break is at main block
    let (process, worker) = env.run("script1", CALL_SCRIPT);
    wait_paused(&env.debugger);
    assert_eq!(env.debugger.broken_processes(), vec![process.id()]);
    assert_eq!(
        process.current_location(),
        Some(DebugLocator::new("script1", 5, 3))
    );

    env.debugger.run();
    join_worker(worker).unwrap();

    Policy::new(&env.debugger).handle(Command::BreakOnStart(false));
    let (process, worker) = env.run("script1", CALL_SCRIPT);
    join_worker(worker).unwrap();
    assert_eq!(process.output(), vec!["2".to_string()]);
    assert!(!env.debugger.is_pause_requested());
}

#[test]
#[serial]
fn test_break_on_start_ignores_running_processes() {
    let env = DebugEnv::new();
    let session = env.engine.create_session();
    let script = Arc::new(Script::parse("loop1", LOOP_SCRIPT).unwrap());
    let (process, worker) = session.run_script(script).unwrap();
    assert!(wait_until(|| process.is_running()));

    env.debugger.set_break_on_start(true);
    env.debugger.attach_session(session.clone());
    assert!(env.debugger.is_attached(process.id()));
    thread::sleep(Duration::from_millis(20));
    assert!(!env.debugger.is_pause_requested());

    process.cancel();
    assert!(join_worker(worker).is_err());
}

#[test]
#[serial]
fn test_debugger_ownership() {
    let env = DebugEnv::new();
    let sid = env.session.id();
    assert_eq!(env.debugger.owner(), Some(sid));
    assert_eq!(env.session.debugger(), Some(env.debugger.clone()));

    assert!(matches!(
        env.session.start_debugger(DebuggerBuilder::new()),
        Err(Error::AlreadyStarted(s)) if s == sid
    ));

    env.session.stop_debugger().unwrap();
    assert_eq!(env.debugger.owner(), None);
    assert!(env.session.debugger().is_none());
    assert!(env.session.debugged_by().is_none());
    assert!(matches!(
        env.session.stop_debugger(),
        Err(Error::NotStarted)
    ));

    // session may start a new debugger after stop
    let debugger = env.session.start_debugger(DebuggerBuilder::new()).unwrap();
    assert_ne!(debugger, env.debugger);
    assert_eq!(debugger.owner(), Some(sid));
    assert!(!debugger.is_disposed());
}

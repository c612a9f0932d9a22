use crate::common::{join, join_worker, wait_parked, wait_paused, wait_until, DebugEnv, TestProcess};
use crate::common::{CALL_SCRIPT, LOOP_SCRIPT};
use haltline::debugger::command::{Backtrace, Stack};
use haltline::debugger::{DebugLocator, DebuggerBuilder, Error, Process, ProcessId, SessionId};
use serial_test::serial;

#[test]
#[serial]
fn test_frame_variables() {
    let env = DebugEnv::new();
    env.debugger.toggle_breakpoint("script1", 3, -1);
    let (process, worker) = env.run("script1", CALL_SCRIPT);
    let pid = process.id();
    wait_paused(&env.debugger);

    let stack = Stack::new(&env.debugger);
    let vars = stack.handle(pid, 0).unwrap();
    assert_eq!(vars.len(), 1);
    assert_eq!(vars[0].index, 0);
    assert_eq!(vars[0].name, "msg");
    assert_eq!(vars[0].type_name, "String");
    assert_eq!(vars[0].value, "\"hello\"");

    let vars = stack.handle(pid, 1).unwrap();
    assert_eq!(vars.len(), 1);
    assert_eq!(vars[0].name, "x");
    assert_eq!(vars[0].type_name, "Integer");
    assert_eq!(vars[0].value, "1");

    assert!(matches!(stack.handle(pid, 2), Err(Error::WindowNotFound(2))));
    // evaluation doesn't break the link between process and debugger
    assert_eq!(process.debugged_by(), Some(env.debugger.clone()));

    env.debugger.run();
    join_worker(worker).unwrap();
}

#[test]
#[serial]
fn test_introspection_requires_pause() {
    let env = DebugEnv::new();
    let (process, worker) = env.run("loop1", LOOP_SCRIPT);
    let pid = process.id();
    assert!(wait_until(|| process.is_running()));

    assert!(matches!(
        Backtrace::new(&env.debugger).handle(pid),
        Err(Error::NotPaused)
    ));
    assert!(matches!(
        Stack::new(&env.debugger).handle(pid, 0),
        Err(Error::NotPaused)
    ));

    env.debugger.pause();
    wait_paused(&env.debugger);
    let stack = Backtrace::new(&env.debugger).handle(pid).unwrap();
    assert_eq!(stack.frames.len(), 1);
    assert_eq!(stack.frames[0].program_locator, "loop1");
    let vars = env.debugger.stack(pid, 0).unwrap();
    assert!(vars.len() <= 1);
    assert!(vars.iter().all(|var| var.name == "n"));

    let unknown = ProcessId(999_999);
    assert!(matches!(
        env.debugger.call_stack(unknown),
        Err(Error::ProcessNotFound(_))
    ));
    assert!(matches!(
        env.debugger.stack(unknown, 0),
        Err(Error::ProcessNotFound(_))
    ));

    process.cancel();
    assert!(join_worker(worker).is_err());
}

#[test]
fn test_stack_evaluation_unlinks_process() {
    let debugger = DebuggerBuilder::new().build(SessionId(1));
    let process = TestProcess::new(SessionId(1), DebugLocator::new("script1", 1, 1));
    debugger.attach(process.clone());
    debugger.toggle_breakpoint("script1", 1, -1);

    let parked = process.spawn_safe_point(&debugger);
    wait_parked(&debugger, process.id());

    let vars = debugger.stack(process.id(), 0).unwrap();
    assert_eq!(vars.len(), 1);
    assert_eq!(vars[0].name, "debugged");
    assert_eq!(vars[0].value, "false");
    assert_eq!(process.debugged_by(), Some(debugger.clone()));

    // single frame only
    assert!(matches!(
        debugger.stack(process.id(), 1),
        Err(Error::WindowNotFound(1))
    ));

    let stack = debugger.call_stack(process.id()).unwrap();
    assert_eq!(stack.top().map(|f| f.description.as_str()), Some("main"));

    debugger.run();
    join(parked);
}

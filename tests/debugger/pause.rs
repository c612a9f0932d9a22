use crate::common::{join, join_worker, wait_parked, wait_until, DebugEnv, Predicate, TestProcess};
use crate::common::LOOP_SCRIPT;
use haltline::debugger::command::pause::Command;
use haltline::debugger::command::Pause;
use haltline::debugger::{
    DebugLocator, DebuggerBuilder, Error, Process, ProcessId, ProcessStatus, Session, SessionId,
};
use haltline::runtime::{Engine, RuntimeError, Script};
use serial_test::serial;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[test]
#[serial]
fn test_pause_and_run() {
    let env = DebugEnv::new();
    let (p1, w1) = env.run("loop1", LOOP_SCRIPT);
    let (p2, w2) = env.run("loop2", LOOP_SCRIPT);
    assert!(wait_until(|| p1.is_running() && p2.is_running()));

    Pause::new(&env.debugger)
        .handle(Command::RequestAndWait, || {})
        .unwrap();
    assert!(env.debugger.is_paused());
    assert_eq!(env.debugger.paused_count(), 2);
    assert_eq!(env.debugger.running_count(), 2);
    assert!(env.debugger.broken_processes().is_empty());
    assert!(env
        .debugger
        .processes()
        .iter()
        .all(|p| p.status() == ProcessStatus::Paused));

    // parked processes stay at their locations
    let locations = (p1.current_location(), p2.current_location());
    thread::sleep(Duration::from_millis(20));
    assert_eq!((p1.current_location(), p2.current_location()), locations);

    env.debugger.run();
    assert!(!env.debugger.is_pause_requested());
    assert!(wait_until(|| env.debugger.paused_count() == 0));
    assert!(!env.debugger.is_paused());

    // pause is repeatable
    Pause::new(&env.debugger)
        .handle(Command::RequestAndWait, || {})
        .unwrap();
    assert_eq!(env.debugger.paused_count(), 2);
    env.debugger.run();

    p1.cancel();
    p2.cancel();
    assert!(join_worker(w1).is_err());
    assert!(join_worker(w2).is_err());
}

#[test]
#[serial]
fn test_cancel_of_paused_process() {
    let env = DebugEnv::new();
    let (p1, w1) = env.run("loop1", LOOP_SCRIPT);
    let (p2, w2) = env.run("loop2", LOOP_SCRIPT);
    assert!(wait_until(|| p1.is_running() && p2.is_running()));

    Pause::new(&env.debugger)
        .handle(Command::RequestAndWait, || {})
        .unwrap();

    // cancelled process leaves a safe point, the other one stays parked
    p1.cancel();
    assert!(join_worker(w1).is_err());
    assert!(env.debugger.is_paused());
    assert_eq!(env.debugger.paused_count(), 1);
    wait_parked(&env.debugger, p2.id());

    p2.cancel();
    assert!(join_worker(w2).is_err());
    assert_eq!(env.debugger.paused_count(), 0);
}

#[test]
fn test_pause_waits_for_every_running_process() {
    let debugger = DebuggerBuilder::new().build(SessionId(1));
    let p1 = TestProcess::new(SessionId(1), DebugLocator::new("script1", 1, 1));
    let p2 = TestProcess::new(SessionId(1), DebugLocator::new("script2", 7, 3));
    debugger.attach(p1.clone());
    debugger.attach(p2.clone());
    debugger.toggle_breakpoint("script1", 1, -1);

    // first process breaks, the second one is still executing a statement
    let parked1 = p1.spawn_safe_point(&debugger);
    wait_parked(&debugger, p1.id());
    assert!(debugger.is_pause_requested());
    assert_eq!(debugger.paused_count(), 1);
    assert!(!debugger.is_paused());

    let parked2 = p2.spawn_safe_point(&debugger);
    wait_parked(&debugger, p2.id());
    assert!(debugger.is_paused());
    assert_eq!(debugger.broken_processes(), vec![p1.id()]);

    let status = |pid| {
        debugger
            .processes()
            .into_iter()
            .find(|p| p.pid == pid)
            .map(|p| p.status())
    };
    assert_eq!(status(p1.id()), Some(ProcessStatus::Broken));
    assert_eq!(status(p2.id()), Some(ProcessStatus::Paused));

    debugger.run();
    join(parked1);
    join(parked2);
    assert!(debugger.broken_processes().is_empty());
}

#[test]
fn test_idle_process_not_required_for_pause() {
    let debugger = DebuggerBuilder::new().build(SessionId(1));
    let process = TestProcess::new(SessionId(1), DebugLocator::new("script1", 1, 1));
    process.set_running(false);
    debugger.attach(process.clone());

    Pause::new(&debugger)
        .handle(Command::Request, || {})
        .unwrap();
    assert!(debugger.is_paused());
    assert_eq!(debugger.paused_count(), 0);
    assert_eq!(debugger.processes()[0].status(), ProcessStatus::Idle);
}

#[test]
fn test_pulse_keeps_processes_parked() {
    let debugger = DebuggerBuilder::new().build(SessionId(1));
    let process = TestProcess::new(SessionId(1), DebugLocator::new("script1", 1, 1));
    debugger.attach(process.clone());

    debugger.pause();
    let parked = process.spawn_safe_point(&debugger);
    wait_parked(&debugger, process.id());

    debugger.pulse();
    thread::sleep(Duration::from_millis(20));
    assert!(!parked.is_finished());
    assert!(debugger.is_paused());

    debugger.run();
    join(parked);
}

#[test]
fn test_hook_errors_are_swallowed() {
    let debugger = DebuggerBuilder::new().build(SessionId(1));
    let process = TestProcess::new(SessionId(1), DebugLocator::new("script1", 1, 1));
    debugger.attach(process.clone());

    process.set_predicate(Predicate::Fail);
    join(process.spawn_safe_point(&debugger));
    process.set_predicate(Predicate::Panic);
    join(process.spawn_safe_point(&debugger));

    assert!(!debugger.is_pause_requested());
    assert!(debugger.broken_processes().is_empty());
    assert!(debugger.is_attached(process.id()));

    // debugger is still usable
    process.set_predicate(Predicate::Steps);
    debugger.toggle_breakpoint("script1", 1, -1);
    let parked = process.spawn_safe_point(&debugger);
    wait_parked(&debugger, process.id());
    debugger.run();
    join(parked);
}

#[test]
fn test_loading_process_never_parks() {
    let debugger = DebuggerBuilder::new().build(SessionId(1));
    let process = TestProcess::new(SessionId(1), DebugLocator::new("script1", 1, 1));
    debugger.attach(process.clone());
    debugger.toggle_breakpoint("script1", 1, -1);
    debugger.pause();

    process.set_loading(true);
    join(process.spawn_safe_point(&debugger));
    assert!(debugger.broken_processes().is_empty());

    process.set_loading(false);
    let parked = process.spawn_safe_point(&debugger);
    wait_parked(&debugger, process.id());
    assert_eq!(debugger.broken_processes(), vec![process.id()]);
    debugger.run();
    join(parked);
}

#[test]
fn test_wait_for_pause_calls_yield_hook() {
    let debugger = DebuggerBuilder::new()
        .with_wait_poll_interval(Duration::from_millis(5))
        .build(SessionId(1));
    let process = TestProcess::new(SessionId(1), DebugLocator::new("script1", 1, 1));
    debugger.attach(process.clone());

    // controller drives the debugged process by itself while waiting
    let mut calls = 0;
    let mut parked = None;
    Pause::new(&debugger)
        .handle(Command::RequestAndWait, || {
            calls += 1;
            if calls == 3 {
                parked = Some(process.spawn_safe_point(&debugger));
            }
        })
        .unwrap();
    assert!(calls >= 3);
    assert_eq!(debugger.paused_count(), 1);

    debugger.run();
    join(parked.unwrap());
}

#[test]
fn test_detached_process_never_parks() {
    let debugger = DebuggerBuilder::new().build(SessionId(1));
    let process = TestProcess::new(SessionId(1), DebugLocator::new("script1", 1, 1));
    debugger.toggle_breakpoint("script1", 1, -1);
    debugger.pause();

    join(process.spawn_safe_point(&debugger));
    assert!(debugger.broken_processes().is_empty());
    assert_eq!(debugger.paused_count(), 0);
}

const OVERFLOW_SCRIPT: &str = "\
set x = 9223372036854775807
set y = x + 1
print y
";

#[test]
#[serial]
fn test_failed_process_does_not_block_pause() {
    let env = DebugEnv::new();
    let (p1, w1) = env.run("loop1", LOOP_SCRIPT);
    let (p2, w2) = env.run("overflow", OVERFLOW_SCRIPT);

    assert!(matches!(join_worker(w2), Err(RuntimeError::Overflow)));
    assert!(!p2.is_running());
    assert!(p2.output().is_empty());
    assert!(wait_until(|| !env.debugger.is_attached(p2.id())));

    Pause::new(&env.debugger)
        .handle(Command::RequestAndWait, || {})
        .unwrap();
    assert_eq!(env.debugger.paused_count(), 1);
    assert_eq!(env.debugger.running_count(), 1);

    env.debugger.run();
    p1.cancel();
    assert!(join_worker(w1).is_err());
}

#[test]
fn test_wait_for_break_without_running_processes() {
    let debugger = DebuggerBuilder::new().build(SessionId(1));
    let process = TestProcess::new(SessionId(1), DebugLocator::new("script1", 1, 1));
    process.set_running(false);
    debugger.attach(process.clone());

    assert!(matches!(
        Pause::new(&debugger).handle(Command::WaitForBreak, || {}),
        Err(Error::NothingToWait)
    ));
    assert!(!Error::NothingToWait.is_fatal());

    // requested pause is reached with no running processes
    debugger.pause();
    Pause::new(&debugger)
        .handle(Command::WaitForBreak, || {})
        .unwrap();
    assert!(debugger.is_paused());
}

#[test]
#[serial]
fn test_panicked_process_is_detached() {
    let engine = Engine::with_output(Arc::new(|_: ProcessId, line: &str| {
        panic!("sink rejects `{line}`")
    }));
    let session = engine.create_session();
    let debugger = session.start_debugger(DebuggerBuilder::new()).unwrap();
    debugger.attach_session(session.clone());

    let script = Script::parse("script1", "print 1").unwrap();
    let (process, worker) = session.run_script(Arc::new(script)).unwrap();
    assert!(matches!(
        join_worker(worker),
        Err(RuntimeError::Panic(msg)) if msg == "sink rejects `1`"
    ));
    assert!(!process.is_running());
    assert!(!debugger.is_attached(process.id()));
    assert!(session.script_processes().is_empty());

    debugger.pause();
    assert!(debugger.is_paused());
    engine.close_session(session.id());
}

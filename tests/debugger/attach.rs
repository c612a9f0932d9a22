use crate::common::{join, join_worker, wait_parked, wait_until, DebugEnv, TestProcess};
use crate::common::LOOP_SCRIPT;
use haltline::debugger::command::attach::Command;
use haltline::debugger::command::Attach;
use haltline::debugger::{
    DebugLocator, DebuggerBuilder, Error, Process, ProcessId, Session, SessionId,
};
use serial_test::serial;

#[test]
fn test_attach_is_idempotent() {
    let debugger = DebuggerBuilder::new().build(SessionId(1));
    let process = TestProcess::new(SessionId(1), DebugLocator::new("script1", 1, 1));

    debugger.attach(process.clone());
    debugger.attach(process.clone());

    assert_eq!(debugger.processes().len(), 1);
    assert!(debugger.is_attached(process.id()));
    assert_eq!(process.debugged_by(), Some(debugger.clone()));

    debugger.detach(process.id());
    assert!(!debugger.is_attached(process.id()));
    assert!(process.debugged_by().is_none());

    // detach of unknown process is no-op
    debugger.detach(process.id());
    debugger.detach(ProcessId(0));
    assert!(debugger.processes().is_empty());
}

#[test]
fn test_attach_takes_over_process() {
    let debugger1 = DebuggerBuilder::new().build(SessionId(1));
    let debugger2 = DebuggerBuilder::new().build(SessionId(2));
    let process = TestProcess::new(SessionId(1), DebugLocator::new("script1", 1, 1));

    debugger1.attach(process.clone());
    debugger2.attach(process.clone());

    assert!(!debugger1.is_attached(process.id()));
    assert!(debugger2.is_attached(process.id()));
    assert_eq!(process.debugged_by(), Some(debugger2.clone()));

    // stale detach from a previous debugger keeps the link
    debugger1.detach(process.id());
    assert_eq!(process.debugged_by(), Some(debugger2));
}

#[test]
fn test_detach_unblocks_parked_process() {
    let debugger = DebuggerBuilder::new().build(SessionId(1));
    let process = TestProcess::new(SessionId(1), DebugLocator::new("script1", 3, 1));
    debugger.attach(process.clone());
    debugger.toggle_breakpoint("script1", 3, -1);

    let parked = process.spawn_safe_point(&debugger);
    wait_parked(&debugger, process.id());
    assert_eq!(debugger.broken_processes(), vec![process.id()]);

    debugger.detach(process.id());
    join(parked);

    assert!(debugger.broken_processes().is_empty());
    assert_eq!(debugger.paused_count(), 0);
    // pause request stays active for the rest of processes
    assert!(debugger.is_pause_requested());
}

#[test]
#[serial]
fn test_session_attach_and_detach() {
    let env = DebugEnv::new();
    assert_eq!(env.debugger.sessions(), vec![env.session.id()]);
    assert_eq!(env.session.debugged_by(), Some(env.debugger.clone()));

    // processes created by attached session are attached automatically
    let (process, worker) = env.run("loop1", LOOP_SCRIPT);
    assert!(env.debugger.is_attached(process.id()));
    assert_eq!(env.debugger.processes()[0].session_id, env.session.id());

    env.debugger.detach_session(env.session.id());
    assert!(env.debugger.sessions().is_empty());
    assert!(env.debugger.processes().is_empty());
    assert!(env.session.debugged_by().is_none());
    assert!(process.debugged_by().is_none());

    // and not attached after session detach
    let (process2, worker2) = env.run("loop2", LOOP_SCRIPT);
    assert!(!env.debugger.is_attached(process2.id()));

    // session with existing processes
    env.debugger.attach_session(env.session.clone());
    assert!(env.debugger.is_attached(process.id()));
    assert!(env.debugger.is_attached(process2.id()));

    process.cancel();
    process2.cancel();
    assert!(join_worker(worker).is_err());
    assert!(join_worker(worker2).is_err());
    assert!(wait_until(|| env.debugger.processes().is_empty()));
    assert_eq!(env.debugger.sessions(), vec![env.session.id()]);
}

#[test]
#[serial]
fn test_session_takeover() {
    let env = DebugEnv::new();
    let session2 = env.engine.create_session();
    let debugger2 = session2
        .start_debugger(DebuggerBuilder::new())
        .unwrap();

    let (process, worker) = env.run("loop1", LOOP_SCRIPT);
    debugger2.attach_session(env.session.clone());

    assert!(env.debugger.sessions().is_empty());
    assert!(!env.debugger.is_attached(process.id()));
    assert_eq!(debugger2.sessions(), vec![env.session.id()]);
    assert!(debugger2.is_attached(process.id()));
    assert_eq!(env.session.debugged_by(), Some(debugger2.clone()));

    process.cancel();
    assert!(join_worker(worker).is_err());
}

#[test]
#[serial]
fn test_attach_command_errors() {
    let env = DebugEnv::new();
    let engine = env.engine.as_ref();
    let attach = Attach::new(&env.debugger, engine);

    let unknown = ProcessId(999_999);
    assert!(matches!(
        attach.handle(Command::AttachProcess(unknown)),
        Err(Error::ProcessNotFound(pid)) if pid == unknown
    ));
    assert!(matches!(
        attach.handle(Command::DetachProcess(unknown)),
        Err(Error::ProcessNotAttached(pid)) if pid == unknown
    ));
    assert!(matches!(
        attach.handle(Command::AttachSession(SessionId(999))),
        Err(Error::SessionNotFound(_))
    ));

    let session2 = env.engine.create_session();
    assert!(matches!(
        attach.handle(Command::DetachSession(session2.id())),
        Err(Error::SessionNotFound(_))
    ));
    attach
        .handle(Command::AttachSession(session2.id()))
        .unwrap();
    assert!(env.debugger.is_session_attached(session2.id()));
    attach
        .handle(Command::DetachSession(session2.id()))
        .unwrap();
    assert!(!env.debugger.is_session_attached(session2.id()));

    let (process, worker) = env.run("loop1", LOOP_SCRIPT);
    attach
        .handle(Command::DetachProcess(process.id()))
        .unwrap();
    assert!(!env.debugger.is_attached(process.id()));
    attach
        .handle(Command::AttachProcess(process.id()))
        .unwrap();
    assert!(env.debugger.is_attached(process.id()));

    process.cancel();
    assert!(join_worker(worker).is_err());
}

use crate::common::{join_worker, wait_paused, DebugEnv};
use crate::common::{CALL_SCRIPT, LOOP_SCRIPT};
use haltline::debugger::command::r#break::{Command, ExecutionResult};
use haltline::debugger::command::{Backtrace, Break, Continue};
use haltline::debugger::{Breakpoint, DebugLocator, Process, ProcessStatus};
use serial_test::serial;
use std::thread;
use std::time::Duration;

fn toggle(env: &DebugEnv, brkpt: Breakpoint) -> ExecutionResult {
    Break::new(&env.debugger).handle(&Command::Toggle(brkpt))
}

#[test]
#[serial]
fn test_breakpoint_at_line() {
    let env = DebugEnv::new();
    let result = toggle(&env, Breakpoint::new("script1", 5, -1));
    assert!(matches!(result, ExecutionResult::New(b) if b == Breakpoint::new("script1", 5, -1)));

    let (process, worker) = env.run("script1", CALL_SCRIPT);
    wait_paused(&env.debugger);

    assert_eq!(env.debugger.broken_processes(), vec![process.id()]);
    let snapshot = &env.debugger.processes()[0];
    assert_eq!(snapshot.status(), ProcessStatus::Broken);
    assert_eq!(snapshot.location, Some(DebugLocator::new("script1", 5, 3)));

    let stack = Backtrace::new(&env.debugger).handle(process.id()).unwrap();
    assert_eq!(stack.pid, process.id());
    assert_eq!(stack.frames.len(), 1);
    let top = stack.top().unwrap();
    assert_eq!(top.index, 0);
    assert_eq!(top.description, "main");
    assert_eq!(top.location, Some(DebugLocator::new("script1", 5, 3)));
    assert_eq!(top.statement, "set x = 1");

    Continue::new(&env.debugger).handle();
    join_worker(worker).unwrap();
    assert_eq!(process.output(), vec!["2".to_string()]);
    assert!(env.debugger.broken_processes().is_empty());
}

#[test]
#[serial]
fn test_breakpoint_at_column() {
    let env = DebugEnv::new();
    toggle(&env, Breakpoint::new("script1", 5, 1));

    // statement of line 5 starts at column 3
    let (process, worker) = env.run("script1", CALL_SCRIPT);
    join_worker(worker).unwrap();
    assert_eq!(process.output(), vec!["2".to_string()]);
    assert!(!env.debugger.is_pause_requested());

    toggle(&env, Breakpoint::new("script1", 5, 3));
    let (process, worker) = env.run("script1", CALL_SCRIPT);
    wait_paused(&env.debugger);
    assert_eq!(
        process.current_location(),
        Some(DebugLocator::new("script1", 5, 3))
    );

    env.debugger.run();
    join_worker(worker).unwrap();
}

#[test]
#[serial]
fn test_breakpoint_inside_function() {
    let env = DebugEnv::new();
    toggle(&env, Breakpoint::new("script1", 2, -1));

    let (process, worker) = env.run("script1", CALL_SCRIPT);
    wait_paused(&env.debugger);

    let stack = env.debugger.call_stack(process.id()).unwrap();
    assert_eq!(stack.frames.len(), 2);
    assert_eq!(stack.frames[0].description, "greet");
    assert_eq!(stack.frames[0].program_locator, "script1:greet");
    assert_eq!(
        stack.frames[0].location,
        Some(DebugLocator::new("script1", 2, 5))
    );
    assert_eq!(stack.frames[1].index, 1);
    assert_eq!(stack.frames[1].description, "main");
    assert_eq!(stack.frames[1].program_locator, "script1");
    assert_eq!(stack.frames[1].statement, "call greet");

    env.debugger.run();
    join_worker(worker).unwrap();
}

#[test]
#[serial]
fn test_breakpoint_hits_every_iteration() {
    let env = DebugEnv::new();
    toggle(&env, Breakpoint::new("loop1", 3, -1));

    let (process, worker) = env.run("loop1", LOOP_SCRIPT);
    for _ in 0..3 {
        env.debugger.run();
        wait_paused(&env.debugger);
        assert_eq!(
            process.current_location(),
            Some(DebugLocator::new("loop1", 3, 1))
        );
    }

    let result = toggle(&env, Breakpoint::new("loop1", 3, -1));
    assert!(matches!(result, ExecutionResult::Removed(_)));
    env.debugger.run();
    thread::sleep(Duration::from_millis(50));
    assert!(!env.debugger.is_pause_requested());
    assert!(env.debugger.broken_processes().is_empty());

    process.cancel();
    assert!(join_worker(worker).is_err());
}

#[test]
fn test_breakpoint_info() {
    let env = DebugEnv::new();
    toggle(&env, Breakpoint::new("script1", 5, -1));
    toggle(&env, Breakpoint::new("script1", 5, 3));
    toggle(&env, Breakpoint::new("script2", 1, -1));
    toggle(&env, Breakpoint::new("script1", 5, -1));

    let ExecutionResult::Dump(breakpoints) = Break::new(&env.debugger).handle(&Command::Info)
    else {
        panic!("breakpoints dump expected");
    };
    assert_eq!(
        breakpoints,
        vec![
            Breakpoint::new("script1", 5, 3),
            Breakpoint::new("script2", 1, -1)
        ]
    );
    assert_eq!(breakpoints[0].to_string(), "script1:5:3");
    assert_eq!(breakpoints[1].to_string(), "script2:1");
}

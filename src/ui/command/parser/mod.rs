use super::{Command, CommandError, CommandResult};
use crate::debugger::command::{attach, pause, policy, r#break, status};
use crate::debugger::{Breakpoint, ProcessId, SessionId};
use std::fmt::Display;
use std::str::FromStr;

pub const START_COMMAND: &str = "start";
pub const STOP_COMMAND: &str = "stop";
pub const EXCEPTION_COMMAND: &str = "exception";
pub const ONSTART_COMMAND: &str = "onstart";
pub const POLICY_ON_KEY: &str = "on";
pub const POLICY_OFF_KEY: &str = "off";
pub const SESSIONS_COMMAND: &str = "sessions";
pub const SESSION_COMMAND: &str = "session";
pub const SESSION_COMMAND_NEW_SUBCOMMAND: &str = "new";
pub const PROCESSES_COMMAND: &str = "processes";
pub const PROCESSES_COMMAND_SHORT: &str = "ps";
pub const ATTACH_COMMAND: &str = "attach";
pub const DETACH_COMMAND: &str = "detach";
pub const ATTACH_SESSION_SUBCOMMAND: &str = "session";
pub const BREAK_COMMAND: &str = "break";
pub const BREAK_COMMAND_SHORT: &str = "b";
pub const BREAK_INFO_SUBCOMMAND: &str = "info";
pub const BREAKPOINTS_COMMAND: &str = "breakpoints";
pub const PAUSE_COMMAND: &str = "pause";
pub const WAIT_COMMAND: &str = "wait";
pub const CONTINUE_COMMAND: &str = "continue";
pub const CONTINUE_COMMAND_SHORT: &str = "c";
pub const STEP_INTO_COMMAND: &str = "stepinto";
pub const STEP_INTO_COMMAND_SHORT: &str = "step";
pub const STEP_OVER_COMMAND: &str = "stepover";
pub const STEP_OVER_COMMAND_SHORT: &str = "next";
pub const BACKTRACE_COMMAND: &str = "backtrace";
pub const BACKTRACE_COMMAND_SHORT: &str = "bt";
pub const STACK_COMMAND: &str = "stack";
pub const RUN_COMMAND: &str = "run";
pub const RUN_COMMAND_SHORT: &str = "r";
pub const RUN_SESSION_KEY: &str = "session";
pub const HELP_COMMAND: &str = "help";
pub const HELP_COMMAND_SHORT: &str = "h";

use chumsky::error::Rich;
use chumsky::prelude::{any, choice, end, just};
use chumsky::{extra, text, Boxed, Parser};

type Err<'a> = extra::Err<Rich<'a, char>>;

/// Decimal number, out of range values are parsing errors.
pub fn number<'a, T>() -> impl Parser<'a, &'a str, T, Err<'a>> + Clone
where
    T: FromStr,
    T::Err: Display,
{
    text::int(10)
        .try_map(|s: &str, span| s.parse::<T>().map_err(|e| Rich::custom(span, e)))
        .padded()
        .labelled("number")
}

fn pid<'a>() -> impl Parser<'a, &'a str, ProcessId, Err<'a>> + Clone {
    number().map(ProcessId).labelled("process id")
}

fn sid<'a>() -> impl Parser<'a, &'a str, SessionId, Err<'a>> + Clone {
    number().map(SessionId).labelled("session id")
}

/// Any sequence of non-whitespace characters.
fn word<'a>() -> impl Parser<'a, &'a str, &'a str, Err<'a>> + Clone {
    any()
        .filter(|c: &char| !c.is_whitespace())
        .repeated()
        .at_least(1)
        .to_slice()
        .padded()
}

/// Breakpoint in `locator:line[:column]` form, column omitted means a whole line.
pub fn brkpt_parser<'a>() -> impl Parser<'a, &'a str, Breakpoint, Err<'a>> {
    any()
        .filter(|c: &char| *c != ':' && !c.is_whitespace())
        .repeated()
        .at_least(1)
        .to_slice()
        .then_ignore(just(':'))
        .then(number::<i32>())
        .then(just(':').ignore_then(number::<i32>()).or_not())
        .map(|((locator, line), column): ((&str, i32), Option<i32>)| {
            Breakpoint::new(locator, line, column.unwrap_or(-1))
        })
        .padded()
        .labelled("breakpoint location")
}

fn switch<'a>() -> impl Parser<'a, &'a str, bool, Err<'a>> + Clone {
    choice((
        just(POLICY_ON_KEY).padded().to(true),
        just(POLICY_OFF_KEY).padded().to(false),
    ))
}

fn command<'a, I>(ctx: &'static str, inner: I) -> Boxed<'a, 'a, &'a str, Command, Err<'a>>
where
    I: Parser<'a, &'a str, Command, Err<'a>> + 'a,
{
    inner.then_ignore(end()).labelled(ctx).boxed()
}

impl Command {
    /// Parse input string into command.
    pub fn parse(input: &str) -> CommandResult<Command> {
        Self::parser()
            .parse(input)
            .into_result()
            .map_err(|e| {
                let reason = e
                    .first()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "unknown error".to_string());
                CommandError::Parsing(reason)
            })
    }

    fn parser<'a>() -> impl Parser<'a, &'a str, Command, Err<'a>> {
        let op = |sym| just(sym).padded();
        let op2 = |full, short| op(full).or(op(short));

        let start = op(START_COMMAND).to(Command::Start);
        let stop = op(STOP_COMMAND).to(Command::Stop);

        let exception = op(EXCEPTION_COMMAND)
            .ignore_then(switch())
            .map(|on| Command::Policy(policy::Command::BreakOnException(on)));
        let onstart = op(ONSTART_COMMAND)
            .ignore_then(switch())
            .map(|on| Command::Policy(policy::Command::BreakOnStart(on)));

        let sessions = op(SESSIONS_COMMAND).to(Command::Status(status::Command::Sessions));
        let processes = op2(PROCESSES_COMMAND, PROCESSES_COMMAND_SHORT)
            .to(Command::Status(status::Command::Processes));
        let new_session = op(SESSION_COMMAND)
            .then(op(SESSION_COMMAND_NEW_SUBCOMMAND))
            .to(Command::NewSession);

        let attach = op(ATTACH_COMMAND)
            .ignore_then(choice((
                op(ATTACH_SESSION_SUBCOMMAND)
                    .ignore_then(sid())
                    .map(|sid| Command::Attach(attach::Command::AttachSession(sid))),
                pid().map(|pid| Command::Attach(attach::Command::AttachProcess(pid))),
            )))
            .boxed();
        let detach = op(DETACH_COMMAND)
            .ignore_then(choice((
                op(ATTACH_SESSION_SUBCOMMAND)
                    .ignore_then(sid())
                    .map(|sid| Command::Attach(attach::Command::DetachSession(sid))),
                pid().map(|pid| Command::Attach(attach::Command::DetachProcess(pid))),
            )))
            .boxed();

        let r#break = op2(BREAK_COMMAND, BREAK_COMMAND_SHORT)
            .ignore_then(choice((
                brkpt_parser().map(|brkpt| Command::Breakpoint(r#break::Command::Toggle(brkpt))),
                op(BREAK_INFO_SUBCOMMAND).to(Command::Breakpoint(r#break::Command::Info)),
            )))
            .boxed();
        let breakpoints = op(BREAKPOINTS_COMMAND).to(Command::Breakpoint(r#break::Command::Info));

        let pause = op(PAUSE_COMMAND).to(Command::Pause(pause::Command::RequestAndWait));
        let wait = op(WAIT_COMMAND).to(Command::Pause(pause::Command::WaitForBreak));
        let r#continue = op2(CONTINUE_COMMAND, CONTINUE_COMMAND_SHORT).to(Command::Continue);

        let step_into = op2(STEP_INTO_COMMAND, STEP_INTO_COMMAND_SHORT)
            .ignore_then(pid())
            .map(Command::StepInto);
        let step_over = op2(STEP_OVER_COMMAND, STEP_OVER_COMMAND_SHORT)
            .ignore_then(pid())
            .map(Command::StepOver);

        let backtrace = op2(BACKTRACE_COMMAND, BACKTRACE_COMMAND_SHORT)
            .ignore_then(pid())
            .map(Command::Backtrace);
        let stack = op(STACK_COMMAND)
            .ignore_then(pid().then(number::<usize>().or_not()))
            .map(|(pid, window)| Command::Stack(pid, window.unwrap_or_default()))
            .boxed();

        let run_session = op(RUN_SESSION_KEY).ignore_then(sid());
        let run = op2(RUN_COMMAND, RUN_COMMAND_SHORT)
            .ignore_then(choice((
                run_session.clone().map(|sid| (None, Some(sid))),
                word()
                    .or_not()
                    .then(run_session.or_not())
                    .map(|(script, sid)| (script.map(ToOwned::to_owned), sid)),
            )))
            .map(|(script, session)| Command::Run { script, session })
            .boxed();

        let help = op2(HELP_COMMAND, HELP_COMMAND_SHORT)
            .ignore_then(text::ident().or_not())
            .map(|s| Command::Help {
                command: s.map(ToOwned::to_owned),
                reason: None,
            })
            .padded()
            .boxed();

        let skip = text::whitespace()
            .then_ignore(end())
            .to(Command::SkipInput)
            .boxed();

        choice((
            skip,
            command(START_COMMAND, start),
            command(STOP_COMMAND, stop),
            command(EXCEPTION_COMMAND, exception),
            command(ONSTART_COMMAND, onstart),
            command(SESSIONS_COMMAND, sessions),
            command(SESSION_COMMAND, new_session),
            command(PROCESSES_COMMAND, processes),
            command(ATTACH_COMMAND, attach),
            command(DETACH_COMMAND, detach),
            command(BREAKPOINTS_COMMAND, breakpoints),
            command(BREAK_COMMAND, r#break),
            command(PAUSE_COMMAND, pause),
            command(WAIT_COMMAND, wait),
            command(CONTINUE_COMMAND, r#continue),
            command(STEP_INTO_COMMAND, step_into),
            command(STEP_OVER_COMMAND, step_over),
            command(BACKTRACE_COMMAND, backtrace),
            command(STACK_COMMAND, stack),
            command(RUN_COMMAND, run),
            command(HELP_COMMAND, help),
        ))
        .map_err(|e| {
            let span = e.span();
            if span.start == 0 && span.end == 0 {
                Rich::custom(*e.span(), "type help for list of commands")
            } else {
                e
            }
        })
    }
}

#[test]
fn test_brkpt_parser() {
    struct TestCase {
        string: &'static str,
        result: Result<Breakpoint, ()>,
    }
    let cases = vec![
        TestCase {
            string: "script1:5",
            result: Ok(Breakpoint::new("script1", 5, -1)),
        },
        TestCase {
            string: "  script1:5:3 ",
            result: Ok(Breakpoint::new("script1", 5, 3)),
        },
        TestCase {
            string: "lib.hl:12",
            result: Ok(Breakpoint::new("lib.hl", 12, -1)),
        },
        TestCase {
            string: "script1",
            result: Err(()),
        },
        TestCase {
            string: ":5",
            result: Err(()),
        },
        TestCase {
            string: "script1:99999999999",
            result: Err(()),
        },
    ];

    for tc in cases {
        let brkpt = brkpt_parser().parse(tc.string).into_result();
        assert_eq!(brkpt.map_err(|_| ()), tc.result, "input: {}", tc.string);
    }
}

#[test]
fn test_parser() {
    struct TestCase {
        inputs: Vec<&'static str>,
        command_matcher: fn(result: Result<Command, CommandError>),
    }
    let cases = vec![
        TestCase {
            inputs: vec!["start", "  start "],
            command_matcher: |result| assert_eq!(result.unwrap(), Command::Start),
        },
        TestCase {
            inputs: vec!["stop"],
            command_matcher: |result| assert_eq!(result.unwrap(), Command::Stop),
        },
        TestCase {
            inputs: vec!["", "   "],
            command_matcher: |result| assert_eq!(result.unwrap(), Command::SkipInput),
        },
        TestCase {
            inputs: vec!["exception on", " exception   on "],
            command_matcher: |result| {
                assert_eq!(
                    result.unwrap(),
                    Command::Policy(policy::Command::BreakOnException(true))
                )
            },
        },
        TestCase {
            inputs: vec!["onstart off"],
            command_matcher: |result| {
                assert_eq!(
                    result.unwrap(),
                    Command::Policy(policy::Command::BreakOnStart(false))
                )
            },
        },
        TestCase {
            inputs: vec!["exception", "exception maybe"],
            command_matcher: |result| assert!(result.is_err()),
        },
        TestCase {
            inputs: vec!["sessions"],
            command_matcher: |result| {
                assert_eq!(
                    result.unwrap(),
                    Command::Status(status::Command::Sessions)
                )
            },
        },
        TestCase {
            inputs: vec!["session new"],
            command_matcher: |result| assert_eq!(result.unwrap(), Command::NewSession),
        },
        TestCase {
            inputs: vec!["processes", "ps"],
            command_matcher: |result| {
                assert_eq!(
                    result.unwrap(),
                    Command::Status(status::Command::Processes)
                )
            },
        },
        TestCase {
            inputs: vec!["attach 3", "  attach  3 "],
            command_matcher: |result| {
                assert_eq!(
                    result.unwrap(),
                    Command::Attach(attach::Command::AttachProcess(ProcessId(3)))
                )
            },
        },
        TestCase {
            inputs: vec!["attach session 2"],
            command_matcher: |result| {
                assert_eq!(
                    result.unwrap(),
                    Command::Attach(attach::Command::AttachSession(SessionId(2)))
                )
            },
        },
        TestCase {
            inputs: vec!["detach 4"],
            command_matcher: |result| {
                assert_eq!(
                    result.unwrap(),
                    Command::Attach(attach::Command::DetachProcess(ProcessId(4)))
                )
            },
        },
        TestCase {
            inputs: vec!["detach session 1"],
            command_matcher: |result| {
                assert_eq!(
                    result.unwrap(),
                    Command::Attach(attach::Command::DetachSession(SessionId(1)))
                )
            },
        },
        TestCase {
            inputs: vec!["attach", "attach x", "attach -1"],
            command_matcher: |result| assert!(result.is_err()),
        },
        TestCase {
            inputs: vec!["b script1:5", "break script1:5", "   break script1:5   "],
            command_matcher: |result| {
                assert_eq!(
                    result.unwrap(),
                    Command::Breakpoint(r#break::Command::Toggle(Breakpoint::new(
                        "script1", 5, -1
                    )))
                )
            },
        },
        TestCase {
            inputs: vec!["b script1:5:7"],
            command_matcher: |result| {
                assert_eq!(
                    result.unwrap(),
                    Command::Breakpoint(r#break::Command::Toggle(Breakpoint::new(
                        "script1", 5, 7
                    )))
                )
            },
        },
        TestCase {
            inputs: vec!["breakpoints", "break info", "b info"],
            command_matcher: |result| {
                assert_eq!(
                    result.unwrap(),
                    Command::Breakpoint(r#break::Command::Info)
                )
            },
        },
        TestCase {
            inputs: vec!["b info:3"],
            command_matcher: |result| {
                assert_eq!(
                    result.unwrap(),
                    Command::Breakpoint(r#break::Command::Toggle(Breakpoint::new(
                        "info", 3, -1
                    )))
                )
            },
        },
        TestCase {
            inputs: vec!["pause"],
            command_matcher: |result| {
                assert_eq!(
                    result.unwrap(),
                    Command::Pause(pause::Command::RequestAndWait)
                )
            },
        },
        TestCase {
            inputs: vec!["wait"],
            command_matcher: |result| {
                assert_eq!(
                    result.unwrap(),
                    Command::Pause(pause::Command::WaitForBreak)
                )
            },
        },
        TestCase {
            inputs: vec!["c", "continue"],
            command_matcher: |result| assert_eq!(result.unwrap(), Command::Continue),
        },
        TestCase {
            inputs: vec!["next 2", "stepover 2"],
            command_matcher: |result| {
                assert_eq!(result.unwrap(), Command::StepOver(ProcessId(2)))
            },
        },
        TestCase {
            inputs: vec!["step 2", "stepinto 2"],
            command_matcher: |result| {
                assert_eq!(result.unwrap(), Command::StepInto(ProcessId(2)))
            },
        },
        TestCase {
            inputs: vec!["step", "next"],
            command_matcher: |result| assert!(result.is_err()),
        },
        TestCase {
            inputs: vec!["bt 1", "backtrace 1"],
            command_matcher: |result| {
                assert_eq!(result.unwrap(), Command::Backtrace(ProcessId(1)))
            },
        },
        TestCase {
            inputs: vec!["stack 1 2", "  stack 1  2"],
            command_matcher: |result| {
                assert_eq!(result.unwrap(), Command::Stack(ProcessId(1), 2))
            },
        },
        TestCase {
            inputs: vec!["stack 1"],
            command_matcher: |result| {
                assert_eq!(result.unwrap(), Command::Stack(ProcessId(1), 0))
            },
        },
        TestCase {
            inputs: vec!["run", "r"],
            command_matcher: |result| {
                assert_eq!(
                    result.unwrap(),
                    Command::Run {
                        script: None,
                        session: None
                    }
                )
            },
        },
        TestCase {
            inputs: vec!["run script1", "r  script1 "],
            command_matcher: |result| {
                assert_eq!(
                    result.unwrap(),
                    Command::Run {
                        script: Some("script1".to_string()),
                        session: None
                    }
                )
            },
        },
        TestCase {
            inputs: vec!["run session 2"],
            command_matcher: |result| {
                assert_eq!(
                    result.unwrap(),
                    Command::Run {
                        script: None,
                        session: Some(SessionId(2))
                    }
                )
            },
        },
        TestCase {
            inputs: vec!["run script1 session 2"],
            command_matcher: |result| {
                assert_eq!(
                    result.unwrap(),
                    Command::Run {
                        script: Some("script1".to_string()),
                        session: Some(SessionId(2))
                    }
                )
            },
        },
        TestCase {
            inputs: vec!["help", "h"],
            command_matcher: |result| {
                assert_eq!(
                    result.unwrap(),
                    Command::Help {
                        command: None,
                        reason: None
                    }
                )
            },
        },
        TestCase {
            inputs: vec!["help break"],
            command_matcher: |result| {
                assert_eq!(
                    result.unwrap(),
                    Command::Help {
                        command: Some("break".to_string()),
                        reason: None
                    }
                )
            },
        },
        TestCase {
            inputs: vec!["das", "voo", "starts"],
            command_matcher: |result| assert!(result.is_err()),
        },
    ];

    for case in cases {
        for input in case.inputs {
            (case.command_matcher)(Command::parse(input));
        }
    }
}

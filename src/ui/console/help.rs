use crate::ui::command;
use command::parser;

pub const HELP: &str = r#"
Available debugger commands:

start                                       -- start a debugger and attach console session to it
stop                                        -- stop the debugger, all processes are resumed
exception on|off                            -- break a process at a failed statement
onstart on|off                              -- break every new process at its first statement
sessions                                    -- show sessions attached to the debugger
session new                                 -- create a new interpreter session
ps, processes                               -- show processes attached to the debugger
attach <pid>|session <sid>                  -- attach a process or a whole session
detach <pid>|session <sid>                  -- detach a process or a whole session
r, run <>|<script> <>|session <sid>         -- run loaded scripts
b, break <locator:line[:column]>|info       -- add or remove breakpoint, show breakpoints
breakpoints                                 -- show breakpoints
pause                                       -- pause all attached processes
wait                                        -- wait until any process breaks
c, continue                                 -- resume all paused processes
step, stepinto <pid>                        -- step a process, entering calls
next, stepover <pid>                        -- step a process, stepping over calls
bt, backtrace <pid>                         -- print call stack of a paused process
stack <pid> <>|<window>                     -- print variables of a frame window
h, help <>|<command>                        -- show help
q, quit                                     -- exit
"#;

pub const HELP_START: &str = "\
\x1b[32;1mstart\x1b[0m
Start a debugger owned by the console session. The session is attached right after start,
so every process of it (existing and future ones) is debugged.
";

pub const HELP_STOP: &str = "\
\x1b[32;1mstop\x1b[0m
Stop the debugger. Paused processes are resumed, all sessions and processes are detached.
Breakpoints are lost.
";

pub const HELP_POLICY: &str = "\
\x1b[32;1mexception\x1b[0m, \x1b[32;1monstart\x1b[0m
Change break policies of the debugger.

exception on|off - break a process when its statement fails
onstart on|off - break every process created by an attached session at its first statement
";

pub const HELP_STATUS: &str = "\
\x1b[32;1mprocesses\x1b[0m, \x1b[32;1msessions\x1b[0m
Show attached processes (with their status and location) or attached sessions.

Process status is one of:
idle - process is attached but not executing
running - process is executing
paused - process is parked at a safe point
broken - process is parked by its own break condition (breakpoint, step, failed statement)
";

pub const HELP_ATTACH: &str = "\
\x1b[32;1mattach\x1b[0m, \x1b[32;1mdetach\x1b[0m
Attach or detach processes and sessions.

Available subcomands:
attach <pid> - attach a process, process debugged by another debugger is taken over
attach session <sid> - attach a session and all its processes
detach <pid> - detach a process, if process is paused it continues execution
detach session <sid> - detach a session and all its processes
";

pub const HELP_RUN: &str = "\
\x1b[32;1mr, run\x1b[0m
Run scripts loaded at start. Every script is executed by a new process.

Examples of usage:
run - run all scripts in console session
run script1 - run script with name `script1`
run session 2 - run all scripts in session 2
run script1 session 2 - run script `script1` in session 2
";

pub const HELP_BREAK: &str = "\
\x1b[32;1mb, break\x1b[0m
Toggle a breakpoint: add it if not exists or remove otherwise.

Available subcomands:
break <locator>:<line> - break at any column of the line
break <locator>:<line>:<column> - break at the exact column
break info - show all breakpoints

Examples of usage:
break script1:5
break script1:5:3
";

pub const HELP_PAUSE: &str = "\
\x1b[32;1mpause\x1b[0m, \x1b[32;1mwait\x1b[0m
pause - request a pause and wait until every running process is parked
wait - wait until the debugger is paused by any process break condition, fails if no
process is running; type `quit` or press Ctrl-C to stop waiting and exit
";

pub const HELP_CONTINUE: &str = "\
\x1b[32;1mc, continue\x1b[0m
Resume all parked processes.
";

pub const HELP_STEP: &str = "\
\x1b[32;1mstep, stepinto\x1b[0m, \x1b[32;1mnext, stepover\x1b[0m
Step a process to the next statement. Debugger must be paused.

Note that all parked processes are resumed, not only the stepped one. Use `wait` to wait
for the step completion.

step <pid> - break at the next statement, entering calls
next <pid> - break at the next statement of the current or an outer frame
";

pub const HELP_BACKTRACE: &str = "\
\x1b[32;1mbt, backtrace\x1b[0m
Print call stack of a process, innermost frame first. Debugger must be paused.
";

pub const HELP_STACK: &str = "\
\x1b[32;1mstack\x1b[0m
Print variables of a frame window of a process. Debugger must be paused.

Examples of usage:
stack 1 - variables of the innermost frame of process 1
stack 1 2 - variables of frame #2 of process 1
";

pub const HELP_QUIT: &str = "\
\x1b[32;1mq, quit\x1b[0m
Exit. Debugger is stopped, all processes are cancelled.
";

pub fn help_for_command(command: Option<&str>) -> &str {
    match command {
        None => HELP,
        Some(parser::START_COMMAND) => HELP_START,
        Some(parser::STOP_COMMAND) => HELP_STOP,
        Some(parser::EXCEPTION_COMMAND) | Some(parser::ONSTART_COMMAND) => HELP_POLICY,
        Some(parser::PROCESSES_COMMAND)
        | Some(parser::PROCESSES_COMMAND_SHORT)
        | Some(parser::SESSIONS_COMMAND) => HELP_STATUS,
        Some(parser::ATTACH_COMMAND) | Some(parser::DETACH_COMMAND) => HELP_ATTACH,
        Some(parser::RUN_COMMAND) | Some(parser::RUN_COMMAND_SHORT) => HELP_RUN,
        Some(parser::BREAK_COMMAND)
        | Some(parser::BREAK_COMMAND_SHORT)
        | Some(parser::BREAKPOINTS_COMMAND) => HELP_BREAK,
        Some(parser::PAUSE_COMMAND) | Some(parser::WAIT_COMMAND) => HELP_PAUSE,
        Some(parser::CONTINUE_COMMAND) | Some(parser::CONTINUE_COMMAND_SHORT) => HELP_CONTINUE,
        Some(parser::STEP_INTO_COMMAND)
        | Some(parser::STEP_INTO_COMMAND_SHORT)
        | Some(parser::STEP_OVER_COMMAND)
        | Some(parser::STEP_OVER_COMMAND_SHORT) => HELP_STEP,
        Some(parser::BACKTRACE_COMMAND) | Some(parser::BACKTRACE_COMMAND_SHORT) => HELP_BACKTRACE,
        Some(parser::STACK_COMMAND) => HELP_STACK,
        Some("q") | Some("quit") => HELP_QUIT,
        _ => "unknown command",
    }
}

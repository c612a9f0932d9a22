use crate::ui::command::parser::{
    ATTACH_COMMAND, ATTACH_SESSION_SUBCOMMAND, BACKTRACE_COMMAND, BACKTRACE_COMMAND_SHORT,
    BREAKPOINTS_COMMAND, BREAK_COMMAND, BREAK_COMMAND_SHORT, BREAK_INFO_SUBCOMMAND,
    CONTINUE_COMMAND, CONTINUE_COMMAND_SHORT, DETACH_COMMAND, EXCEPTION_COMMAND, HELP_COMMAND,
    HELP_COMMAND_SHORT, ONSTART_COMMAND, PAUSE_COMMAND, POLICY_OFF_KEY, POLICY_ON_KEY,
    PROCESSES_COMMAND, PROCESSES_COMMAND_SHORT, RUN_COMMAND, RUN_COMMAND_SHORT, SESSIONS_COMMAND,
    SESSION_COMMAND, SESSION_COMMAND_NEW_SUBCOMMAND, STACK_COMMAND, START_COMMAND, STEP_INTO_COMMAND,
    STEP_INTO_COMMAND_SHORT, STEP_OVER_COMMAND, STEP_OVER_COMMAND_SHORT, STOP_COMMAND, WAIT_COMMAND,
};
use crossterm::style::{Color, Stylize};
use itertools::Itertools;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::HistoryHinter;
use rustyline::history::DefaultHistory;
use rustyline::{CompletionType, Config, Context, Editor};
use rustyline_derive::{Helper, Hinter, Validator};
use std::borrow::Cow;
use std::borrow::Cow::{Borrowed, Owned};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

struct CommandHint {
    short: Option<String>,
    long: String,
    subcommands: Vec<String>,
}

impl CommandHint {
    fn with_subcommands(long: &str, subcommands: &[&str]) -> Self {
        CommandHint {
            short: None,
            long: long.to_string(),
            subcommands: subcommands.iter().map(ToString::to_string).collect(),
        }
    }

    fn display_with_short(&self) -> String {
        if let Some(ref short) = self.short {
            if self.long.starts_with(short) {
                format!(
                    "{}{}",
                    short.clone().bold().underlined(),
                    &self.long[short.len()..]
                )
            } else {
                format!("{}|{}", &self.long, short.clone().bold().underlined())
            }
        } else {
            self.long.clone()
        }
    }
}

impl From<&str> for CommandHint {
    fn from(value: &str) -> Self {
        CommandHint {
            short: None,
            long: value.to_string(),
            subcommands: vec![],
        }
    }
}

impl From<(&str, &str)> for CommandHint {
    fn from((short, long): (&str, &str)) -> Self {
        CommandHint {
            short: Some(short.to_string()),
            long: long.to_string(),
            subcommands: vec![],
        }
    }
}

pub struct CommandCompleter {
    commands: Vec<CommandHint>,
    subcommand_hints: HashMap<String, Vec<String>>,
    script_hints: Vec<String>,
}

impl CommandCompleter {
    fn new(commands: impl IntoIterator<Item = CommandHint>) -> Self {
        let commands: Vec<CommandHint> = commands.into_iter().collect();
        let subcommand_hints = commands
            .iter()
            .flat_map(|cmd| {
                let mut hints = vec![(cmd.long.clone(), cmd.subcommands.clone())];
                if let Some(ref short) = cmd.short {
                    hints.push((short.clone(), cmd.subcommands.clone()));
                }
                hints
            })
            .collect::<HashMap<String, Vec<String>>>();

        Self {
            commands,
            subcommand_hints,
            script_hints: vec![],
        }
    }

    /// Set script names used as breakpoint locators and `run` arguments.
    pub fn replace_script_hints(&mut self, scripts: impl IntoIterator<Item = String>) {
        self.script_hints = scripts.into_iter().sorted().dedup().collect();
    }
}

impl Completer for CommandCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        _pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Self::Candidate>)> {
        if let Some((cmd, arg)) = line.split_once(char::is_whitespace) {
            let arg = arg.trim_start();
            let pos = line.len() - arg.len();

            let is_break = cmd == BREAK_COMMAND || cmd == BREAK_COMMAND_SHORT;
            let is_run = cmd == RUN_COMMAND || cmd == RUN_COMMAND_SHORT;
            if is_break || is_run {
                let suffix = if is_break { ":" } else { "" };
                let pairs = self
                    .script_hints
                    .iter()
                    .filter(|script| script.starts_with(arg))
                    .map(|script| Pair {
                        display: script.clone(),
                        replacement: format!("{script}{suffix}"),
                    })
                    .collect();
                return Ok((pos, pairs));
            }

            if let Some(subcommands) = self.subcommand_hints.get(cmd) {
                let pairs = subcommands
                    .iter()
                    .filter(|subcmd| subcmd.starts_with(arg))
                    .map(|subcmd| Pair {
                        display: subcmd.clone(),
                        replacement: subcmd.clone(),
                    })
                    .collect();
                return Ok((pos, pairs));
            }
            return Ok((0, vec![]));
        }

        let pairs = self
            .commands
            .iter()
            .filter(|cmd| cmd.long.starts_with(line))
            .map(|cmd| Pair {
                display: cmd.display_with_short(),
                replacement: cmd.long.clone(),
            })
            .collect();
        Ok((0, pairs))
    }
}

#[derive(Helper, Hinter, Validator)]
pub struct RLHelper {
    pub completer: Arc<Mutex<CommandCompleter>>,
    #[rustyline(Hinter)]
    hinter: HistoryHinter,
    pub colored_prompt: String,
}

impl Completer for RLHelper {
    type Candidate = <CommandCompleter as Completer>::Candidate;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Self::Candidate>)> {
        self.completer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .complete(line, pos, ctx)
    }
}

impl Highlighter for RLHelper {
    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(
        &'s self,
        prompt: &'p str,
        default: bool,
    ) -> Cow<'b, str> {
        if default {
            Borrowed(&self.colored_prompt)
        } else {
            Borrowed(prompt)
        }
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Owned(format!("{}", hint.with(Color::Grey)))
    }
}

pub type HLEditor = Editor<RLHelper, DefaultHistory>;

pub fn create_editor(promt: &str) -> anyhow::Result<HLEditor> {
    let config = Config::builder()
        .history_ignore_space(true)
        .completion_type(CompletionType::List)
        .build();

    let policy = [POLICY_ON_KEY, POLICY_OFF_KEY];
    let commands = [
        START_COMMAND.into(),
        STOP_COMMAND.into(),
        CommandHint::with_subcommands(EXCEPTION_COMMAND, &policy),
        CommandHint::with_subcommands(ONSTART_COMMAND, &policy),
        SESSIONS_COMMAND.into(),
        CommandHint::with_subcommands(SESSION_COMMAND, &[SESSION_COMMAND_NEW_SUBCOMMAND]),
        (PROCESSES_COMMAND_SHORT, PROCESSES_COMMAND).into(),
        CommandHint::with_subcommands(ATTACH_COMMAND, &[ATTACH_SESSION_SUBCOMMAND]),
        CommandHint::with_subcommands(DETACH_COMMAND, &[ATTACH_SESSION_SUBCOMMAND]),
        (RUN_COMMAND_SHORT, RUN_COMMAND).into(),
        CommandHint {
            short: Some(BREAK_COMMAND_SHORT.to_string()),
            long: BREAK_COMMAND.to_string(),
            subcommands: vec![BREAK_INFO_SUBCOMMAND.to_string()],
        },
        BREAKPOINTS_COMMAND.into(),
        PAUSE_COMMAND.into(),
        WAIT_COMMAND.into(),
        (CONTINUE_COMMAND_SHORT, CONTINUE_COMMAND).into(),
        (STEP_INTO_COMMAND_SHORT, STEP_INTO_COMMAND).into(),
        (STEP_OVER_COMMAND_SHORT, STEP_OVER_COMMAND).into(),
        (BACKTRACE_COMMAND_SHORT, BACKTRACE_COMMAND).into(),
        STACK_COMMAND.into(),
        (HELP_COMMAND_SHORT, HELP_COMMAND).into(),
        ("q", "quit").into(),
    ];

    let h = RLHelper {
        completer: Arc::new(Mutex::new(CommandCompleter::new(commands))),
        hinter: HistoryHinter {},
        colored_prompt: format!("{}", promt.with(Color::DarkGreen)),
    };

    let mut editor = Editor::with_history(config, DefaultHistory::new())?;
    editor.set_helper(Some(h));
    Ok(editor)
}

use crate::debugger::command::{
    attach, pause, policy, r#break, status, Attach, Backtrace, Break, Continue, Pause, Policy,
    Stack, Status, StepInto, StepOver,
};
use crate::debugger::{
    Debugger, DebuggerBuilder, Error, Process, ProcessId, ProcessSnapshot, Session,
};
use crate::runtime::{Engine, OutputSink, Script, ScriptSession, Worker};
use crate::ui::command::{Command, CommandError};
use crate::ui::config;
use crate::ui::console::editor::{create_editor, HLEditor};
use crate::ui::console::help::help_for_command;
use crate::ui::console::print::style::{
    ErrorView, FunctionNameView, IdView, KeywordView, LocatorView,
};
use crate::ui::console::print::ExternalPrinter;
use crossterm::style::Stylize;
use indexmap::IndexMap;
use rustyline::error::ReadlineError;
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, SyncSender};
use std::sync::{mpsc, Arc, Once, PoisonError};
use std::thread;

mod editor;
mod help;
pub mod print;

const WELCOME_TEXT: &str = r#"
haltline greets
"#;
const PROMT: &str = "(hl) ";
const HISTORY_PATH: &str = ".config/hl/history";

pub struct AppBuilder {
    scripts: Vec<Script>,
}

impl AppBuilder {
    pub fn new(scripts: Vec<Script>) -> Self {
        Self { scripts }
    }

    pub fn build(self) -> anyhow::Result<TerminalApplication> {
        let (control_tx, control_rx) = mpsc::sync_channel::<Control>(0);
        let mut editor = create_editor(PROMT)?;

        if let Some(h) = editor.helper_mut() {
            h.completer
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .replace_script_hints(self.scripts.iter().map(|s| s.name.clone()));
        }

        let out_printer = ExternalPrinter::new(&mut editor)?;
        let sink: OutputSink = Arc::new(move |pid: ProcessId, line: &str| {
            out_printer.print(format!("{} {line}", IdView::from(format!("[{pid}]"))))
        });
        let engine = Engine::with_output(sink);
        let session = engine.create_session();

        Ok(TerminalApplication {
            printer: ExternalPrinter::new(&mut editor)?,
            engine,
            session,
            scripts: self
                .scripts
                .into_iter()
                .map(|script| (script.name.clone(), Arc::new(script)))
                .collect(),
            editor,
            control_tx,
            control_rx,
        })
    }
}

enum Control {
    /// New command from user received
    Cmd(String),
    /// Terminate application
    Terminate,
}

pub struct TerminalApplication {
    engine: Arc<Engine>,
    /// Session of the console, owns a debugger.
    session: Arc<ScriptSession>,
    scripts: IndexMap<String, Arc<Script>>,
    editor: HLEditor,
    printer: ExternalPrinter,
    control_tx: SyncSender<Control>,
    control_rx: Receiver<Control>,
}

pub static LOGGER_ONCE: Once = Once::new();
pub static HELLO_ONCE: Once = Once::new();

fn history_path() -> Option<PathBuf> {
    home::home_dir().map(|home| home.join(HISTORY_PATH))
}

impl TerminalApplication {
    pub fn run(self) -> anyhow::Result<()> {
        LOGGER_ONCE.call_once(|| {
            env_logger::init();
        });

        let save_history = config::current().save_history;
        let mut editor = self.editor;
        if save_history {
            if let Some(path) = history_path() {
                // history file may not exist yet
                _ = editor.load_history(&path);
            }
        }

        {
            let control_tx = self.control_tx.clone();
            thread::spawn(move || {
                HELLO_ONCE.call_once(|| {
                    println!("{WELCOME_TEXT}");
                });

                loop {
                    let line = editor.readline(PROMT);
                    match line {
                        Ok(input) => {
                            if input == "q" || input == "quit" {
                                _ = control_tx.send(Control::Terminate);
                                break;
                            } else {
                                _ = editor.add_history_entry(&input);
                                _ = control_tx.send(Control::Cmd(input));
                            }
                        }
                        Err(ReadlineError::Eof | ReadlineError::Interrupted) => {
                            _ = control_tx.send(Control::Terminate);
                            break;
                        }
                        Err(err) => {
                            println!("error: {:#}", err);
                            _ = control_tx.send(Control::Terminate);
                            break;
                        }
                    }
                }

                if save_history {
                    if let Some(path) = history_path() {
                        if let Some(dir) = path.parent() {
                            _ = std::fs::create_dir_all(dir);
                        }
                        _ = editor.save_history(&path);
                    }
                }
            });
        }

        let app_loop = AppLoop {
            engine: self.engine,
            session: self.session,
            scripts: self.scripts,
            workers: vec![],
            control_rx: self.control_rx,
            printer: self.printer,
            terminate: false,
        };
        app_loop.run();

        Ok(())
    }
}

struct AppLoop {
    engine: Arc<Engine>,
    session: Arc<ScriptSession>,
    scripts: IndexMap<String, Arc<Script>>,
    workers: Vec<Worker>,
    control_rx: Receiver<Control>,
    printer: ExternalPrinter,
    /// Set when terminate request is received while a command is in progress.
    terminate: bool,
}

impl AppLoop {
    fn debugger(&self) -> Result<Debugger, Error> {
        self.session.debugger().ok_or(Error::NotStarted)
    }

    fn print_processes(&self, processes: Vec<ProcessSnapshot>) {
        for process in processes {
            let location = process.location.as_ref().map(ToString::to_string);
            let view = format!(
                "process {} (session {}) {} at {}",
                IdView::from(process.pid),
                IdView::from(process.session_id),
                KeywordView::from(process.status()),
                LocatorView::from(location),
            );
            if process.did_break {
                self.printer.print(view.bold())
            } else {
                self.printer.print(view)
            }
        }
    }

    fn run_scripts(
        &mut self,
        script: Option<String>,
        session: Option<Arc<ScriptSession>>,
    ) -> Result<(), CommandError> {
        let session = session.unwrap_or_else(|| self.session.clone());
        let scripts: Vec<Arc<Script>> = match script {
            None => self.scripts.values().cloned().collect(),
            Some(name) => {
                let script = self.scripts.get(&name).cloned().ok_or_else(|| {
                    CommandError::Parsing(format!("script `{name}` is not loaded"))
                })?;
                vec![script]
            }
        };

        for script in scripts {
            let name = script.name.clone();
            let (process, worker) = session.run_script(script)?;
            self.workers.push(worker);
            self.printer.print(format!(
                "process {} started ({})",
                IdView::from(process.id()),
                LocatorView::from(name)
            ));
        }
        Ok(())
    }

    fn handle_command(&mut self, cmd: &str) -> Result<(), CommandError> {
        match Command::parse(cmd)? {
            Command::Start => {
                let cfg = config::current();
                let builder = DebuggerBuilder::new()
                    .with_break_on_start(cfg.break_on_start)
                    .with_break_on_exception(cfg.break_on_exception)
                    .with_wait_poll_interval(cfg.wait_poll_interval);
                let debugger = self.session.start_debugger(builder)?;
                debugger.attach_session(self.session.clone());
                self.printer.print(format!(
                    "debugger started, session {} attached",
                    IdView::from(self.session.id())
                ));
            }
            Command::Stop => {
                self.session.stop_debugger()?;
                self.printer.print("debugger stopped");
            }
            Command::Policy(cmd) => {
                Policy::new(&self.debugger()?).handle(cmd);
                let (name, on) = match cmd {
                    policy::Command::BreakOnException(on) => ("break on exception", on),
                    policy::Command::BreakOnStart(on) => ("break on start", on),
                };
                self.printer.print(format!(
                    "{name}: {}",
                    KeywordView::from(if on { "on" } else { "off" })
                ));
            }
            Command::Status(cmd) => {
                let debugger = self.debugger()?;
                match Status::new(&debugger).handle(cmd) {
                    status::ExecutionResult::Processes(processes) => self.print_processes(processes),
                    status::ExecutionResult::Sessions(sessions) => {
                        sessions.into_iter().for_each(|sid| {
                            self.printer.print(format!("session {}", IdView::from(sid)))
                        })
                    }
                }
            }
            Command::Attach(cmd) => {
                Attach::new(&self.debugger()?, self.engine.as_ref()).handle(cmd)?;
                let msg = match cmd {
                    attach::Command::AttachProcess(pid) => format!("process {pid} attached"),
                    attach::Command::DetachProcess(pid) => format!("process {pid} detached"),
                    attach::Command::AttachSession(sid) => format!("session {sid} attached"),
                    attach::Command::DetachSession(sid) => format!("session {sid} detached"),
                };
                self.printer.print(msg);
            }
            Command::Breakpoint(cmd) => {
                let debugger = self.debugger()?;
                match Break::new(&debugger).handle(&cmd) {
                    r#break::ExecutionResult::New(brkpt) => self.printer.print(format!(
                        "New breakpoint at {}",
                        LocatorView::from(brkpt)
                    )),
                    r#break::ExecutionResult::Removed(brkpt) => self.printer.print(format!(
                        "Remove breakpoint at {}",
                        LocatorView::from(brkpt)
                    )),
                    r#break::ExecutionResult::Dump(brkpts) => {
                        brkpts.into_iter().enumerate().for_each(|(i, brkpt)| {
                            self.printer.print(format!(
                                "- Breakpoint {i} at {}",
                                LocatorView::from(brkpt)
                            ))
                        })
                    }
                }
            }
            Command::Pause(cmd) => {
                let debugger = self.debugger()?;
                let mut terminate = false;
                let waited = Pause::new(&debugger).handle(cmd, || {
                    // editor thread is blocked on send until a message is taken
                    while let Ok(control) = self.control_rx.try_recv() {
                        match control {
                            Control::Terminate => {
                                terminate = true;
                                _ = self.session.stop_debugger();
                            }
                            Control::Cmd(_) => self.printer.print(ErrorView::from(
                                "waiting for a break, command ignored (quit to exit)",
                            )),
                        }
                    }
                });
                if terminate {
                    self.terminate = true;
                    return Ok(());
                }
                waited?;
                if cmd == pause::Command::RequestAndWait {
                    self.printer.print("paused");
                }
                self.print_processes(debugger.processes());
            }
            Command::Continue => {
                Continue::new(&self.debugger()?).handle();
            }
            Command::StepOver(pid) => {
                StepOver::new(&self.debugger()?).handle(pid)?;
            }
            Command::StepInto(pid) => {
                StepInto::new(&self.debugger()?).handle(pid)?;
            }
            Command::Backtrace(pid) => {
                let stack = Backtrace::new(&self.debugger()?).handle(pid)?;
                self.printer
                    .print(format!("process {}", IdView::from(stack.pid)));
                for frame in stack.frames {
                    self.printer.print(format!(
                        "#{} {} at {} ({}): {}",
                        frame.index,
                        FunctionNameView::from(frame.description),
                        LocatorView::from(frame.location),
                        frame.program_locator,
                        frame.statement,
                    ));
                }
            }
            Command::Stack(pid, window) => {
                let vars = Stack::new(&self.debugger()?).handle(pid, window)?;
                for var in vars {
                    self.printer.print(format!(
                        "{} {}: {} = {}",
                        var.index,
                        KeywordView::from(var.name),
                        var.type_name,
                        var.value
                    ));
                }
            }
            Command::NewSession => {
                let session = self.engine.create_session();
                self.printer
                    .print(format!("session {} created", IdView::from(session.id())));
            }
            Command::Run { script, session } => {
                let session = match session {
                    None => None,
                    Some(sid) => Some(
                        self.engine
                            .session(sid)
                            .ok_or(Error::SessionNotFound(sid))?,
                    ),
                };
                self.run_scripts(script, session)?;
            }
            Command::SkipInput => {}
            Command::Help { reason, command } => {
                if let Some(reason) = reason {
                    self.printer.print(reason);
                }
                self.printer.print(help_for_command(command.as_deref()));
            }
        }

        Ok(())
    }

    fn run(mut self) {
        loop {
            let Ok(action) = self.control_rx.recv() else {
                break;
            };

            match action {
                Control::Cmd(command) => {
                    if let Err(e) = self.handle_command(&command) {
                        match e {
                            CommandError::Parsing(_) => {
                                self.printer.print(ErrorView::from(e));
                            }
                            CommandError::Handle(ref err) if err.is_fatal() => {
                                self.printer.print(ErrorView::from("shutdown debugger"));
                                self.printer
                                    .print(ErrorView::from(format!("fatal debugger error: {e:#}")));
                                break;
                            }
                            CommandError::Handle(_) => {
                                self.printer
                                    .print(ErrorView::from(format!("debugger error: {e:#}")));
                            }
                            CommandError::Runtime(_) => {
                                self.printer
                                    .print(ErrorView::from(format!("runtime error: {e:#}")));
                            }
                        }
                    }
                }
                Control::Terminate => {
                    break;
                }
            }
            if self.terminate {
                break;
            }
        }

        self.shutdown();
    }

    /// Stop the debugger, cancel every process and wait for workers.
    fn shutdown(self) {
        for session in self.engine.sessions() {
            self.engine.close_session(session.id());
        }
        for worker in self.workers {
            _ = worker.join();
        }
    }
}

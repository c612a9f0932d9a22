use anyhow::Context;
use clap::Parser;
use haltline::runtime::Script;
use haltline::ui::config::{self, Config};
use haltline::ui::console::AppBuilder;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Scripts to load, every script is executed by a `run` command
    scripts: Vec<PathBuf>,

    /// Break every new process at its first statement
    #[arg(long)]
    break_on_start: bool,

    /// Break a process at a failed statement
    #[arg(long)]
    break_on_exception: bool,

    /// Path to a config file, default is ~/.config/hl/config.toml
    #[arg(long, env = "HL_CONFIG")]
    config: Option<PathBuf>,

    /// Print debugger logs
    #[arg(short, long)]
    verbose: bool,

    /// Save command history in a regular file
    #[arg(long)]
    save_history: bool,
}

fn load_script(path: &Path) -> anyhow::Result<Script> {
    let source =
        read_to_string(path).with_context(|| format!("read script {}", path.display()))?;
    let name = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("script");
    Script::parse(name, &source).with_context(|| format!("parse script {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let file_config = Config::load(args.config.as_deref());
    config::set(Config {
        break_on_start: args.break_on_start || file_config.break_on_start,
        break_on_exception: args.break_on_exception || file_config.break_on_exception,
        save_history: args.save_history || file_config.save_history,
        ..file_config
    });

    if !args.verbose {
        haltline::log::disable();
    }

    let scripts = args
        .scripts
        .iter()
        .map(|path| load_script(path))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let app = AppBuilder::new(scripts).build()?;
    app.run()
}

use clap::Parser;
use crate::cli::output::{clear_screen, get_terminal_width, is_tty};
use crate::cli::parser::parse_command;
use crate::cli::prompt::stdin_prompter;
use crate::cli::session::{Outcome, Session};
use crate::config::Settings;
use crate::models::Prompter;
use crate::strings::Message;
use anyhow::Result;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "tasktree")]
#[command(about = "A nested to-do list for the terminal")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// State file to use instead of the configured data.location
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Open a sublist first, as a path of ids (e.g. 2/1)
    #[arg(long = "in", value_name = "ID/ID/...")]
    pub open: Option<String>,

    /// A single shell command to run (e.g. "add milk do=tomorrow"); omit for the interactive shell
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

/// Parse arguments, load settings and the tree, then run
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load()?;
    if let Some(file) = &cli.file {
        settings.data_location = file.clone();
    }

    let mut session = Session::open(settings)?;
    if let Some(path) = &cli.open {
        session.open_path(path)?;
    }

    if cli.command.is_empty() {
        run_shell(&mut session)
    } else {
        run_once(&mut session, &cli.command.join(" "))
    }
}

/// Execute one command line, print the resulting list and return
///
/// User errors are returned rather than shown on the log line, so the
/// process exits non-zero.
pub fn run_once(session: &mut Session, line: &str) -> Result<()> {
    let command = parse_command(line)?;
    let mut prompter = stdin_prompter();
    session.execute(command, &mut prompter)?;
    print!("{}", session.render(get_terminal_width(), is_tty()));
    Ok(())
}

/// Clear, render, prompt, repeat until `quit` or end of input
pub fn run_shell(session: &mut Session) -> Result<()> {
    let mut prompter = stdin_prompter();

    loop {
        clear_screen();
        let screen = session.render(get_terminal_width(), is_tty());
        prompter.say(screen.trim_end())?;

        let prompt = session.settings().strings.get(Message::CommandPrompt).to_string();
        prompter.write(&prompt)?;
        let Some(line) = prompter.read_line()? else {
            log::debug!("End of input, leaving shell");
            break;
        };

        match session.handle_line(&line, &mut prompter) {
            Ok(Outcome::Quit) => break,
            Ok(Outcome::Continue) => {}
            Err(e) => {
                log::error!("{:#}", e);
                session.set_log_line(format!("Error: {:#}", e));
            }
        }
    }

    Ok(())
}

//! jobsh REPL: the interactive front end of the jobsh kernel.
//!
//! It handles:
//! - Reading lines (rustyline on a terminal, plain buffered stdin otherwise)
//! - Rendering the prompt
//! - Handing each line to a [`Session`] and stopping when it asks to exit

pub mod prompt;

use std::io::{self, BufRead};

use anyhow::{Context, Result};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;

use jobsh_kernel::{LineOutcome, Session, ShellConfig};

/// REPL state.
pub struct Repl {
    session: Session,
}

impl Repl {
    /// Create a REPL that detects whether stdin is a terminal.
    pub fn new() -> Result<Self> {
        Self::with_config(ShellConfig::default())
    }

    /// Create a REPL with a custom shell configuration.
    pub fn with_config(config: ShellConfig) -> Result<Self> {
        let session = Session::new(config).context("Failed to start shell session")?;
        Ok(Self { session })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Process a single line of input.
    pub fn process_line(&mut self, line: &str) -> LineOutcome {
        self.session.execute(line)
    }

    /// Run every line from `input`, stopping early on `exit`.
    ///
    /// Returns the status the shell should exit with.
    pub fn run_lines(&mut self, input: impl BufRead) -> Result<i32> {
        tracing::debug!("reading lines without an editor");
        for line in input.lines() {
            let line = line.context("Failed to read input")?;
            if let LineOutcome::Exit(code) = self.process_line(&line) {
                tracing::debug!(code, "exit requested");
                return Ok(code);
            }
        }
        tracing::debug!("end of input");
        Ok(0)
    }

    /// Interactive loop with line editing. No history is kept.
    fn run_interactive(&mut self) -> Result<i32> {
        let mut rl: Editor<(), DefaultHistory> =
            Editor::new().context("Failed to create editor")?;
        tracing::debug!(max_jobs = self.session.config().max_jobs, "interactive loop started");

        loop {
            self.session.reap();

            match rl.readline(&prompt::prompt()) {
                Ok(line) => {
                    if let LineOutcome::Exit(code) = self.process_line(&line) {
                        tracing::debug!(code, "exit requested");
                        return Ok(code);
                    }
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => {
                    tracing::debug!("end of input");
                    println!("exit");
                    return Ok(0);
                }
                Err(err) => return Err(err).context("Failed to read input"),
            }
        }
    }
}

/// Run the shell on stdin until `exit` or end of input.
pub fn run() -> Result<i32> {
    let mut repl = Repl::new()?;
    if repl.session.is_interactive() {
        repl.run_interactive()
    } else {
        repl.run_lines(io::stdin().lock())
    }
}

/// Execute one line without touching the terminal.
///
/// Returns the line's status, or the code passed to `exit`.
pub fn run_command(line: &str) -> Result<i32> {
    let mut repl = Repl::with_config(ShellConfig::batch())?;
    match repl.process_line(line) {
        LineOutcome::Exit(code) => Ok(code),
        LineOutcome::Continue => Ok(repl.session.last_status()),
    }
}

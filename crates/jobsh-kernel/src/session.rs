//! Shell session: the state that lives for the whole run of the shell.
//!
//! A `Session` owns the job table, the reaper and the terminal state, and
//! runs one input line at a time:
//!
//! ```text
//! drain reaper → parse → builtin? → launch → drain reaper
//! ```

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;

use thiserror::Error;

use crate::config::ShellConfig;
use crate::parser;
use crate::scheduler::{launch, JobTable, Reaper};
use crate::terminal::{TerminalError, TerminalState};
use crate::tools::{self, BuiltinOutcome, ExecContext};

/// Status recorded for a line that failed to parse.
pub const STATUS_USAGE: i32 = 2;

/// Errors that prevent a session from starting.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Terminal(#[from] TerminalError),

    #[error("cannot register SIGCHLD handler: {0}")]
    Signals(#[source] io::Error),
}

/// What the caller should do after a line ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    /// Read the next line.
    Continue,
    /// Terminate the shell with this status.
    Exit(i32),
}

/// A running shell.
pub struct Session {
    config: ShellConfig,
    terminal: TerminalState,
    jobs: JobTable,
    reaper: Reaper,
    prev_cwd: Option<PathBuf>,
    last_status: i32,
    out: Box<dyn Write + Send>,
    err: Box<dyn Write + Send>,
}

impl Session {
    /// Start a session writing to the process's stdout and stderr.
    pub fn new(config: ShellConfig) -> Result<Self, SessionError> {
        Self::with_output(config, Box::new(io::stdout()), Box::new(io::stderr()))
    }

    /// Start a session with explicit output streams.
    ///
    /// Only the shell's own messages go to these streams; children inherit
    /// the process's stdout and stderr.
    pub fn with_output(
        config: ShellConfig,
        out: Box<dyn Write + Send>,
        err: Box<dyn Write + Send>,
    ) -> Result<Self, SessionError> {
        let interactive = config
            .interactive
            .unwrap_or_else(|| io::stdin().is_terminal());
        let terminal = if interactive {
            TerminalState::init()?
        } else {
            TerminalState::detached()
        };
        let reaper = Reaper::install().map_err(SessionError::Signals)?;

        tracing::debug!(interactive, max_jobs = config.max_jobs, "session started");
        Ok(Self {
            jobs: JobTable::with_capacity(config.max_jobs),
            config,
            terminal,
            reaper,
            prev_cwd: None,
            last_status: 0,
            out,
            err,
        })
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    pub fn is_interactive(&self) -> bool {
        self.terminal.is_interactive()
    }

    pub fn jobs(&self) -> &JobTable {
        &self.jobs
    }

    /// Exit status of the last line that ran.
    pub fn last_status(&self) -> i32 {
        self.last_status
    }

    /// Print notices for background jobs that changed state.
    pub fn reap(&mut self) {
        self.context().reap();
    }

    /// Run one line of input.
    #[tracing::instrument(level = "info", skip(self, line), fields(line_len = line.len()))]
    pub fn execute(&mut self, line: &str) -> LineOutcome {
        self.reap();
        let outcome = self.dispatch(line);
        self.reap();
        outcome
    }

    fn dispatch(&mut self, line: &str) -> LineOutcome {
        let spec = match parser::parse(line, self.config.max_stages) {
            Ok(Some(spec)) => spec,
            Ok(None) => return LineOutcome::Continue,
            Err(e) => {
                self.context().report(&e);
                self.last_status = STATUS_USAGE;
                return LineOutcome::Continue;
            }
        };

        if let Some(builtin) = tools::lookup(spec.program()) {
            if spec.is_pipeline() || spec.input.is_some() || spec.output.is_some() || spec.background {
                tracing::debug!(builtin = builtin.name(), "pipes, redirects and & are ignored for builtins");
            }
            let args = &spec.stages[0][1..];
            let outcome = builtin.execute(args, &mut self.context());
            return match outcome {
                BuiltinOutcome::Continue(status) => {
                    self.last_status = status;
                    LineOutcome::Continue
                }
                BuiltinOutcome::Exit(code) => LineOutcome::Exit(code),
            };
        }

        let mut ctx = self.context();
        let status = match launch(&mut ctx, &spec, line.trim()) {
            Ok(outcome) => outcome.status(),
            Err(e) => {
                ctx.report(&e);
                1
            }
        };
        self.last_status = status;
        LineOutcome::Continue
    }

    fn context(&mut self) -> ExecContext<'_> {
        ExecContext {
            config: &self.config,
            terminal: &self.terminal,
            jobs: &mut self.jobs,
            reaper: &mut self.reaper,
            prev_cwd: &mut self.prev_cwd,
            out: &mut *self.out,
            err: &mut *self.err,
        }
    }
}

//! Execution context for builtins and the launcher.

use std::fmt::Display;
use std::io::Write;
use std::path::PathBuf;

use crate::config::ShellConfig;
use crate::scheduler::{JobNotice, JobTable, NoticeKind, Reaper};
use crate::terminal::TerminalState;

/// Mutable view of the session handed to whatever runs a line.
///
/// Borrows each piece of session state separately, so a builtin can hold
/// the terminal while it updates the job table.
pub struct ExecContext<'a> {
    pub config: &'a ShellConfig,
    pub terminal: &'a TerminalState,
    pub jobs: &'a mut JobTable,
    pub reaper: &'a mut Reaper,
    /// Previous working directory (for `cd -`).
    pub prev_cwd: &'a mut Option<PathBuf>,
    /// Acknowledgements, notices and listings.
    pub out: &'a mut dyn Write,
    /// Diagnostics.
    pub err: &'a mut dyn Write,
}

impl ExecContext<'_> {
    /// Print a job notice.
    ///
    /// Interactive stop notices start on a fresh line, since the stopped
    /// program may have left the cursor mid-line.
    pub fn notify(&mut self, notice: &JobNotice) {
        let lead = if notice.kind == NoticeKind::Stopped && self.terminal.is_interactive() {
            "\n"
        } else {
            ""
        };
        let _ = writeln!(self.out, "{}{}", lead, notice);
        let _ = self.out.flush();
    }

    /// Print a line on the output stream.
    pub fn print(&mut self, line: impl Display) {
        let _ = writeln!(self.out, "{}", line);
        let _ = self.out.flush();
    }

    /// Print a diagnostic prefixed with the shell name.
    pub fn report(&mut self, msg: impl Display) {
        let _ = writeln!(self.err, "{}: {}", self.config.name, msg);
        let _ = self.err.flush();
    }

    /// Print a builtin's diagnostic, prefixed with the builtin name.
    pub fn complain(&mut self, builtin: &str, msg: impl Display) {
        let _ = writeln!(self.err, "{}: {}", builtin, msg);
        let _ = self.err.flush();
    }

    /// Drain pending child state changes and print their notices.
    pub fn reap(&mut self) {
        for notice in self.reaper.drain(self.jobs) {
            self.notify(&notice);
        }
    }
}

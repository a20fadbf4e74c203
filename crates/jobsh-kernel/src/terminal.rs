//! Foreground control of the controlling terminal.
//!
//! An interactive session owns the terminal between commands. Before
//! waiting on a foreground job it hands the terminal to the job's process
//! group, and takes it back once the job exits or stops. A batch session
//! never touches the terminal: every operation here is a no-op for it.

use std::io;
use std::os::fd::{AsFd, AsRawFd, OwnedFd, RawFd};

use nix::errno::Errno;
use nix::sys::signal::{killpg, signal, SigHandler, Signal};
use nix::sys::termios::{tcgetattr, tcsetattr, SetArg, Termios};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{getpgrp, tcgetpgrp, tcsetpgrp, Pid};
use thiserror::Error;

/// Signals the shell ignores while it runs interactively. Children get the
/// default disposition back before exec.
pub const JOB_CONTROL_SIGNALS: [Signal; 5] = [
    Signal::SIGINT,
    Signal::SIGQUIT,
    Signal::SIGTSTP,
    Signal::SIGTTIN,
    Signal::SIGTTOU,
];

/// Errors from terminal and wait operations.
#[derive(Debug, Error)]
pub enum TerminalError {
    #[error("cannot open controlling terminal: {0}")]
    Io(#[from] io::Error),

    #[error("{op}: {source}")]
    Sys {
        op: &'static str,
        #[source]
        source: Errno,
    },
}

impl TerminalError {
    fn sys(op: &'static str) -> impl FnOnce(Errno) -> Self {
        move |source| TerminalError::Sys { op, source }
    }
}

/// How a foreground wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitResult {
    Exited(i32),
    Signaled(i32),
    Stopped(i32),
}

impl WaitResult {
    /// Shell exit status: the exit code, or 128 plus the signal number.
    pub fn status(self) -> i32 {
        match self {
            WaitResult::Exited(code) => code,
            WaitResult::Signaled(sig) | WaitResult::Stopped(sig) => 128 + sig,
        }
    }

    pub fn is_stopped(self) -> bool {
        matches!(self, WaitResult::Stopped(_))
    }
}

/// The session's view of its controlling terminal.
#[derive(Debug)]
pub struct TerminalState {
    shell_pgid: Pid,
    /// Close-on-exec duplicate of stdin. `None` for batch sessions.
    tty: Option<OwnedFd>,
    saved_modes: Option<Termios>,
}

impl TerminalState {
    /// State for a session that never touches the terminal.
    pub fn detached() -> Self {
        Self {
            shell_pgid: getpgrp(),
            tty: None,
            saved_modes: None,
        }
    }

    /// Take control of the terminal on stdin.
    ///
    /// Waits until the shell's process group is the terminal's foreground
    /// group, stopping itself with SIGTTIN while it is not, then ignores
    /// the job-control signals.
    pub fn init() -> Result<Self, TerminalError> {
        let shell_pgid = getpgrp();
        let tty = io::stdin().as_fd().try_clone_to_owned()?;

        loop {
            let owner = tcgetpgrp(tty.as_fd()).map_err(TerminalError::sys("tcgetpgrp"))?;
            if owner == shell_pgid {
                break;
            }
            killpg(shell_pgid, Signal::SIGTTIN).map_err(TerminalError::sys("killpg"))?;
        }

        for sig in JOB_CONTROL_SIGNALS {
            // SAFETY: installing SIG_IGN runs no Rust code in signal context.
            unsafe { signal(sig, SigHandler::SigIgn) }.map_err(TerminalError::sys("signal"))?;
        }

        let saved_modes = match tcgetattr(tty.as_fd()) {
            Ok(modes) => Some(modes),
            Err(e) => {
                tracing::debug!("cannot save terminal modes: {}", e);
                None
            }
        };

        tracing::debug!(pgid = shell_pgid.as_raw(), "terminal acquired");
        Ok(Self {
            shell_pgid,
            tty: Some(tty),
            saved_modes,
        })
    }

    pub fn is_interactive(&self) -> bool {
        self.tty.is_some()
    }

    pub fn shell_pgid(&self) -> Pid {
        self.shell_pgid
    }

    /// Raw terminal descriptor, for use between fork and exec.
    pub fn tty_raw_fd(&self) -> Option<RawFd> {
        self.tty.as_ref().map(AsRawFd::as_raw_fd)
    }

    /// Make `pgid` the terminal's foreground process group.
    pub fn give_terminal_to(&self, pgid: Pid) -> Result<(), TerminalError> {
        let Some(tty) = &self.tty else {
            return Ok(());
        };
        tcsetpgrp(tty.as_fd(), pgid).map_err(TerminalError::sys("tcsetpgrp"))
    }

    /// Return the terminal to the shell and restore its saved modes.
    pub fn reclaim_terminal(&self) -> Result<(), TerminalError> {
        let Some(tty) = &self.tty else {
            return Ok(());
        };
        tcsetpgrp(tty.as_fd(), self.shell_pgid).map_err(TerminalError::sys("tcsetpgrp"))?;
        if let Some(modes) = &self.saved_modes {
            tcsetattr(tty.as_fd(), SetArg::TCSADRAIN, modes).map_err(TerminalError::sys("tcsetattr"))?;
        }
        Ok(())
    }

    /// Hand the terminal to `pgid` until the returned guard is dropped.
    pub fn foreground(&self, pgid: Pid) -> ForegroundGuard<'_> {
        if let Err(e) = self.give_terminal_to(pgid) {
            tracing::warn!(pgid = pgid.as_raw(), "failed to give terminal: {}", e);
        }
        ForegroundGuard { terminal: self }
    }

    /// Return the terminal to the shell when the guard is dropped, without
    /// handing it over now.
    ///
    /// Covers launches where a child takes the terminal itself and then
    /// fails to exec, leaving no process group to wait on.
    pub fn reclaim_on_drop(&self) -> ForegroundGuard<'_> {
        ForegroundGuard { terminal: self }
    }

    /// Block until `pid` exits, is killed or stops.
    pub fn wait_for_foreground(&self, pid: Pid) -> Result<WaitResult, TerminalError> {
        wait_for(pid)
    }
}

/// Gives the terminal back to the shell when dropped.
#[must_use = "the terminal is reclaimed as soon as the guard is dropped"]
#[derive(Debug)]
pub struct ForegroundGuard<'a> {
    terminal: &'a TerminalState,
}

impl Drop for ForegroundGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.terminal.reclaim_terminal() {
            tracing::warn!("failed to reclaim terminal: {}", e);
        }
    }
}

/// Wait for one specific child, reporting stops as well as exits.
pub fn wait_for(pid: Pid) -> Result<WaitResult, TerminalError> {
    loop {
        match waitpid(pid, Some(WaitPidFlag::WUNTRACED)) {
            Ok(WaitStatus::Exited(_, code)) => return Ok(WaitResult::Exited(code)),
            Ok(WaitStatus::Signaled(_, sig, _)) => return Ok(WaitResult::Signaled(sig as i32)),
            Ok(WaitStatus::Stopped(_, sig)) => return Ok(WaitResult::Stopped(sig as i32)),
            Ok(_) => continue,
            Err(Errno::EINTR) => continue,
            Err(source) => return Err(TerminalError::Sys { op: "waitpid", source }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_result_status_codes() {
        assert_eq!(WaitResult::Exited(3).status(), 3);
        assert_eq!(WaitResult::Signaled(9).status(), 137);
        assert_eq!(WaitResult::Stopped(20).status(), 148);
        assert!(WaitResult::Stopped(19).is_stopped());
    }

    #[test]
    fn detached_terminal_is_inert() {
        let term = TerminalState::detached();
        assert!(!term.is_interactive());
        assert_eq!(term.tty_raw_fd(), None);
        term.give_terminal_to(Pid::from_raw(1)).unwrap();
        term.reclaim_terminal().unwrap();
        drop(term.foreground(Pid::from_raw(1)));
        drop(term.reclaim_on_drop());
    }
}

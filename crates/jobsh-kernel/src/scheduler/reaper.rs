//! SIGCHLD-driven reaping of background jobs.
//!
//! The signal handler installed by `signal-hook` only records that SIGCHLD
//! arrived. All bookkeeping happens in [`Reaper::drain`], called from the
//! main loop, so the job table has a single mutator.

use std::io;

use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{getpgid, Pid};
use signal_hook::consts::SIGCHLD;
use signal_hook::iterator::Signals;

use super::job::{JobNotice, JobTable, ProcessEvent};

/// Collects child state changes and folds them into the job table.
pub struct Reaper {
    signals: Option<Signals>,
}

impl Reaper {
    /// Register for SIGCHLD. Drains become no-ops while nothing is pending.
    pub fn install() -> io::Result<Self> {
        let signals = Signals::new([SIGCHLD])?;
        Ok(Self {
            signals: Some(signals),
        })
    }

    /// A reaper without a signal registration. Every drain polls.
    pub fn detached() -> Self {
        Self { signals: None }
    }

    /// Apply every pending child state change to `jobs`.
    ///
    /// Returns the notices to show the user, in the order the changes were
    /// collected.
    pub fn drain(&mut self, jobs: &mut JobTable) -> Vec<JobNotice> {
        if let Some(signals) = self.signals.as_mut() {
            if signals.pending().count() == 0 {
                return Vec::new();
            }
        }

        let flags = WaitPidFlag::WNOHANG | WaitPidFlag::WUNTRACED | WaitPidFlag::WCONTINUED;
        let mut notices = Vec::new();
        loop {
            let (pid, event) = match waitpid(Pid::from_raw(-1), Some(flags)) {
                Ok(WaitStatus::StillAlive) => break,
                Ok(WaitStatus::Exited(pid, _)) | Ok(WaitStatus::Signaled(pid, _, _)) => {
                    (pid, ProcessEvent::Exited)
                }
                Ok(WaitStatus::Stopped(pid, _)) => (pid, ProcessEvent::Stopped),
                Ok(WaitStatus::Continued(pid)) => (pid, ProcessEvent::Continued),
                Ok(other) => {
                    tracing::trace!(?other, "ignoring wait status");
                    continue;
                }
                Err(Errno::EINTR) => continue,
                Err(Errno::ECHILD) => break,
                Err(e) => {
                    tracing::warn!("waitpid failed: {}", e);
                    break;
                }
            };

            let pgid = match jobs.find_by_process(pid) {
                Some(job) => job.pgid(),
                None => getpgid(Some(pid)).unwrap_or(pid),
            };
            if jobs.find_by_process_group(pgid).is_none() {
                tracing::trace!(pid = pid.as_raw(), ?event, "state change for untracked process");
                continue;
            }

            tracing::trace!(pid = pid.as_raw(), pgid = pgid.as_raw(), ?event, "child state change");
            notices.extend(jobs.mark_process(pgid, pid, event));
        }
        notices
    }
}

impl std::fmt::Debug for Reaper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reaper")
            .field("installed", &self.signals.is_some())
            .finish()
    }
}

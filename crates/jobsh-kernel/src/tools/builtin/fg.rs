//! fg: Resume a job in the foreground.

use nix::errno::Errno;
use nix::sys::signal::{killpg, Signal};

use crate::scheduler::{JobStatus, ProcessEvent};
use crate::terminal::{self, WaitResult};
use crate::tools::{Builtin, BuiltinOutcome, ExecContext};

use super::target_job;

/// Fg builtin: continue a job and wait for it with the terminal handed over.
pub struct Fg;

impl Builtin for Fg {
    fn name(&self) -> &'static str {
        "fg"
    }

    fn execute(&self, args: &[&str], ctx: &mut ExecContext<'_>) -> BuiltinOutcome {
        ctx.reap();

        let arg = args.first().copied();
        let (pgid, command, members) = match target_job(arg, ctx.jobs, ctx.jobs.current()) {
            Ok(job) => (job.pgid(), job.command().to_string(), job.live_pids()),
            Err(name) => {
                ctx.complain("fg", format!("{}: no such job", name));
                return BuiltinOutcome::Continue(1);
            }
        };

        ctx.print(&command);

        let terminal = ctx.terminal;
        let guard = terminal.foreground(pgid);

        match killpg(pgid, Signal::SIGCONT) {
            Ok(()) => {
                ctx.jobs.set_status(pgid, JobStatus::Running);
            }
            Err(Errno::ESRCH) => {
                drop(guard);
                tracing::debug!(pgid = pgid.as_raw(), "job vanished before SIGCONT");
                if let Some(notice) = ctx.jobs.set_status(pgid, JobStatus::Done) {
                    ctx.notify(&notice);
                }
                return BuiltinOutcome::Continue(0);
            }
            Err(e) => {
                drop(guard);
                ctx.complain("fg", format!("failed to continue job: {}", e));
                return BuiltinOutcome::Continue(1);
            }
        }

        let mut status = 0;
        let mut notices = Vec::new();
        for pid in members {
            let event = match terminal::wait_for(pid) {
                Ok(result) => {
                    status = result.status();
                    match result {
                        WaitResult::Stopped(_) => ProcessEvent::Stopped,
                        WaitResult::Exited(_) | WaitResult::Signaled(_) => ProcessEvent::Exited,
                    }
                }
                Err(e) => {
                    // Already collected elsewhere; the member is gone either way.
                    tracing::debug!(pid = pid.as_raw(), "wait failed: {}", e);
                    ProcessEvent::Exited
                }
            };
            notices.extend(ctx.jobs.mark_process(pgid, pid, event));
        }
        drop(guard);

        for notice in &notices {
            ctx.notify(notice);
        }
        BuiltinOutcome::Continue(status)
    }
}

#[cfg(test)]
mod tests {
    use nix::unistd::Pid;

    use super::super::fixture::Fixture;
    use crate::scheduler::{JobStatus, Process, ProcessState};
    use crate::tools::BuiltinOutcome;

    #[test]
    fn failed_continue_keeps_previous_status() {
        // killpg rejects a negative group, so SIGCONT is never delivered.
        let pgid = Pid::from_raw(-7);
        let mut fx = Fixture::new();
        let stopped = vec![Process::new(pgid, ProcessState::Stopped)];
        fx.jobs
            .insert(pgid, JobStatus::Stopped, "vi notes", false, stopped)
            .unwrap();

        assert_eq!(fx.run("fg", &["1"]), BuiltinOutcome::Continue(1));
        assert!(fx.stderr().contains("fg: failed to continue job"), "{}", fx.stderr());
        assert_eq!(
            fx.jobs.find_by_process_group(pgid).map(|job| job.status()),
            Some(JobStatus::Stopped)
        );
    }

    #[test]
    fn unknown_job_is_reported() {
        let mut fx = Fixture::new();
        assert_eq!(fx.run("fg", &["%3"]), BuiltinOutcome::Continue(1));
        assert_eq!(fx.stderr(), "fg: %3: no such job\n");
    }
}

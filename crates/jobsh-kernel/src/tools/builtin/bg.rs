//! bg: Resume a stopped job in the background.

use nix::sys::signal::{killpg, Signal};

use crate::scheduler::{JobNotice, JobStatus};
use crate::tools::{Builtin, BuiltinOutcome, ExecContext};

use super::target_job;

/// Bg builtin: continue a stopped job without giving it the terminal.
pub struct Bg;

impl Builtin for Bg {
    fn name(&self) -> &'static str {
        "bg"
    }

    fn execute(&self, args: &[&str], ctx: &mut ExecContext<'_>) -> BuiltinOutcome {
        ctx.reap();

        let arg = args.first().copied();
        let (pgid, status, notice) = match target_job(arg, ctx.jobs, ctx.jobs.current_stopped()) {
            Ok(job) => (job.pgid(), job.status(), JobNotice::continued(job)),
            Err(name) => {
                ctx.complain("bg", format!("{}: no such job", name));
                return BuiltinOutcome::Continue(1);
            }
        };

        if status != JobStatus::Stopped {
            ctx.complain("bg", format!("job {} already in background", notice.id));
            return BuiltinOutcome::Continue(1);
        }

        if let Err(e) = killpg(pgid, Signal::SIGCONT) {
            ctx.complain("bg", format!("failed to continue job: {}", e));
            return BuiltinOutcome::Continue(1);
        }
        ctx.jobs.set_status(pgid, JobStatus::Running);

        ctx.notify(&notice);
        BuiltinOutcome::Continue(0)
    }
}

#[cfg(test)]
mod tests {
    use nix::unistd::Pid;

    use super::super::fixture::Fixture;
    use crate::scheduler::{JobStatus, Process, ProcessState};
    use crate::tools::BuiltinOutcome;

    // killpg rejects a negative group, so SIGCONT is never delivered.
    const UNREACHABLE: i32 = -5;

    #[test]
    fn failed_continue_leaves_job_stopped() {
        let pgid = Pid::from_raw(UNREACHABLE);
        let mut fx = Fixture::new();
        let stopped = vec![Process::new(pgid, ProcessState::Stopped)];
        fx.jobs
            .insert(pgid, JobStatus::Stopped, "sleep 30", false, stopped)
            .unwrap();

        assert_eq!(fx.run("bg", &[]), BuiltinOutcome::Continue(1));
        assert!(fx.stderr().contains("bg: failed to continue job"), "{}", fx.stderr());
        assert!(fx.out.is_empty());

        let job = fx.jobs.find_by_process_group(pgid).unwrap();
        assert_eq!(job.status(), JobStatus::Stopped);
        assert_eq!(job.processes()[0].state, ProcessState::Stopped);
    }

    #[test]
    fn running_job_is_rejected() {
        let mut fx = Fixture::new();
        fx.jobs
            .insert(Pid::from_raw(UNREACHABLE), JobStatus::Running, "sleep 30 &", false, Vec::new())
            .unwrap();

        assert_eq!(fx.run("bg", &["%1"]), BuiltinOutcome::Continue(1));
        assert!(fx.stderr().contains("bg: job 1 already in background"));
    }
}

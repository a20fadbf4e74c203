//! Process launcher: single commands and pipelines.
//!
//! Every stage of a line runs in one process group. The first stage that
//! spawns creates the group and later stages join it, so the terminal and
//! job-control signals treat the whole line as a unit.
//!
//! Redirection files are opened before any child exists. A failure there
//! abandons the line without side effects.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::{AsRawFd, BorrowedFd, OwnedFd, RawFd};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::process::CommandExt;
use std::process::{Command, Stdio};

use nix::errno::Errno;
use nix::fcntl::{fcntl, FcntlArg, FdFlag};
use nix::sys::signal::{killpg, signal, SigHandler, Signal};
use nix::unistd::{getpgrp, pipe, setpgid, tcsetpgrp, Pid};
use thiserror::Error;

use crate::parser::PipelineSpec;
use crate::resolve::resolve_program;
use crate::terminal::{TerminalError, WaitResult, JOB_CONTROL_SIGNALS};
use crate::tools::ExecContext;

use super::job::{JobId, JobNotice, JobStatus, Process, ProcessState};

/// Exit status of a stage whose program could not be found.
pub const STATUS_NOT_FOUND: i32 = 127;

/// Exit status of a stage whose program could not be executed.
pub const STATUS_NOT_EXECUTABLE: i32 = 126;

/// Errors that abandon a launch.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("{path}: {source}")]
    Redirect {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("pipe: {0}")]
    Pipe(#[source] Errno),

    #[error("{program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Terminal(#[from] TerminalError),
}

/// What happened to a launched line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// Ran in the foreground to completion.
    Completed { status: i32 },
    /// Left running in the background. `id` is `None` when the job table
    /// had no room.
    Background { id: Option<JobId>, pgid: Pid },
    /// A foreground job stopped and was registered.
    Stopped { id: Option<JobId>, status: i32 },
}

impl LaunchOutcome {
    /// Status recorded as the session's last status.
    pub fn status(&self) -> i32 {
        match self {
            LaunchOutcome::Completed { status } | LaunchOutcome::Stopped { status, .. } => *status,
            LaunchOutcome::Background { .. } => 0,
        }
    }
}

/// Result of spawning one stage.
#[derive(Debug, Clone, Copy)]
enum Stage {
    Spawned(Pid),
    Failed(i32),
}

/// Redirection files, opened up front.
struct Redirects {
    input: Option<File>,
    output: Option<File>,
}

impl Redirects {
    fn open(spec: &PipelineSpec<'_>) -> Result<Self, LaunchError> {
        let input = spec
            .input
            .map(|path| {
                File::open(path).map_err(|source| LaunchError::Redirect {
                    path: path.to_string(),
                    source,
                })
            })
            .transpose()?;

        let output = spec
            .output
            .map(|target| {
                OpenOptions::new()
                    .write(true)
                    .create(true)
                    .append(target.append)
                    .truncate(!target.append)
                    .mode(0o644)
                    .open(target.path)
                    .map_err(|source| LaunchError::Redirect {
                        path: target.path.to_string(),
                        source,
                    })
            })
            .transpose()?;

        Ok(Self { input, output })
    }
}

/// Launch a parsed line. `command` is the text shown in job notices.
#[tracing::instrument(level = "debug", skip(ctx, spec), fields(stages = spec.stages.len(), background = spec.background))]
pub fn launch(
    ctx: &mut ExecContext<'_>,
    spec: &PipelineSpec<'_>,
    command: &str,
) -> Result<LaunchOutcome, LaunchError> {
    let redirects = Redirects::open(spec)?;

    // A foreground child grabs the terminal before exec, so the shell must
    // take it back on every path, including spawn failures.
    let terminal = ctx.terminal;
    let _reclaim = (!spec.background).then(|| terminal.reclaim_on_drop());

    let stages = match spec.stages.len() {
        1 => launch_single(ctx, &spec.stages[0], redirects, !spec.background)?,
        _ => launch_pipeline(ctx, &spec.stages, redirects, !spec.background)?,
    };

    if spec.background {
        Ok(register_background(ctx, &stages, command, spec.is_pipeline()))
    } else {
        wait_foreground(ctx, &stages, command, spec.is_pipeline())
    }
}

fn launch_single(
    ctx: &mut ExecContext<'_>,
    argv: &[&str],
    redirects: Redirects,
    foreground: bool,
) -> Result<Vec<Stage>, LaunchError> {
    let stdin = redirects.input.map_or_else(Stdio::inherit, Stdio::from);
    let stdout = redirects.output.map_or_else(Stdio::inherit, Stdio::from);
    let stage = spawn_stage(ctx, argv, stdin, stdout, None, foreground)?;
    Ok(vec![stage])
}

fn launch_pipeline(
    ctx: &mut ExecContext<'_>,
    stages: &[Vec<&str>],
    mut redirects: Redirects,
    foreground: bool,
) -> Result<Vec<Stage>, LaunchError> {
    let last = stages.len() - 1;
    let mut spawned: Vec<Stage> = Vec::with_capacity(stages.len());
    let mut leader: Option<Pid> = None;
    let mut upstream: Option<OwnedFd> = None;

    for (i, argv) in stages.iter().enumerate() {
        let stdin = match upstream.take() {
            Some(read_end) => Stdio::from(read_end),
            None => redirects.input.take().map_or_else(Stdio::inherit, Stdio::from),
        };

        let stdout = if i == last {
            redirects.output.take().map_or_else(Stdio::inherit, Stdio::from)
        } else {
            match cloexec_pipe() {
                Ok((read_end, write_end)) => {
                    upstream = Some(read_end);
                    Stdio::from(write_end)
                }
                Err(e) => {
                    abandon(&spawned);
                    return Err(e);
                }
            }
        };

        let stage = match spawn_stage(ctx, argv, stdin, stdout, leader, foreground) {
            Ok(stage) => stage,
            Err(e) => {
                abandon(&spawned);
                return Err(e);
            }
        };
        if let (None, Stage::Spawned(pid)) = (leader, stage) {
            leader = Some(pid);
        }
        spawned.push(stage);
    }

    Ok(spawned)
}

/// Spawn one stage into the group led by `leader` (or a new group).
///
/// A program that cannot be found or executed is reported and counted as
/// a stage that exited with 127 or 126. Other spawn failures abort.
fn spawn_stage(
    ctx: &mut ExecContext<'_>,
    argv: &[&str],
    stdin: Stdio,
    stdout: Stdio,
    leader: Option<Pid>,
    foreground: bool,
) -> Result<Stage, LaunchError> {
    let name = argv[0];
    let program = resolve_program(name, ctx.config.aux_bin_dir.as_deref());

    let mut cmd = Command::new(&program);
    cmd.arg0(name)
        .args(&argv[1..])
        .stdin(stdin)
        .stdout(stdout)
        .process_group(leader.map_or(0, Pid::as_raw));

    let tty = match leader {
        None if foreground => ctx.terminal.tty_raw_fd(),
        _ => None,
    };
    // SAFETY: the hook only makes async-signal-safe calls.
    unsafe {
        cmd.pre_exec(move || prepare_child(tty));
    }

    let child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => return spawn_failure(ctx, name, e),
    };
    let pid = Pid::from_raw(child.id() as i32);
    // Closes the parent's copies of this stage's stdio.
    drop(cmd);
    drop(child);

    // The child joins its group before exec; repeating it here closes the
    // window in which the parent could signal a group that does not exist.
    let group = leader.unwrap_or(pid);
    match setpgid(pid, group) {
        Ok(()) | Err(Errno::EACCES) | Err(Errno::ESRCH) => {}
        Err(e) => tracing::warn!(pid = pid.as_raw(), "setpgid failed: {}", e),
    }

    tracing::debug!(pid = pid.as_raw(), pgid = group.as_raw(), program = %program.display(), "spawned");
    Ok(Stage::Spawned(pid))
}

fn spawn_failure(ctx: &mut ExecContext<'_>, name: &str, e: io::Error) -> Result<Stage, LaunchError> {
    let errno = e.raw_os_error().map(Errno::from_raw);
    match (e.kind(), errno) {
        (_, Some(Errno::EAGAIN)) | (_, Some(Errno::ENOMEM)) => Err(LaunchError::Spawn {
            program: name.to_string(),
            source: e,
        }),
        (io::ErrorKind::NotFound, _) => {
            ctx.report(format!("{}: command not found", name));
            Ok(Stage::Failed(STATUS_NOT_FOUND))
        }
        _ => {
            ctx.report(format!("{}: {}", name, e));
            Ok(Stage::Failed(STATUS_NOT_EXECUTABLE))
        }
    }
}

/// Child-side setup between fork and exec.
fn prepare_child(tty: Option<RawFd>) -> io::Result<()> {
    if let Some(fd) = tty {
        // SAFETY: the descriptor is inherited from the parent and stays open
        // until exec.
        let fd = unsafe { BorrowedFd::borrow_raw(fd) };
        // Best effort; the parent hands the terminal over as well.
        let _ = tcsetpgrp(fd, getpgrp());
    }
    for sig in JOB_CONTROL_SIGNALS {
        // SAFETY: resetting to SIG_DFL installs no handler.
        unsafe { signal(sig, SigHandler::SigDfl) }?;
    }
    Ok(())
}

fn cloexec_pipe() -> Result<(OwnedFd, OwnedFd), LaunchError> {
    let (read_end, write_end) = pipe().map_err(LaunchError::Pipe)?;
    for fd in [&read_end, &write_end] {
        fcntl(fd.as_raw_fd(), FcntlArg::F_SETFD(FdFlag::FD_CLOEXEC)).map_err(LaunchError::Pipe)?;
    }
    Ok((read_end, write_end))
}

fn abandon(spawned: &[Stage]) {
    for stage in spawned {
        if let Stage::Spawned(pid) = stage {
            tracing::warn!(pid = pid.as_raw(), "pipeline aborted; stage left running");
        }
    }
}

fn leader_of(stages: &[Stage]) -> Option<Pid> {
    stages.iter().find_map(|stage| match stage {
        Stage::Spawned(pid) => Some(*pid),
        Stage::Failed(_) => None,
    })
}

fn register_background(
    ctx: &mut ExecContext<'_>,
    stages: &[Stage],
    command: &str,
    is_pipeline: bool,
) -> LaunchOutcome {
    let Some(pgid) = leader_of(stages) else {
        return LaunchOutcome::Completed {
            status: last_failure(stages),
        };
    };

    let processes = stages
        .iter()
        .filter_map(|stage| match stage {
            Stage::Spawned(pid) => Some(Process::running(*pid)),
            Stage::Failed(_) => None,
        })
        .collect();

    match ctx.jobs.insert(pgid, JobStatus::Running, command, is_pipeline, processes) {
        Ok(id) => {
            ctx.print(format!("[{}] {}", id, pgid));
            LaunchOutcome::Background { id: Some(id), pgid }
        }
        Err(e) => {
            ctx.report(&e);
            tracing::warn!(pgid = pgid.as_raw(), "background job left untracked");
            LaunchOutcome::Background { id: None, pgid }
        }
    }
}

fn wait_foreground(
    ctx: &mut ExecContext<'_>,
    stages: &[Stage],
    command: &str,
    is_pipeline: bool,
) -> Result<LaunchOutcome, LaunchError> {
    let Some(pgid) = leader_of(stages) else {
        return Ok(LaunchOutcome::Completed {
            status: last_failure(stages),
        });
    };

    let terminal = ctx.terminal;
    let guard = terminal.foreground(pgid);

    let mut status = 0;
    let mut stopped = false;
    let mut processes = Vec::new();
    for stage in stages {
        let pid = match *stage {
            Stage::Spawned(pid) => pid,
            Stage::Failed(code) => {
                status = code;
                continue;
            }
        };
        let result = terminal.wait_for_foreground(pid)?;
        status = result.status();
        let state = match result {
            WaitResult::Stopped(_) => {
                stopped = true;
                ProcessState::Stopped
            }
            WaitResult::Exited(_) | WaitResult::Signaled(_) => ProcessState::Exited,
        };
        processes.push(Process::new(pid, state));
    }
    drop(guard);

    if !stopped {
        return Ok(LaunchOutcome::Completed { status });
    }

    match ctx.jobs.insert(pgid, JobStatus::Stopped, command, is_pipeline, processes) {
        Ok(id) => {
            if let Some(notice) = ctx.jobs.find_by_id(id).map(JobNotice::stopped) {
                ctx.notify(&notice);
            }
            Ok(LaunchOutcome::Stopped { id: Some(id), status })
        }
        Err(e) => {
            ctx.report(&e);
            tracing::warn!(pgid = pgid.as_raw(), "stopped job continued untracked");
            if let Err(e) = killpg(pgid, Signal::SIGCONT) {
                tracing::warn!(pgid = pgid.as_raw(), "failed to continue job: {}", e);
            }
            Ok(LaunchOutcome::Stopped { id: None, status })
        }
    }
}

fn last_failure(stages: &[Stage]) -> i32 {
    match stages.last() {
        Some(Stage::Failed(code)) => *code,
        _ => STATUS_NOT_FOUND,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_outcome_reports_success() {
        let outcome = LaunchOutcome::Background {
            id: Some(JobId(1)),
            pgid: Pid::from_raw(42),
        };
        assert_eq!(outcome.status(), 0);
        assert_eq!(LaunchOutcome::Stopped { id: None, status: 148 }.status(), 148);
    }

    #[test]
    fn leader_is_first_spawned_stage() {
        let stages = [
            Stage::Failed(STATUS_NOT_FOUND),
            Stage::Spawned(Pid::from_raw(7)),
            Stage::Spawned(Pid::from_raw(8)),
        ];
        assert_eq!(leader_of(&stages), Some(Pid::from_raw(7)));
        assert_eq!(leader_of(&[Stage::Failed(126)]), None);
        assert_eq!(last_failure(&[Stage::Failed(126)]), 126);
    }
}

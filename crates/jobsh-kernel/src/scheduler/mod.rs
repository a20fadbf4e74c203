//! Scheduler module for jobsh: launching, tracking and reaping jobs.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        launch(spec)                          │
//! │  ┌─────────┐   pipe    ┌─────────┐   pipe    ┌─────────┐     │
//! │  │ stage 0 │──────────▶│ stage 1 │──────────▶│ stage 2 │     │
//! │  │ (leader)│           │         │           │         │     │
//! │  └─────────┘           └─────────┘           └─────────┘     │
//! │        one process group, terminal handed over if fg         │
//! └──────────────────────────────────────────────────────────────┘
//!
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          JobTable                            │
//! │  jobs: BTreeMap<JobId, Job>          (bounded, ids monotonic)│
//! │  - insert(pgid, status, ..) → JobId                          │
//! │  - set_status(pgid, status) → Option<JobNotice>              │
//! │  - mark_process(pgid, pid, event) → Option<JobNotice>        │
//! └──────────────────────────────────────────────────────────────┘
//!
//!   SIGCHLD ──▶ signal-hook queue ──▶ Reaper::drain(&mut JobTable)
//! ```

mod job;
mod launcher;
mod reaper;

pub use job::{
    Job, JobId, JobInfo, JobNotice, JobStatus, JobTable, JobTableError, NoticeKind, Process,
    ProcessEvent, ProcessState, DEFAULT_MAX_JOBS,
};
pub use launcher::{launch, LaunchError, LaunchOutcome, STATUS_NOT_EXECUTABLE, STATUS_NOT_FOUND};
pub use reaper::Reaper;

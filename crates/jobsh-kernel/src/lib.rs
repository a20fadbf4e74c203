//! jobsh-kernel: the job-control core of jobsh.
//!
//! This crate provides:
//!
//! - **Parser**: one input line → stages, redirections, background flag
//! - **Scheduler**: process launching, the job table and SIGCHLD reaping
//! - **Terminal**: handing the controlling terminal to foreground jobs
//! - **Tools**: the builtins (`cd`, `exit`, `jobs`, `fg`, `bg`)
//! - **Session**: per-line dispatch over all of the above
//! - **Paths**: XDG-compliant path helpers

pub mod config;
pub mod parser;
pub mod paths;
pub mod resolve;
pub mod scheduler;
pub mod session;
pub mod terminal;
pub mod tools;

pub use config::ShellConfig;
pub use parser::{parse, OutputRedirect, ParseError, PipelineSpec};
pub use scheduler::{Job, JobId, JobInfo, JobNotice, JobStatus, JobTable, JobTableError, LaunchError};
pub use session::{LineOutcome, Session, SessionError};
pub use terminal::TerminalError;

// XDG path primitives (embedders compose their own paths)
pub use paths::{home_dir, xdg_data_home};

//! Job identification and status types.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Identifier of a job in the shell's job table.
///
/// Ids are small positive integers handed out in increasing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(pub u32);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error returned when a job reference like `%2` cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid job reference: {0}")]
pub struct ParseJobIdError(pub String);

impl FromStr for JobId {
    type Err = ParseJobIdError;

    /// Accepts `N` and `%N`. Zero is not a valid job id.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix('%').unwrap_or(s);
        match digits.parse::<u32>() {
            Ok(n) if n > 0 => Ok(JobId(n)),
            _ => Err(ParseJobIdError(s.to_string())),
        }
    }
}

/// Status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    /// At least one process of the job is running.
    Running,
    /// The job was stopped by a signal (e.g., Ctrl-Z / SIGTSTP).
    Stopped,
    /// Every process of the job has exited or been killed.
    Done,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Running => write!(f, "Running"),
            JobStatus::Stopped => write!(f, "Stopped"),
            JobStatus::Done => write!(f, "Done"),
        }
    }
}

/// Information about a job for listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobInfo {
    /// Job ID.
    pub id: JobId,
    /// Command text as typed by the user.
    pub command: String,
    /// Current status.
    pub status: JobStatus,
    /// Process group shared by the job's processes.
    pub pgid: i32,
    /// Whether the job is a multi-stage pipeline.
    pub is_pipeline: bool,
}

impl fmt::Display for JobInfo {
    /// Formats the line printed by the `jobs` builtin.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]\t{}\t\t{}", self.id, self.status, self.command)
    }
}

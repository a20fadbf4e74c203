//! Job table for jobsh.
//!
//! Provides the `JobTable`, a bounded registry of jobs keyed by [`JobId`].
//! A job is one command or one pipeline; every process of a job shares a
//! process group. The table owns each job's command text and releases it
//! exactly once, when the job is removed.

use std::collections::BTreeMap;
use std::fmt;

use nix::unistd::Pid;
use thiserror::Error;

pub use jobsh_types::{JobId, JobInfo, JobStatus};

/// Default capacity of the job table.
pub const DEFAULT_MAX_JOBS: usize = 20;

/// Errors from job table operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobTableError {
    #[error("job table full ({capacity} jobs)")]
    Full { capacity: usize },
}

/// Last known state of one process in a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Running,
    Stopped,
    Exited,
}

/// A state change reported by the OS for one process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessEvent {
    /// Exited normally or was killed by a signal.
    Exited,
    Stopped,
    Continued,
}

impl ProcessEvent {
    fn state(self) -> ProcessState {
        match self {
            ProcessEvent::Exited => ProcessState::Exited,
            ProcessEvent::Stopped => ProcessState::Stopped,
            ProcessEvent::Continued => ProcessState::Running,
        }
    }

    fn job_status(self) -> JobStatus {
        match self {
            ProcessEvent::Exited => JobStatus::Done,
            ProcessEvent::Stopped => JobStatus::Stopped,
            ProcessEvent::Continued => JobStatus::Running,
        }
    }
}

/// One member process of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Process {
    pub pid: Pid,
    pub state: ProcessState,
}

impl Process {
    pub fn new(pid: Pid, state: ProcessState) -> Self {
        Self { pid, state }
    }

    pub fn running(pid: Pid) -> Self {
        Self::new(pid, ProcessState::Running)
    }
}

/// A job: one command or pipeline sharing a process group.
#[derive(Debug, Clone)]
pub struct Job {
    id: JobId,
    pgid: Pid,
    status: JobStatus,
    command: String,
    is_pipeline: bool,
    processes: Vec<Process>,
}

impl Job {
    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn pgid(&self) -> Pid {
        self.pgid
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn is_pipeline(&self) -> bool {
        self.is_pipeline
    }

    pub fn processes(&self) -> &[Process] {
        &self.processes
    }

    /// Pids of members that have not exited yet.
    pub fn live_pids(&self) -> Vec<Pid> {
        self.processes
            .iter()
            .filter(|p| p.state != ProcessState::Exited)
            .map(|p| p.pid)
            .collect()
    }

    /// Snapshot for listing.
    pub fn info(&self) -> JobInfo {
        JobInfo {
            id: self.id,
            command: self.command.clone(),
            status: self.status,
            pgid: self.pgid.as_raw(),
            is_pipeline: self.is_pipeline,
        }
    }

    /// Status implied by the states of the member processes.
    fn derived_status(&self) -> JobStatus {
        if self.processes.iter().all(|p| p.state == ProcessState::Exited) {
            JobStatus::Done
        } else if self.processes.iter().any(|p| p.state == ProcessState::Stopped) {
            JobStatus::Stopped
        } else {
            JobStatus::Running
        }
    }
}

/// Kind of job-control notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Done,
    Stopped,
    Continued,
}

/// A one-line job-control notice for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobNotice {
    pub id: JobId,
    pub kind: NoticeKind,
    pub command: String,
}

impl JobNotice {
    fn new(job: &Job, kind: NoticeKind) -> Self {
        Self {
            id: job.id,
            kind,
            command: job.command.clone(),
        }
    }

    /// Notice for a job that has been removed from the table.
    fn done(job: Job) -> Self {
        Self {
            id: job.id,
            kind: NoticeKind::Done,
            command: job.command,
        }
    }

    /// Notice printed when a foreground job stops.
    pub fn stopped(job: &Job) -> Self {
        Self::new(job, NoticeKind::Stopped)
    }

    /// Notice printed when `bg` resumes a job.
    pub fn continued(job: &Job) -> Self {
        Self::new(job, NoticeKind::Continued)
    }
}

impl fmt::Display for JobNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            NoticeKind::Done => write!(f, "[{}]+\tDone\t\t{}", self.id, self.command),
            NoticeKind::Stopped => write!(f, "[{}]+\tStopped\t\t{}", self.id, self.command),
            NoticeKind::Continued => write!(f, "[{}]+\tContinued\t{}", self.id, self.command),
        }
    }
}

/// Bounded registry of jobs.
#[derive(Debug)]
pub struct JobTable {
    jobs: BTreeMap<JobId, Job>,
    next_id: u32,
    capacity: usize,
}

impl JobTable {
    /// Create a table with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_JOBS)
    }

    /// Create a table holding at most `capacity` jobs.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            jobs: BTreeMap::new(),
            next_id: 1,
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Register a job.
    ///
    /// `processes` lists every member; an empty list registers the group
    /// leader alone. Fails without touching the table when it is full.
    pub fn insert(
        &mut self,
        pgid: Pid,
        status: JobStatus,
        command: impl Into<String>,
        is_pipeline: bool,
        mut processes: Vec<Process>,
    ) -> Result<JobId, JobTableError> {
        if self.jobs.len() >= self.capacity {
            return Err(JobTableError::Full {
                capacity: self.capacity,
            });
        }

        if processes.is_empty() {
            let state = match status {
                JobStatus::Running => ProcessState::Running,
                JobStatus::Stopped => ProcessState::Stopped,
                JobStatus::Done => ProcessState::Exited,
            };
            processes.push(Process::new(pgid, state));
        }

        let id = JobId(self.next_id);
        self.next_id += 1;
        self.jobs.insert(
            id,
            Job {
                id,
                pgid,
                status,
                command: command.into(),
                is_pipeline,
                processes,
            },
        );
        Ok(id)
    }

    pub fn find_by_id(&self, id: JobId) -> Option<&Job> {
        self.jobs.get(&id)
    }

    pub fn find_by_process_group(&self, pgid: Pid) -> Option<&Job> {
        self.jobs.values().find(|job| job.pgid == pgid)
    }

    /// Find the job that has `pid` as a member.
    pub fn find_by_process(&self, pid: Pid) -> Option<&Job> {
        self.jobs
            .values()
            .find(|job| job.processes.iter().any(|p| p.pid == pid))
    }

    /// The most recent job (highest id).
    pub fn current(&self) -> Option<&Job> {
        self.jobs.values().next_back()
    }

    /// The most recent stopped job.
    pub fn current_stopped(&self) -> Option<&Job> {
        self.jobs
            .values()
            .rev()
            .find(|job| job.status == JobStatus::Stopped)
    }

    /// Jobs in id order. Each call starts a fresh iteration.
    pub fn list(&self) -> impl Iterator<Item = &Job> + '_ {
        self.jobs.values()
    }

    /// Snapshots of all jobs, in id order.
    pub fn infos(&self) -> Vec<JobInfo> {
        self.list().map(Job::info).collect()
    }

    /// Remove jobs whose status is Done without reporting them.
    ///
    /// Returns how many were removed.
    pub fn prune_done(&mut self) -> usize {
        let before = self.jobs.len();
        self.jobs.retain(|_, job| job.status != JobStatus::Done);
        before - self.jobs.len()
    }

    /// Set the status of the job owning process group `pgid`.
    ///
    /// Done removes the job and returns its completion notice. Stopped
    /// returns a stop notice when the job was not already stopped. An
    /// unknown `pgid` is a no-op.
    pub fn set_status(&mut self, pgid: Pid, status: JobStatus) -> Option<JobNotice> {
        let id = self.find_by_process_group(pgid)?.id;
        if let Some(job) = self.jobs.get_mut(&id) {
            let state = match status {
                JobStatus::Running => Some(ProcessState::Running),
                JobStatus::Stopped => Some(ProcessState::Stopped),
                JobStatus::Done => None,
            };
            if let Some(state) = state {
                for process in &mut job.processes {
                    if process.state != ProcessState::Exited {
                        process.state = state;
                    }
                }
            }
        }
        self.transition(id, status)
    }

    /// Record a state change of one member process and fold it into the
    /// job's status.
    ///
    /// A pid that is not a recorded member is applied to the whole job.
    pub fn mark_process(&mut self, pgid: Pid, pid: Pid, event: ProcessEvent) -> Option<JobNotice> {
        let id = self.find_by_process_group(pgid)?.id;
        let job = self.jobs.get_mut(&id)?;

        match job.processes.iter().position(|p| p.pid == pid) {
            Some(index) => {
                job.processes[index].state = event.state();
                let next = job.derived_status();
                self.transition(id, next)
            }
            None => self.set_status(pgid, event.job_status()),
        }
    }

    fn transition(&mut self, id: JobId, status: JobStatus) -> Option<JobNotice> {
        let job = self.jobs.get_mut(&id)?;
        let previous = job.status;
        match status {
            JobStatus::Done => self.jobs.remove(&id).map(JobNotice::done),
            JobStatus::Stopped => {
                job.status = JobStatus::Stopped;
                (previous != JobStatus::Stopped).then(|| JobNotice::new(job, NoticeKind::Stopped))
            }
            JobStatus::Running => {
                job.status = JobStatus::Running;
                None
            }
        }
    }
}

impl Default for JobTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(n: i32) -> Pid {
        Pid::from_raw(n)
    }

    fn pipeline(table: &mut JobTable, leader: i32, members: &[i32]) -> JobId {
        let processes = members.iter().map(|&m| Process::running(pid(m))).collect();
        table
            .insert(pid(leader), JobStatus::Running, "a | b", true, processes)
            .unwrap()
    }

    #[test]
    fn test_insert_assigns_increasing_ids() {
        let mut table = JobTable::new();
        let a = table.insert(pid(100), JobStatus::Running, "sleep 1", false, vec![]).unwrap();
        let b = table.insert(pid(200), JobStatus::Stopped, "vim", false, vec![]).unwrap();
        assert_eq!(a, JobId(1));
        assert_eq!(b, JobId(2));
        assert_eq!(table.len(), 2);
        assert_eq!(table.find_by_id(b).unwrap().command(), "vim");
    }

    #[test]
    fn test_insert_into_full_table_fails_and_keeps_entries() {
        let mut table = JobTable::with_capacity(2);
        table.insert(pid(100), JobStatus::Running, "one", false, vec![]).unwrap();
        table.insert(pid(200), JobStatus::Running, "two", false, vec![]).unwrap();

        let err = table
            .insert(pid(300), JobStatus::Running, "three", false, vec![])
            .unwrap_err();
        assert_eq!(err, JobTableError::Full { capacity: 2 });

        let commands: Vec<_> = table.list().map(|j| j.command().to_string()).collect();
        assert_eq!(commands, vec!["one", "two"]);
        assert!(table.find_by_process_group(pid(300)).is_none());
    }

    #[test]
    fn test_freed_slot_is_reused_with_a_new_id() {
        let mut table = JobTable::with_capacity(1);
        table.insert(pid(100), JobStatus::Running, "one", false, vec![]).unwrap();
        table.set_status(pid(100), JobStatus::Done);
        let id = table.insert(pid(200), JobStatus::Running, "two", false, vec![]).unwrap();
        assert_eq!(id, JobId(2));
    }

    #[test]
    fn test_set_status_done_removes_and_is_idempotent() {
        let mut table = JobTable::new();
        let id = table.insert(pid(100), JobStatus::Running, "sleep 5 &", false, vec![]).unwrap();

        let notice = table.set_status(pid(100), JobStatus::Done).unwrap();
        assert_eq!(notice.id, id);
        assert_eq!(notice.to_string(), "[1]+\tDone\t\tsleep 5 &");
        assert!(table.is_empty());

        assert!(table.set_status(pid(100), JobStatus::Done).is_none());
        assert!(table.set_status(pid(999), JobStatus::Stopped).is_none());
    }

    #[test]
    fn test_stop_notice_is_not_repeated() {
        let mut table = JobTable::new();
        table.insert(pid(100), JobStatus::Running, "cat", false, vec![]).unwrap();

        let first = table.set_status(pid(100), JobStatus::Stopped).unwrap();
        assert_eq!(first.to_string(), "[1]+\tStopped\t\tcat");
        assert!(table.set_status(pid(100), JobStatus::Stopped).is_none());
        assert!(table.set_status(pid(100), JobStatus::Running).is_none());
        assert_eq!(table.find_by_id(JobId(1)).unwrap().status(), JobStatus::Running);
    }

    #[test]
    fn test_pipeline_is_done_only_after_every_member_exits() {
        let mut table = JobTable::new();
        pipeline(&mut table, 10, &[10, 11, 12]);

        assert!(table.mark_process(pid(10), pid(11), ProcessEvent::Exited).is_none());
        assert!(table.mark_process(pid(10), pid(10), ProcessEvent::Exited).is_none());
        assert_eq!(table.find_by_process_group(pid(10)).unwrap().live_pids(), vec![pid(12)]);

        let notice = table.mark_process(pid(10), pid(12), ProcessEvent::Exited).unwrap();
        assert_eq!(notice.kind, NoticeKind::Done);
        assert!(table.is_empty());
    }

    #[test]
    fn test_pipeline_stop_reported_once_for_many_members() {
        let mut table = JobTable::new();
        pipeline(&mut table, 10, &[10, 11]);

        let notice = table.mark_process(pid(10), pid(10), ProcessEvent::Stopped);
        assert_eq!(notice.map(|n| n.kind), Some(NoticeKind::Stopped));
        assert!(table.mark_process(pid(10), pid(11), ProcessEvent::Stopped).is_none());

        table.mark_process(pid(10), pid(10), ProcessEvent::Continued);
        assert_eq!(table.current().unwrap().status(), JobStatus::Stopped);
        table.mark_process(pid(10), pid(11), ProcessEvent::Continued);
        assert_eq!(table.current().unwrap().status(), JobStatus::Running);
    }

    #[test]
    fn test_unknown_member_applies_to_whole_job() {
        let mut table = JobTable::new();
        table.insert(pid(100), JobStatus::Running, "make", false, vec![]).unwrap();
        let notice = table.mark_process(pid(100), pid(4242), ProcessEvent::Exited);
        assert_eq!(notice.map(|n| n.kind), Some(NoticeKind::Done));
    }

    #[test]
    fn test_find_by_process_sees_non_leaders() {
        let mut table = JobTable::new();
        let id = pipeline(&mut table, 10, &[10, 11]);
        assert_eq!(table.find_by_process(pid(11)).map(Job::id), Some(id));
        assert!(table.find_by_process(pid(12)).is_none());
    }

    #[test]
    fn test_current_and_current_stopped() {
        let mut table = JobTable::new();
        assert!(table.current().is_none());

        table.insert(pid(100), JobStatus::Stopped, "vim a", false, vec![]).unwrap();
        table.insert(pid(200), JobStatus::Running, "sleep 9", false, vec![]).unwrap();
        table.insert(pid(300), JobStatus::Stopped, "vim b", false, vec![]).unwrap();
        table.insert(pid(400), JobStatus::Running, "sleep 8", false, vec![]).unwrap();

        assert_eq!(table.current().unwrap().id(), JobId(4));
        assert_eq!(table.current_stopped().unwrap().id(), JobId(3));
    }

    #[test]
    fn test_list_is_restartable_and_prune_drops_done() {
        let mut table = JobTable::new();
        table.insert(pid(100), JobStatus::Running, "a", false, vec![]).unwrap();
        table.insert(pid(200), JobStatus::Done, "b", false, vec![]).unwrap();

        assert_eq!(table.list().count(), 2);
        assert_eq!(table.list().count(), 2);
        assert_eq!(table.prune_done(), 1);
        let infos = table.infos();
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].command, "a");
        assert_eq!(infos[0].pgid, 100);
    }

    #[test]
    fn test_continued_notice_format() {
        let mut table = JobTable::new();
        table.insert(pid(100), JobStatus::Stopped, "sleep 30", false, vec![]).unwrap();
        let job = table.current().unwrap();
        assert_eq!(JobNotice::continued(job).to_string(), "[1]+\tContinued\tsleep 30");
    }
}

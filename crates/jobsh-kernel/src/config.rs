//! Shell configuration.

use std::path::PathBuf;

use crate::parser::DEFAULT_MAX_STAGES;
use crate::paths;
use crate::scheduler::DEFAULT_MAX_JOBS;

/// Configuration for a [`Session`](crate::Session).
#[derive(Debug, Clone)]
pub struct ShellConfig {
    /// Name used as the prefix of diagnostics (`jobsh: ...`).
    pub name: String,

    /// Capacity of the job table.
    pub max_jobs: usize,

    /// Maximum number of stages in one pipeline.
    pub max_stages: usize,

    /// Directory searched for programs before `PATH`.
    pub aux_bin_dir: Option<PathBuf>,

    /// Whether to run with job control on the controlling terminal.
    ///
    /// `None` means detect: interactive when stdin is a terminal.
    pub interactive: Option<bool>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            name: "jobsh".to_string(),
            max_jobs: DEFAULT_MAX_JOBS,
            max_stages: DEFAULT_MAX_STAGES,
            aux_bin_dir: Some(paths::bin_dir()),
            interactive: None,
        }
    }
}

impl ShellConfig {
    /// Config for a shell attached to a terminal.
    pub fn interactive() -> Self {
        Self {
            interactive: Some(true),
            ..Self::default()
        }
    }

    /// Config for a shell that never touches the terminal.
    ///
    /// Used for `-c` execution and in tests.
    pub fn batch() -> Self {
        Self {
            interactive: Some(false),
            ..Self::default()
        }
    }

    /// Set the diagnostic prefix.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the job table capacity (at least one slot).
    pub fn with_max_jobs(mut self, max_jobs: usize) -> Self {
        self.max_jobs = max_jobs.max(1);
        self
    }

    /// Set the pipeline stage limit (at least one stage).
    pub fn with_max_stages(mut self, max_stages: usize) -> Self {
        self.max_stages = max_stages.max(1);
        self
    }

    /// Set or clear the auxiliary binary directory.
    pub fn with_aux_bin_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.aux_bin_dir = dir;
        self
    }

    /// Force interactive or batch mode instead of detecting it.
    pub fn with_interactive(mut self, interactive: bool) -> Self {
        self.interactive = Some(interactive);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_classic_limits() {
        let config = ShellConfig::default();
        assert_eq!(config.name, "jobsh");
        assert_eq!(config.max_jobs, 20);
        assert_eq!(config.max_stages, DEFAULT_MAX_STAGES);
        assert_eq!(config.interactive, None);
    }

    #[test]
    fn limits_never_drop_to_zero() {
        let config = ShellConfig::batch().with_max_jobs(0).with_max_stages(0);
        assert_eq!(config.max_jobs, 1);
        assert_eq!(config.max_stages, 1);
        assert_eq!(config.interactive, Some(false));
    }
}

//! Builtin command implementations.

mod bg;
mod cd;
mod exit;
mod fg;
mod jobs;

use jobsh_types::JobId;

use crate::scheduler::{Job, JobTable};

use super::traits::Builtin;

/// Names recognized as builtins.
pub const BUILTIN_NAMES: [&str; 5] = ["cd", "exit", "jobs", "fg", "bg"];

/// Find the builtin invoked by `name`.
pub fn lookup(name: &str) -> Option<&'static dyn Builtin> {
    match name {
        "cd" => Some(&cd::Cd),
        "exit" => Some(&exit::Exit),
        "jobs" => Some(&jobs::Jobs),
        "fg" => Some(&fg::Fg),
        "bg" => Some(&bg::Bg),
        _ => None,
    }
}

/// Resolve a job argument (`N` or `%N`), or fall back to `default`.
///
/// On failure returns the text to name in the "no such job" diagnostic.
fn target_job<'j>(
    arg: Option<&str>,
    jobs: &'j JobTable,
    default: Option<&'j Job>,
) -> Result<&'j Job, String> {
    match arg {
        Some(arg) => arg
            .parse::<JobId>()
            .ok()
            .and_then(|id| jobs.find_by_id(id))
            .ok_or_else(|| arg.to_string()),
        None => default.ok_or_else(|| "current".to_string()),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_name_resolves_to_itself() {
        for name in BUILTIN_NAMES {
            assert_eq!(lookup(name).map(|b| b.name()), Some(name));
        }
        assert!(lookup("ls").is_none());
    }
}

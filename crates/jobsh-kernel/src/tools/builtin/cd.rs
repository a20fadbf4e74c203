//! cd: Change working directory.

use std::path::PathBuf;

use crate::paths;
use crate::tools::{Builtin, BuiltinOutcome, ExecContext};

/// Cd builtin: change the shell's working directory.
pub struct Cd;

impl Builtin for Cd {
    fn name(&self) -> &'static str {
        "cd"
    }

    fn execute(&self, args: &[&str], ctx: &mut ExecContext<'_>) -> BuiltinOutcome {
        let arg = args.first().copied();

        // `cd -` returns to the previous directory, like bash
        let target: PathBuf = match arg {
            Some("-") => match ctx.prev_cwd.clone() {
                Some(prev) => prev,
                None => {
                    ctx.complain("cd", "OLDPWD not set");
                    return BuiltinOutcome::Continue(1);
                }
            },
            Some(path) => PathBuf::from(path),
            None => match paths::home_dir() {
                Some(home) => home,
                None => {
                    ctx.complain("cd", "HOME not set");
                    return BuiltinOutcome::Continue(1);
                }
            },
        };

        let previous = std::env::current_dir().ok();
        match std::env::set_current_dir(&target) {
            Ok(()) => {
                *ctx.prev_cwd = previous;
                if arg == Some("-") {
                    ctx.print(target.display());
                }
                BuiltinOutcome::Continue(0)
            }
            Err(e) => {
                ctx.complain("cd", format!("{}: {}", target.display(), e));
                BuiltinOutcome::Continue(1)
            }
        }
    }
}

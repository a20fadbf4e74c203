//! exit: Terminate the shell.

use crate::tools::{Builtin, BuiltinOutcome, ExecContext};

/// Exit builtin: terminate with status 0, or the given code.
pub struct Exit;

impl Builtin for Exit {
    fn name(&self) -> &'static str {
        "exit"
    }

    fn execute(&self, args: &[&str], ctx: &mut ExecContext<'_>) -> BuiltinOutcome {
        match args.first() {
            None => BuiltinOutcome::Exit(0),
            Some(code) => match code.parse::<i32>() {
                Ok(code) => BuiltinOutcome::Exit(code),
                Err(_) => {
                    ctx.complain("exit", format!("{}: numeric argument required", code));
                    BuiltinOutcome::Exit(2)
                }
            },
        }
    }
}

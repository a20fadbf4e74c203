//! Core builtin trait and types.

use super::context::ExecContext;

/// What the session does after a builtin returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinOutcome {
    /// Keep reading lines; the value becomes the last status.
    Continue(i32),
    /// Terminate the shell with this status.
    Exit(i32),
}

/// A command executed inside the shell process.
pub trait Builtin: Sync {
    /// Name the builtin is invoked by.
    fn name(&self) -> &'static str;

    /// Run with `args` (the words after the name).
    fn execute(&self, args: &[&str], ctx: &mut ExecContext<'_>) -> BuiltinOutcome;
}

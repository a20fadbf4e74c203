//! jobs: List the job table.

use crate::tools::{Builtin, BuiltinOutcome, ExecContext};

/// Jobs builtin: report state changes, drop finished jobs, list the rest.
pub struct Jobs;

impl Builtin for Jobs {
    fn name(&self) -> &'static str {
        "jobs"
    }

    fn execute(&self, _args: &[&str], ctx: &mut ExecContext<'_>) -> BuiltinOutcome {
        ctx.reap();
        let pruned = ctx.jobs.prune_done();
        if pruned > 0 {
            tracing::debug!(pruned, "dropped finished jobs");
        }

        for info in ctx.jobs.infos() {
            ctx.print(info);
        }
        BuiltinOutcome::Continue(0)
    }
}

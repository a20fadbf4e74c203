//! Builtins for jobsh.
//!
//! Builtins run inside the shell process because they change its state:
//! the working directory, the job table or whether the shell keeps running.
//!
//! ```text
//! lookup(name)
//! ├── cd    working directory
//! ├── exit  terminate the session
//! ├── jobs  list the job table
//! ├── fg    resume a job in the foreground
//! └── bg    resume a stopped job in the background
//! ```

mod builtin;
mod context;
mod traits;

pub use builtin::{lookup, BUILTIN_NAMES};
pub use context::ExecContext;
pub use traits::{Builtin, BuiltinOutcome};

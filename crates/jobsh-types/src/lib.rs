//! Pure data types for jobsh: job identifiers, statuses and listings.
//!
//! This crate is a leaf dependency with no process control and no I/O.
//! It exists so that frontends can render job information without pulling
//! in jobsh-kernel's process and signal machinery.

pub mod job;

pub use job::*;

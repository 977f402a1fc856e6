//! Culvert - run child processes while keeping their output drained.
//!
//! Runs an external command and concurrently drains its stdout and stderr to
//! independent per-stream destinations: a leveled log sink, an in-memory
//! capture buffer, or the OS null device.
//!
//! Architecture:
//! - [`run`] spawns the child and polls it for exit on a short interval,
//!   never blocking on a wait while pipes are open
//! - one background worker per piped stream keeps the pipe drained the whole
//!   time, which is what rules out the classic full-pipe-buffer deadlock
//! - capture buffers travel back through worker joins, so output is only
//!   observable once its stream has been fully drained
//!
//! Logging goes through an injected [`LineLogger`]; [`TracingLogger`] is
//! provided for applications that already use `tracing`, and the crate never
//! installs a subscriber of its own.

mod drain;
mod error;
mod logger;
mod run;

pub use drain::{decode_utf8_lossy, DecodeFn};
pub use error::{Error, Result};
pub use logger::{Level, LineLogger, TracingLogger};
pub use run::{run, RunOptions, RunResult, StreamPolicy};

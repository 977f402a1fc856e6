//! Concurrent draining of child process output streams.
//!
//! One [`DrainWorker`] per piped stream keeps reading while the child runs,
//! which is what prevents the child from blocking on a full pipe buffer.

mod sink;
mod worker;

pub use sink::{decode_utf8_lossy, DecodeFn};
pub(crate) use worker::DrainWorker;

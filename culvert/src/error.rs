//! Error types for process execution and stream draining.

use std::io;

use thiserror::Error;

/// Errors surfaced by [`run`](crate::run).
#[derive(Debug, Error)]
pub enum Error {
    /// Both stdin sources were supplied.
    #[error("only one of `stdin_data` or `stdin_io` may be supplied")]
    StdinConflict,

    /// The OS failed to create the child process.
    #[error("failed to spawn process: {program}")]
    Spawn {
        /// The program that could not be started.
        program: String,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// Writing `stdin_data` to the child failed.
    #[error("failed to write stdin data to child process")]
    Stdin(#[source] io::Error),

    /// Polling the child for its exit status failed.
    #[error("failed to poll child process for exit")]
    Wait(#[source] io::Error),

    /// A drain worker failed while reading a child stream.
    #[error("failed to drain child {stream}")]
    Drain {
        /// Which stream was being drained, `"stdout"` or `"stderr"`.
        stream: &'static str,
        /// Underlying read or task error.
        #[source]
        source: io::Error,
    },

    /// The child exited with a nonzero code while `check` was enabled.
    #[error("command {command:?} exited with code {code}")]
    Exit {
        /// Exit code reported by the child.
        code: i32,
        /// The command line the child was started with.
        command: Vec<String>,
        /// Captured stdout, if the stdout policy was `capture`.
        stdout: Option<Vec<u8>>,
        /// Captured stderr, if the stderr policy was `capture`.
        stderr: Option<Vec<u8>>,
    },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

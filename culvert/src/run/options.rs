//! Configuration for a single process run.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;

use serde::{Deserialize, Serialize};

use crate::drain::{decode_utf8_lossy, DecodeFn};
use crate::logger::Level;

/// Disposition of one output stream of the child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StreamPolicy {
    /// Pipe the stream to the logger, line by line.
    #[default]
    Log,
    /// Capture the stream and return its bytes in the run result.
    Capture,
    /// Send the stream to the OS null device; no pipe is created and no
    /// worker is attached.
    Discard,
}

impl StreamPolicy {
    /// String form of the policy.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Log => "log",
            Self::Capture => "capture",
            Self::Discard => "discard",
        }
    }
}

impl std::fmt::Display for StreamPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Configuration options for running a process with drained output.
#[derive(Debug)]
pub struct RunOptions {
    /// The program and its arguments. Under `shell`, the first element is the
    /// command line and any further elements become positional parameters.
    pub command: Vec<String>,

    /// Whether to run the command through `sh -c`.
    pub shell: bool,

    /// Working directory for the child.
    pub working_dir: Option<PathBuf>,

    /// Environment variables to set (merged with the current env).
    pub env: HashMap<String, String>,

    /// Environment variables to remove.
    pub env_remove: Vec<String>,

    /// Whether to clear the environment before adding env vars.
    pub env_clear: bool,

    /// Severity at which drained lines are logged (default: DEBUG).
    pub level: Level,

    /// Decoder applied to logged lines (default: lossy UTF-8).
    pub decode: DecodeFn,

    /// Whether a nonzero exit code turns into an error (default: true).
    pub check: bool,

    /// Disposition of the child's stdout (default: log).
    pub stdout: StreamPolicy,

    /// Disposition of the child's stderr (default: log).
    pub stderr: StreamPolicy,

    /// Bytes to write to the child's stdin, after which stdin is closed.
    /// Mutually exclusive with `stdin_io`.
    pub stdin_data: Option<Vec<u8>>,

    /// A handle passed straight through as the child's stdin. Mutually
    /// exclusive with `stdin_data`.
    pub stdin_io: Option<Stdio>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            command: Vec::new(),
            shell: false,
            working_dir: None,
            env: HashMap::new(),
            env_remove: Vec::new(),
            env_clear: false,
            level: Level::DEBUG,
            decode: decode_utf8_lossy,
            check: true,
            stdout: StreamPolicy::Log,
            stderr: StreamPolicy::Log,
            stdin_data: None,
            stdin_io: None,
        }
    }
}

impl RunOptions {
    /// Create new options for the given program.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            command: vec![program.into()],
            ..Self::default()
        }
    }

    /// Create new options for a command line run through `sh -c`.
    pub fn shell(command: impl Into<String>) -> Self {
        Self {
            command: vec![command.into()],
            shell: true,
            ..Self::default()
        }
    }

    /// Add an argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.command.push(arg.into());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set the working directory.
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Set an environment variable.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set multiple environment variables.
    pub fn envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in vars {
            self.env.insert(k.into(), v.into());
        }
        self
    }

    /// Remove an environment variable.
    pub fn env_remove(mut self, key: impl Into<String>) -> Self {
        self.env_remove.push(key.into());
        self
    }

    /// Clear the environment before setting variables.
    pub fn env_clear(mut self) -> Self {
        self.env_clear = true;
        self
    }

    /// Set the severity at which drained lines are logged.
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Set the decoder applied to logged lines.
    pub fn decode(mut self, decode: DecodeFn) -> Self {
        self.decode = decode;
        self
    }

    /// Set whether a nonzero exit code turns into an error.
    pub fn check(mut self, check: bool) -> Self {
        self.check = check;
        self
    }

    /// Set the disposition of the child's stdout.
    pub fn stdout(mut self, policy: StreamPolicy) -> Self {
        self.stdout = policy;
        self
    }

    /// Set the disposition of the child's stderr.
    pub fn stderr(mut self, policy: StreamPolicy) -> Self {
        self.stderr = policy;
        self
    }

    /// Write the given bytes to the child's stdin, then close it.
    pub fn stdin_data(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.stdin_data = Some(data.into());
        self
    }

    /// Use the given handle as the child's stdin.
    pub fn stdin_io(mut self, io: impl Into<Stdio>) -> Self {
        self.stdin_io = Some(io.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = RunOptions::new("true");
        assert_eq!(options.command, vec!["true"]);
        assert!(!options.shell);
        assert!(options.check);
        assert_eq!(options.stdout, StreamPolicy::Log);
        assert_eq!(options.stderr, StreamPolicy::Log);
        assert_eq!(options.level, Level::DEBUG);
    }

    #[test]
    fn test_shell_mode() {
        let options = RunOptions::shell("echo hi").arg("positional");
        assert!(options.shell);
        assert_eq!(options.command, vec!["echo hi", "positional"]);
    }

    #[test]
    fn test_policy_string_form() {
        assert_eq!(StreamPolicy::Capture.as_str(), "capture");
        assert_eq!(
            serde_json::to_string(&StreamPolicy::Discard).unwrap(),
            "\"discard\""
        );
        assert_eq!(
            serde_json::from_str::<StreamPolicy>("\"log\"").unwrap(),
            StreamPolicy::Log
        );
    }
}

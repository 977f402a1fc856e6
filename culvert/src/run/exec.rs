//! Process execution with concurrently drained output.
//!
//! The runner never calls a blocking wait while output pipes are open. A
//! kernel pipe buffer is bounded; a child that fills it blocks on write, and
//! a parent blocked in wait at the same time never reads, which is a
//! permanent deadlock. Polling the exit status on a short interval keeps the
//! drain workers reading the whole time.

use std::io;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};
use tokio::time::sleep;

use crate::drain::DrainWorker;
use crate::error::{Error, Result};
use crate::logger::{Level, LineLogger};

use super::options::{RunOptions, StreamPolicy};

/// How often the child is polled for exit while its streams drain.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Record of a completed run.
#[derive(Debug, Clone)]
pub struct RunResult {
    /// The command line the child was started with.
    pub command: Vec<String>,

    /// Exit code of the child. On Unix a child killed by a signal reports
    /// the negated signal number.
    pub code: i32,

    /// Captured stdout bytes, present only under [`StreamPolicy::Capture`].
    pub stdout: Option<Vec<u8>>,

    /// Captured stderr bytes, present only under [`StreamPolicy::Capture`].
    pub stderr: Option<Vec<u8>>,
}

impl RunResult {
    /// Whether the child exited with code zero.
    pub const fn success(&self) -> bool {
        self.code == 0
    }

    /// Captured stdout decoded as lossy UTF-8.
    pub fn stdout_string(&self) -> Option<String> {
        self.stdout
            .as_deref()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Captured stderr decoded as lossy UTF-8.
    pub fn stderr_string(&self) -> Option<String> {
        self.stderr
            .as_deref()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }
}

/// Run a command to completion, draining its output while it runs.
///
/// Each output stream is handled according to its [`StreamPolicy`]: piped to
/// `logger` line by line, captured into the result, or discarded at the OS
/// level. Before anything is drained, one DEBUG record describing the
/// invocation is emitted; it is always the first log record of a run.
///
/// Stdin is fed from `stdin_data` or `stdin_io`, never both; supplying both
/// fails with [`Error::StdinConflict`] before any process is spawned.
///
/// With `check` enabled (the default), a nonzero exit code becomes
/// [`Error::Exit`] carrying the code, the command and whatever was captured.
///
/// There is no timeout or cancellation; a caller racing this against a timer
/// must accept that the child may be left running.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
///
/// use culvert::{run, RunOptions, StreamPolicy, TracingLogger};
///
/// #[tokio::main]
/// async fn main() -> culvert::Result<()> {
///     let result = run(
///         RunOptions::new("ls")
///             .arg("-la")
///             .stdout(StreamPolicy::Capture),
///         Arc::new(TracingLogger),
///     )
///     .await?;
///
///     print!("{}", result.stdout_string().unwrap_or_default());
///     Ok(())
/// }
/// ```
pub async fn run(options: RunOptions, logger: Arc<dyn LineLogger>) -> Result<RunResult> {
    let RunOptions {
        command,
        shell,
        working_dir,
        env,
        env_remove,
        env_clear,
        level,
        decode,
        check,
        stdout,
        stderr,
        stdin_data,
        stdin_io,
    } = options;

    if stdin_data.is_some() && stdin_io.is_some() {
        return Err(Error::StdinConflict);
    }

    logger.log_line(
        Level::DEBUG,
        &format!("Starting process: {}", render_command(&command)),
    );

    let mut cmd = if shell {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").args(&command);
        cmd
    } else {
        let Some((program, args)) = command.split_first() else {
            return Err(Error::Spawn {
                program: String::new(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "empty command line"),
            });
        };
        let mut cmd = Command::new(program);
        cmd.args(args);
        cmd
    };

    if let Some(ref dir) = working_dir {
        cmd.current_dir(dir);
    }

    if env_clear {
        cmd.env_clear();
    }
    for key in &env_remove {
        cmd.env_remove(key);
    }
    for (key, value) in &env {
        cmd.env(key, value);
    }

    cmd.stdout(stdio_for(stdout)).stderr(stdio_for(stderr));

    if stdin_data.is_some() {
        cmd.stdin(Stdio::piped());
    } else if let Some(stdin_io) = stdin_io {
        cmd.stdin(stdin_io);
    }

    let mut child = cmd.spawn().map_err(|source| Error::Spawn {
        program: if shell {
            String::from("sh")
        } else {
            command[0].clone()
        },
        source,
    })?;

    // Feed and close stdin before any drain worker is attached, so the child
    // sees end-of-input.
    if let Some(data) = stdin_data {
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(&data).await.map_err(Error::Stdin)?;
            stdin.shutdown().await.map_err(Error::Stdin)?;
        }
    }

    let mut stdout_worker = match stdout {
        StreamPolicy::Log => DrainWorker::log(
            child.stdout.take(),
            "stdout",
            logger.clone(),
            level,
            decode,
        ),
        StreamPolicy::Capture => DrainWorker::capture(child.stdout.take(), "stdout"),
        StreamPolicy::Discard => DrainWorker::idle("stdout"),
    };
    let mut stderr_worker = match stderr {
        StreamPolicy::Log => DrainWorker::log(
            child.stderr.take(),
            "stderr",
            logger.clone(),
            level,
            decode,
        ),
        StreamPolicy::Capture => DrainWorker::capture(child.stderr.take(), "stderr"),
        StreamPolicy::Discard => DrainWorker::idle("stderr"),
    };

    let status = poll_until_exit(&mut child).await;

    // Join both workers before inspecting anything, and attempt the second
    // join regardless of the outcome of the first. Drain failures surface
    // here, not in the poll loop.
    let stdout_bytes = stdout_worker.join().await;
    let stderr_bytes = stderr_worker.join().await;

    let status = status?;
    let stdout_bytes = stdout_bytes?;
    let stderr_bytes = stderr_bytes?;

    let code = exit_code(status);

    if check && code != 0 {
        return Err(Error::Exit {
            code,
            command,
            stdout: stdout_bytes,
            stderr: stderr_bytes,
        });
    }

    Ok(RunResult {
        command,
        code,
        stdout: stdout_bytes,
        stderr: stderr_bytes,
    })
}

/// Poll the child until its exit status is available.
///
/// `try_wait` never blocks, so the drain workers keep making progress during
/// every interval. Do not replace this with `wait`.
async fn poll_until_exit(child: &mut Child) -> Result<ExitStatus> {
    loop {
        if let Some(status) = child.try_wait().map_err(Error::Wait)? {
            return Ok(status);
        }
        sleep(POLL_INTERVAL).await;
    }
}

fn render_command(command: &[String]) -> String {
    serde_json::to_string(command).unwrap_or_else(|_| format!("{:?}", command))
}

fn stdio_for(policy: StreamPolicy) -> Stdio {
    match policy {
        StreamPolicy::Discard => Stdio::null(),
        StreamPolicy::Log | StreamPolicy::Capture => Stdio::piped(),
    }
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;

    status
        .code()
        .or_else(|| status.signal().map(|signal| -signal))
        .unwrap_or(-1)
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

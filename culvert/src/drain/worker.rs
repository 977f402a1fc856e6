//! Background workers that drain one child stream each.

use std::io;
use std::sync::Arc;

use tokio::io::AsyncRead;
use tokio::task::JoinHandle;

use crate::error::Error;
use crate::logger::{Level, LineLogger};

use super::sink::{drain_to_buffer, drain_to_logger, DecodeFn};

/// A background task draining exactly one stream of a child process.
///
/// The task starts running as soon as the worker is constructed and must be
/// joined exactly once. Capture buffers travel back through
/// [`join`](Self::join), which makes reading a buffer before its stream is
/// fully drained unrepresentable.
pub(crate) struct DrainWorker {
    stream: &'static str,
    handle: Option<JoinHandle<io::Result<Option<Vec<u8>>>>>,
}

impl DrainWorker {
    /// Worker that logs each line of `stream` at `level`.
    ///
    /// An absent stream yields an idle worker, so both output streams compose
    /// uniformly regardless of policy.
    pub fn log<R>(
        stream: Option<R>,
        name: &'static str,
        logger: Arc<dyn LineLogger>,
        level: Level,
        decode: DecodeFn,
    ) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let handle = stream.map(|stream| {
            tokio::spawn(async move {
                drain_to_logger(stream, logger, level, decode).await?;
                Ok(None)
            })
        });
        Self {
            stream: name,
            handle,
        }
    }

    /// Worker that accumulates `stream` verbatim into a capture buffer.
    pub fn capture<R>(stream: Option<R>, name: &'static str) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let handle = stream
            .map(|stream| tokio::spawn(async move { drain_to_buffer(stream).await.map(Some) }));
        Self {
            stream: name,
            handle,
        }
    }

    /// Worker that does nothing; used for discarded streams.
    pub const fn idle(name: &'static str) -> Self {
        Self {
            stream: name,
            handle: None,
        }
    }

    /// Block until the drain task has finished and return its capture buffer,
    /// if it had one.
    ///
    /// Idle workers return immediately. A read failure or a panicked task
    /// surfaces here as [`Error::Drain`].
    pub async fn join(&mut self) -> Result<Option<Vec<u8>>, Error> {
        let Some(handle) = self.handle.take() else {
            return Ok(None);
        };
        match handle.await {
            Ok(Ok(buffer)) => Ok(buffer),
            Ok(Err(source)) => Err(Error::Drain {
                stream: self.stream,
                source,
            }),
            Err(join_error) => Err(Error::Drain {
                stream: self.stream,
                source: io::Error::other(join_error),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drain::sink::decode_utf8_lossy;
    use crate::logger::test_support::RecordingLogger;

    #[tokio::test]
    async fn test_idle_worker_joins_immediately() {
        let mut worker = DrainWorker::idle("stdout");
        assert!(worker.join().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_absent_stream_is_idle() {
        let mut worker = DrainWorker::capture(None::<&[u8]>, "stdout");
        assert!(worker.join().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_capture_worker_returns_buffer_at_join() {
        let mut worker = DrainWorker::capture(Some(&b"a\nb\n"[..]), "stdout");
        let buffer = worker.join().await.unwrap();
        assert_eq!(buffer.unwrap(), b"a\nb\n");
    }

    #[tokio::test]
    async fn test_log_worker_forwards_lines() {
        let logger = Arc::new(RecordingLogger::default());
        let mut worker = DrainWorker::log(
            Some(&b"x\ny\n"[..]),
            "stderr",
            logger.clone(),
            Level::WARN,
            decode_utf8_lossy,
        );
        assert!(worker.join().await.unwrap().is_none());
        assert_eq!(logger.messages(), vec!["x", "y"]);
    }
}

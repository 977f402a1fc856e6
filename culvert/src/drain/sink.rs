//! Line-oriented sinks for child process output.
//!
//! A drainer reads one stream to end-of-stream and forwards every line, in
//! arrival order, to exactly one destination: a leveled logger or a byte
//! buffer. Draining is what keeps the kernel pipe buffer from filling while
//! the child runs.

use std::io;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

use crate::logger::{Level, LineLogger};

/// Decodes one raw output line to text before it is logged.
///
/// The default is [`decode_utf8_lossy`]; callers whose children emit some
/// other encoding can supply their own function. Decoding must not fail on
/// malformed input.
pub type DecodeFn = fn(&[u8]) -> String;

/// Lossy UTF-8 decoding; invalid byte sequences become replacement
/// characters.
pub fn decode_utf8_lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Read `stream` to end-of-stream, logging each line at `level`.
///
/// Lines are decoded with `decode` and stripped of trailing whitespace before
/// being handed to the logger.
pub(super) async fn drain_to_logger<R>(
    stream: R,
    logger: Arc<dyn LineLogger>,
    level: Level,
    decode: DecodeFn,
) -> io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stream);
    let mut line = Vec::new();
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).await? == 0 {
            return Ok(());
        }
        let text = decode(&line);
        logger.log_line(level, text.trim_end());
    }
}

/// Read `stream` to end-of-stream, accumulating it verbatim.
///
/// Line terminators are preserved; the returned bytes are exactly what the
/// child wrote.
pub(super) async fn drain_to_buffer<R>(stream: R) -> io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stream);
    let mut buffer = Vec::new();
    loop {
        if reader.read_until(b'\n', &mut buffer).await? == 0 {
            return Ok(buffer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::test_support::RecordingLogger;

    #[tokio::test]
    async fn test_log_lines_in_order() {
        let logger = Arc::new(RecordingLogger::default());
        drain_to_logger(
            &b"first\nsecond\nthird\n"[..],
            logger.clone(),
            Level::INFO,
            decode_utf8_lossy,
        )
        .await
        .unwrap();

        assert_eq!(logger.messages(), vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_log_strips_trailing_whitespace() {
        let logger = Arc::new(RecordingLogger::default());
        drain_to_logger(
            &b"padded  \r\n"[..],
            logger.clone(),
            Level::DEBUG,
            decode_utf8_lossy,
        )
        .await
        .unwrap();

        assert_eq!(logger.messages(), vec!["padded"]);
    }

    #[tokio::test]
    async fn test_log_decodes_invalid_utf8_lossily() {
        let logger = Arc::new(RecordingLogger::default());
        drain_to_logger(
            &b"\xff\xfeok\n"[..],
            logger.clone(),
            Level::DEBUG,
            decode_utf8_lossy,
        )
        .await
        .unwrap();

        let messages = logger.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains('\u{FFFD}'));
        assert!(messages[0].ends_with("ok"));
    }

    #[tokio::test]
    async fn test_empty_stream_logs_nothing() {
        let logger = Arc::new(RecordingLogger::default());
        drain_to_logger(
            tokio::io::empty(),
            logger.clone(),
            Level::DEBUG,
            decode_utf8_lossy,
        )
        .await
        .unwrap();

        assert!(logger.messages().is_empty());
    }

    #[tokio::test]
    async fn test_capture_is_verbatim() {
        let bytes = drain_to_buffer(&b"one\ntwo\r\nthree"[..]).await.unwrap();
        assert_eq!(bytes, b"one\ntwo\r\nthree");
    }

    #[tokio::test]
    async fn test_capture_empty_stream() {
        let bytes = drain_to_buffer(tokio::io::empty()).await.unwrap();
        assert!(bytes.is_empty());
    }
}

//! Leveled line logging for drained process output.
//!
//! The runner never talks to a logging backend directly. It is handed a
//! [`LineLogger`] and emits one call per drained line; handlers, formatting
//! and filtering stay entirely with the caller.

pub use tracing::Level;

/// A sink for leveled, line-oriented log messages.
///
/// Implementations should be cheap to call, since a chatty child process
/// produces one call per output line.
pub trait LineLogger: Send + Sync {
    /// Emit a single line at the given severity.
    fn log_line(&self, level: Level, message: &str);
}

/// A [`LineLogger`] that forwards every line as a `tracing` event.
///
/// This is the logger to reach for when the application already has a
/// `tracing` subscriber installed; the runner itself never installs one.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl LineLogger for TracingLogger {
    fn log_line(&self, level: Level, message: &str) {
        match level {
            Level::ERROR => tracing::error!("{}", message),
            Level::WARN => tracing::warn!("{}", message),
            Level::INFO => tracing::info!("{}", message),
            Level::DEBUG => tracing::debug!("{}", message),
            _ => tracing::trace!("{}", message),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Mutex;

    use super::{Level, LineLogger};

    /// Records every line it is handed, for assertions in tests.
    #[derive(Debug, Default)]
    pub struct RecordingLogger {
        records: Mutex<Vec<(Level, String)>>,
    }

    impl RecordingLogger {
        /// All records in arrival order.
        pub fn records(&self) -> Vec<(Level, String)> {
            self.records.lock().unwrap().clone()
        }

        /// Just the messages, in arrival order.
        pub fn messages(&self) -> Vec<String> {
            self.records
                .lock()
                .unwrap()
                .iter()
                .map(|(_, message)| message.clone())
                .collect()
        }
    }

    impl LineLogger for RecordingLogger {
        fn log_line(&self, level: Level, message: &str) {
            self.records
                .lock()
                .unwrap()
                .push((level, message.to_string()));
        }
    }
}

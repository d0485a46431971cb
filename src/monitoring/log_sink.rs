// Copyright 2025 ProximaDB
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.

//! Log sink handle handed from test code to the server.
//!
//! A sink is a `tracing` dispatcher. Everything the server and the fixture
//! log while working on behalf of a test is routed through the sink the test
//! supplied, independently of any global subscriber.

use parking_lot::Mutex;
use std::io;
use std::sync::Arc;
use tracing::{Dispatch, Level, Subscriber};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SinkKind {
    Null,
    Global,
    Subscriber,
    Capture,
}

#[derive(Clone)]
pub struct LogSink {
    dispatch: Dispatch,
    kind: SinkKind,
}

impl LogSink {
    /// Discard everything
    pub fn null() -> Self {
        Self {
            dispatch: Dispatch::none(),
            kind: SinkKind::Null,
        }
    }

    /// Forward to the dispatcher that is current at the time of the call,
    /// normally the global subscriber.
    pub fn global() -> Self {
        Self {
            dispatch: tracing::dispatcher::get_default(|current| current.clone()),
            kind: SinkKind::Global,
        }
    }

    pub fn from_subscriber<S>(subscriber: S) -> Self
    where
        S: Subscriber + Send + Sync + 'static,
    {
        Self {
            dispatch: Dispatch::new(subscriber),
            kind: SinkKind::Subscriber,
        }
    }

    /// A sink that records formatted log lines in memory
    pub fn capture() -> (Self, CapturedLogs) {
        let logs = CapturedLogs::default();
        let buffer = logs.buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || CaptureWriter(buffer.clone()))
            .with_ansi(false)
            .with_target(true)
            .with_max_level(Level::DEBUG)
            .finish();

        let sink = Self {
            dispatch: Dispatch::new(subscriber),
            kind: SinkKind::Capture,
        };
        (sink, logs)
    }

    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    pub fn is_null(&self) -> bool {
        self.kind == SinkKind::Null
    }

    /// Run `f` with this sink as the default dispatcher
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::null()
    }
}

impl std::fmt::Debug for LogSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogSink").field("kind", &self.kind).finish()
    }
}

/// In-memory log buffer filled by a [`LogSink::capture`] sink
#[derive(Clone, Default)]
pub struct CapturedLogs {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.contents().contains(needle)
    }

    pub fn clear(&self) {
        self.buffer.lock().clear();
    }
}

impl std::fmt::Debug for CapturedLogs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapturedLogs")
            .field("bytes", &self.buffer.lock().len())
            .finish()
    }
}

struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

impl io::Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_sink_records_events() {
        let (sink, logs) = LogSink::capture();
        sink.in_scope(|| tracing::warn!("cleanup of {} failed", "proximadb-1.toml"));

        assert!(logs.contains("cleanup of proximadb-1.toml failed"));
        assert!(logs.contains("WARN"));
        assert_eq!(logs.lines().len(), 1);
    }

    #[test]
    fn test_capture_sink_is_scoped() {
        let (sink, logs) = LogSink::capture();
        tracing::info!("outside the sink");
        sink.in_scope(|| tracing::info!("inside the sink"));

        assert!(logs.contains("inside the sink"));
        assert!(!logs.contains("outside the sink"));
    }

    #[test]
    fn test_null_sink_is_default() {
        let sink = LogSink::default();
        assert!(sink.is_null());
        assert_eq!(sink.in_scope(|| 42), 42);
    }

    #[test]
    fn test_clear_empties_buffer() {
        let (sink, logs) = LogSink::capture();
        sink.in_scope(|| tracing::debug!("noise"));
        logs.clear();
        assert!(logs.contents().is_empty());
    }
}

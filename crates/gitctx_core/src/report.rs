//! User-facing notices emitted by the engine.
//!
//! Diagnostics go through `tracing` directly. Notices meant for the person
//! running a command ("already initialized", "archive skipped") go through a
//! [`Reporter`] owned by each engine, so two engines never share an output
//! stream and tests can inspect exactly what one engine said.

use std::sync::{Arc, Mutex};

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Informational.
    Info,
    /// Something was skipped or degraded.
    Warn,
}

/// Sink for user-facing notices.
pub trait Reporter: Send + Sync {
    /// Emits one notice.
    fn report(&self, level: Level, message: &str);

    /// Emits an informational notice.
    fn info(&self, message: &str) {
        self.report(Level::Info, message);
    }

    /// Emits a warning.
    fn warn(&self, message: &str) {
        self.report(Level::Warn, message);
    }
}

/// Forwards notices to `tracing` under the `gitctx::report` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, level: Level, message: &str) {
        match level {
            Level::Info => tracing::info!(target: "gitctx::report", "{}", message),
            Level::Warn => tracing::warn!(target: "gitctx::report", "{}", message),
        }
    }
}

/// Collects notices in memory. Clones share the same buffer.
#[derive(Debug, Default, Clone)]
pub struct MemoryReporter {
    lines: Arc<Mutex<Vec<(Level, String)>>>,
}

impl MemoryReporter {
    /// Creates an empty reporter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every notice so far, oldest first.
    pub fn lines(&self) -> Vec<(Level, String)> {
        match self.lines.lock() {
            Ok(lines) => lines.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Returns the messages only.
    pub fn messages(&self) -> Vec<String> {
        self.lines().into_iter().map(|(_, m)| m).collect()
    }

    /// True if any notice contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|(_, m)| m.contains(needle))
    }
}

impl Reporter for MemoryReporter {
    fn report(&self, level: Level, message: &str) {
        let mut lines = match self.lines.lock() {
            Ok(lines) => lines,
            Err(poisoned) => poisoned.into_inner(),
        };
        lines.push((level, message.to_string()));
    }
}

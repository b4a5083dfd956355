use chrono::{DateTime, TimeZone, Utc};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Controllable time for commit timestamps and temp-file cleanup.
///
/// Pass it to `ContextEngine::with_time_provider()`; clones share the
/// same instant.
#[derive(Clone)]
pub struct MockClock {
    current: Arc<AtomicI64>,
}

impl MockClock {
    /// Create a new mock clock starting at current time
    pub fn new() -> Self {
        Self::at(Utc::now())
    }

    /// Create a clock fixed at `start`
    pub fn at(start: DateTime<Utc>) -> Self {
        Self {
            current: Arc::new(AtomicI64::new(start.timestamp())),
        }
    }

    /// Time provider closure reading this clock
    pub fn as_provider(&self) -> impl Fn() -> DateTime<Utc> + Send + Sync + 'static {
        let current = self.current.clone();
        move || to_datetime(current.load(Ordering::SeqCst))
    }

    /// Current instant
    pub fn now(&self) -> DateTime<Utc> {
        to_datetime(self.current.load(Ordering::SeqCst))
    }

    /// Advance time by duration
    pub fn advance(&self, duration: Duration) {
        self.current
            .fetch_add(duration.as_secs() as i64, Ordering::SeqCst);
    }

    /// Advance time by hours
    pub fn advance_hours(&self, hours: u64) {
        self.advance(Duration::from_secs(hours * 3600));
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

fn to_datetime(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or_default()
}

//! Flush pacing.
//!
//! There is no timer task: the session asks the scheduler whether a flush is
//! due each time a fragment arrives, so flush timing is bounded below by
//! fragment inter-arrival latency.

use std::time::Duration;

use tokio::time::Instant;

/// Whether a flush is due at `now`.
///
/// A session that has never flushed is always due, so the first completed
/// line reaches the sink without waiting a full interval.
#[must_use]
pub fn should_flush(now: Instant, last_flush_at: Option<Instant>, interval: Duration) -> bool {
    match last_flush_at {
        None => true,
        Some(last) => now.saturating_duration_since(last) >= interval,
    }
}

/// Tracks flush times for one session.
#[derive(Debug, Clone)]
pub struct PacedScheduler {
    interval: Duration,
    last_flush_at: Option<Instant>,
}

impl PacedScheduler {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_flush_at: None,
        }
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    #[must_use]
    pub fn last_flush_at(&self) -> Option<Instant> {
        self.last_flush_at
    }

    #[must_use]
    pub fn is_due(&self, now: Instant) -> bool {
        should_flush(now, self.last_flush_at, self.interval)
    }

    /// Record a flush performed at `now`.
    ///
    /// Advances by exactly one interval rather than jumping to `now`, so a
    /// session that fell behind keeps flushing back-to-back until caught up.
    pub fn record_flush(&mut self, now: Instant) {
        self.last_flush_at = Some(match self.last_flush_at {
            None => now,
            Some(last) => last + self.interval,
        });
    }

    /// Drop catch-up credit older than one interval.
    ///
    /// Called when the session has nothing left to flush.
    pub fn settle(&mut self, now: Instant) {
        if let Some(last) = self.last_flush_at
            && now.saturating_duration_since(last) > self.interval
        {
            self.last_flush_at = Some(now.checked_sub(self.interval).unwrap_or(last));
        }
    }
}

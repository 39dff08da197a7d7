use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use chrono::Utc;

/// Source of proof timestamps and temporal anchors.
///
/// `anchor` values act as a nonce component of the signing key, so a clock
/// must never hand out the same anchor twice.
pub trait TemporalClock: Send + Sync {
    /// Wall-clock milliseconds since the UNIX epoch.
    fn now_ms(&self) -> i64;
    /// High-resolution, strictly increasing counter.
    fn anchor(&self) -> u64;
}

/// Wall clock with a nanosecond anchor that is bumped whenever the system
/// clock would repeat or step backwards.
#[derive(Debug, Default)]
pub struct SystemClock {
    last_anchor: AtomicU64,
}

impl TemporalClock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }

    fn anchor(&self) -> u64 {
        let wall = Utc::now()
            .timestamp_nanos_opt()
            .and_then(|nanos| u64::try_from(nanos).ok())
            .unwrap_or_default();
        let previous = self
            .last_anchor
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |prev| {
                Some(wall.max(prev.saturating_add(1)))
            })
            .unwrap_or_else(|prev| prev);
        wall.max(previous.saturating_add(1))
    }
}

/// Deterministic clock for tests and replays: time advances by `step_ms` per
/// reading and anchors count up from `anchor_start`.
#[derive(Debug)]
pub struct SteppingClock {
    now_ms: AtomicI64,
    step_ms: i64,
    next_anchor: AtomicU64,
}

impl SteppingClock {
    pub fn new(start_ms: i64, step_ms: i64) -> Self {
        Self::with_anchor_start(start_ms, step_ms, 1)
    }

    pub fn with_anchor_start(start_ms: i64, step_ms: i64, anchor_start: u64) -> Self {
        Self {
            now_ms: AtomicI64::new(start_ms),
            step_ms,
            next_anchor: AtomicU64::new(anchor_start),
        }
    }
}

impl TemporalClock for SteppingClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.fetch_add(self.step_ms, Ordering::SeqCst)
    }

    fn anchor(&self) -> u64 {
        self.next_anchor.fetch_add(1, Ordering::SeqCst)
    }
}

//! Frame clock over a pluggable time source

use stage_core::{lock, shared, Shared};
use std::time::Instant;

/// Monotonic millisecond time source
pub trait TimeSource: Send {
    /// Milliseconds since an arbitrary fixed origin
    fn now_ms(&self) -> f64;
}

/// Wall-clock time since the source was created
#[derive(Debug, Clone, Copy)]
pub struct SystemTimeSource {
    origin: Instant,
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl SystemTimeSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TimeSource for SystemTimeSource {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Time that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualTimeSource {
    now: Shared<f64>,
}

impl Default for ManualTimeSource {
    fn default() -> Self {
        Self { now: shared(0.0) }
    }
}

impl ManualTimeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance_ms(&self, ms: f64) {
        *lock(&self.now) += ms;
    }

    pub fn set_ms(&self, ms: f64) {
        *lock(&self.now) = ms;
    }
}

impl TimeSource for ManualTimeSource {
    fn now_ms(&self) -> f64 {
        *lock(&self.now)
    }
}

/// Tracks elapsed time between queries
pub struct Clock {
    source: Box<dyn TimeSource>,
    last: Option<f64>,
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(Box::new(SystemTimeSource::new()))
    }
}

impl Clock {
    pub fn new(source: Box<dyn TimeSource>) -> Self {
        Self { source, last: None }
    }

    /// Seconds since the previous call. The first call returns 0.
    pub fn get_delta(&mut self) -> f64 {
        let now = self.source.now_ms();
        let delta = match self.last {
            Some(last) => (now - last).max(0.0) / 1000.0,
            None => 0.0,
        };
        self.last = Some(now);
        delta
    }

    /// Current timestamp in milliseconds
    pub fn now_ms(&self) -> f64 {
        self.source.now_ms()
    }
}

//! Bounded polling waits
//!
//! Every wait in a session goes through [`poll_until`]. A wait has its own
//! budget and is additionally clamped by the invocation-wide [`Deadline`], so
//! no single wait can outlive the invocation.

use std::time::{Duration, Instant};

/// Default polling interval (250ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 250;

/// Default invocation deadline (3 minutes)
pub const DEFAULT_DEADLINE_SECS: u64 = 180;

/// Point in time after which no wait may continue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    at: Option<Instant>,
}

impl Deadline {
    /// A deadline `limit` from now. A limit too far out to represent never expires.
    pub fn after(limit: Duration) -> Self {
        Self { at: Instant::now().checked_add(limit) }
    }

    /// A deadline that never expires
    pub fn none() -> Self {
        Self { at: None }
    }

    /// Time left before the deadline (`None` when unbounded)
    pub fn remaining(&self) -> Option<Duration> {
        self.at.map(|at| at.saturating_duration_since(Instant::now()))
    }

    pub fn is_expired(&self) -> bool {
        self.remaining().is_some_and(|left| left.is_zero())
    }

    /// Clamp a wait budget to what is left. The flag tells whether the deadline was the tighter bound.
    pub fn clamp(&self, budget: Duration) -> (Duration, bool) {
        match self.remaining() {
            Some(left) if left < budget => (left, true),
            _ => (budget, false),
        }
    }
}

impl Default for Deadline {
    fn default() -> Self {
        Self::none()
    }
}

/// Result of a bounded wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome<T> {
    /// The probe produced a value
    Ready(T),
    /// The wait's own budget ran out
    TimedOut,
    /// The invocation deadline ran out first
    DeadlineExceeded,
}

impl<T> WaitOutcome<T> {
    pub fn ready(self) -> Option<T> {
        match self {
            WaitOutcome::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, WaitOutcome::Ready(_))
    }
}

/// Options for a single wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wait {
    /// Upper bound for this wait
    pub budget: Duration,
    /// Sleep between probes
    pub poll_interval: Duration,
}

impl Wait {
    pub fn new(budget: Duration) -> Self {
        Self { budget, poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS) }
    }

    /// Builder method: set polling interval
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

/// Probe repeatedly until it yields a value or the budget (clamped by `deadline`) runs out.
///
/// A zero budget returns immediately without probing. The probe always gets one last
/// chance once the budget has elapsed, so a condition that becomes true right at the
/// end is still observed.
pub fn poll_until<T>(wait: Wait, deadline: Deadline, mut probe: impl FnMut() -> Option<T>) -> WaitOutcome<T> {
    let (budget, clipped) = deadline.clamp(wait.budget);
    let expired = || if clipped { WaitOutcome::DeadlineExceeded } else { WaitOutcome::TimedOut };

    if budget.is_zero() {
        return expired();
    }

    let start = Instant::now();
    loop {
        if let Some(value) = probe() {
            return WaitOutcome::Ready(value);
        }

        let elapsed = start.elapsed();
        if elapsed >= budget {
            return expired();
        }

        std::thread::sleep(wait.poll_interval.min(budget - elapsed));
    }
}

//! Time sources for scope measurements

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// A monotonic time source.
///
/// `now` returns the time elapsed since the clock's own epoch. Successive
/// calls must never go backwards.
pub trait Clock: fmt::Debug {
    /// Read the current offset from the clock's epoch.
    fn now(&self) -> Duration;
}

/// Wall-clock time source backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    /// Create a clock whose epoch is the current instant.
    #[inline]
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same time, so a test can keep one handle and give
/// another to a timing tree.
///
/// # Example
///
/// ```rust
/// use scope_timer::{Clock, ManualClock};
/// use std::time::Duration;
///
/// let clock = ManualClock::new();
/// let view = clock.clone();
/// clock.advance_ms(30);
/// assert_eq!(view.now(), Duration::from_millis(30));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    /// Create a clock at offset zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    /// Move the clock forward by whole milliseconds.
    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }

    /// Set the clock to an absolute offset. Ignored if it would go backwards.
    pub fn set(&self, at: Duration) {
        if at >= self.now.get() {
            self.now.set(at);
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// The elapsed-time source owned by each timer node.
///
/// A stopwatch runs from the instant it is started. Sampling is a pure read
/// and never stops it; only [`Stopwatch::freeze`] pins the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stopwatch {
    started_at: Duration,
    frozen: Option<Duration>,
}

impl Stopwatch {
    /// Start measuring now.
    #[inline]
    pub fn start(clock: &dyn Clock) -> Self {
        Self {
            started_at: clock.now(),
            frozen: None,
        }
    }

    /// Elapsed time: the frozen value if frozen, otherwise a live reading.
    #[inline]
    pub fn sample(&self, clock: &dyn Clock) -> Duration {
        match self.frozen {
            Some(elapsed) => elapsed,
            None => clock.now().saturating_sub(self.started_at),
        }
    }

    /// Pin the elapsed value. Freezing twice keeps the first value.
    pub fn freeze(&mut self, clock: &dyn Clock) -> Duration {
        if let Some(elapsed) = self.frozen {
            return elapsed;
        }
        let elapsed = clock.now().saturating_sub(self.started_at);
        self.frozen = Some(elapsed);
        elapsed
    }

    /// Whether the value has been pinned.
    #[inline]
    pub fn is_frozen(&self) -> bool {
        self.frozen.is_some()
    }

    /// Clock offset at which measuring began.
    #[inline]
    pub fn started_at(&self) -> Duration {
        self.started_at
    }
}

//! Wall-clock sources for [`TimedInterval`](crate::TimedInterval).
//!
//! Every clock reports seconds since the Unix epoch as an `f64`, the unit the
//! generated timestamp samples are expressed in.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};

/// A source of wall-clock readings, in seconds since the Unix epoch.
pub trait Clock {
    fn now(&self) -> f64;
}

impl<C: Clock + ?Sized> Clock for &C {
    #[inline]
    fn now(&self) -> f64 {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for Box<C> {
    #[inline]
    fn now(&self) -> f64 {
        (**self).now()
    }
}

/// Reads `SystemTime::now()` on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> f64 {
        epoch_seconds(SystemTime::now())
    }
}

fn epoch_seconds(t: SystemTime) -> f64 {
    // A host clock set before 1970 reads as the epoch itself.
    t.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Wall clock anchored once, then advanced by `quanta`'s monotonic counter.
///
/// Readings never go backwards within one `QuantaClock`, even if the host
/// clock is stepped, and resolution follows the TSC where available.
#[derive(Debug, Clone)]
pub struct QuantaClock {
    clock: quanta::Clock,
    anchor: quanta::Instant,
    anchor_epoch: f64,
}

impl QuantaClock {
    pub fn new() -> Self {
        let clock = quanta::Clock::new();
        let anchor = clock.now();
        let anchor_epoch = epoch_seconds(SystemTime::now());

        Self {
            clock,
            anchor,
            anchor_epoch,
        }
    }
}

impl Default for QuantaClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for QuantaClock {
    #[inline]
    fn now(&self) -> f64 {
        let since_anchor = self.clock.now().duration_since(self.anchor);
        self.anchor_epoch + since_anchor.as_secs_f64()
    }
}

/// Scripted clock returning pre-set readings in order.
///
/// Once the script is exhausted the last reading repeats. Intended for tests
/// and demos that need exact timestamps.
///
/// ```rust
/// use timed_interval::{Clock, ManualClock};
///
/// let clock = ManualClock::from_readings([100.0, 102.5]);
/// assert_eq!(clock.now(), 100.0);
/// assert_eq!(clock.now(), 102.5);
/// assert_eq!(clock.now(), 102.5);
/// ```
#[derive(Debug, Default)]
pub struct ManualClock {
    readings: RefCell<VecDeque<f64>>,
    last: Cell<f64>,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        Self::from_readings([start])
    }

    pub fn from_readings(readings: impl IntoIterator<Item = f64>) -> Self {
        Self {
            readings: RefCell::new(readings.into_iter().collect()),
            last: Cell::new(0.0),
        }
    }

    /// Drops any remaining script and pins the clock at `t`.
    pub fn set(&self, t: f64) {
        let mut readings = self.readings.borrow_mut();
        readings.clear();
        readings.push_back(t);
    }

    /// Appends a reading to the end of the script.
    pub fn push(&self, t: f64) {
        self.readings.borrow_mut().push_back(t);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        if let Some(t) = self.readings.borrow_mut().pop_front() {
            self.last.set(t);
        }
        self.last.get()
    }
}

use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::output::Reporter;
use crate::sample::Sample;

const SECONDS: &str = "seconds";

/// Where a [`TimedInterval`] is in its measure cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalState {
    /// No bracket has started yet.
    Unmeasured,
    /// A bracket has started and not yet ended.
    Measuring,
    /// The most recent bracket has ended.
    Measured,
}

/// A named interval that records one start/stop pair and turns it into samples.
///
/// Each call to [`measure`](Self::measure) or [`start`](Self::start) replaces
/// the previously recorded bracket. The stop timestamp is written on every
/// exit from the bracket: normal return, an `Err` returned by the work, or a
/// panic unwinding through it.
///
/// Not synchronized; one instance belongs to one caller.
///
/// # Examples
///
/// ```rust
/// use timed_interval::{ManualClock, Sample, TimedInterval};
///
/// let mut interval = TimedInterval::with_clock("Disk", ManualClock::from_readings([100.0, 102.5]));
/// interval.measure(|| {
///     // work
/// });
///
/// assert_eq!(
///     interval.generate_samples(false),
///     vec![Sample::new("Disk Runtime", 2.5, "seconds")],
/// );
/// ```
#[derive(Debug)]
pub struct TimedInterval<C: Clock = SystemClock> {
    name: String,
    start_time: Option<f64>,
    stop_time: Option<f64>,
    clock: C,
}

impl TimedInterval {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_clock(name, SystemClock)
    }
}

impl<C: Clock> TimedInterval<C> {
    pub fn with_clock(name: impl Into<String>, clock: C) -> Self {
        Self {
            name: name.into(),
            start_time: None,
            stop_time: None,
            clock,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Seconds since the epoch at the start of the latest bracket.
    pub fn start_time(&self) -> Option<f64> {
        self.start_time
    }

    /// Seconds since the epoch at the end of the latest bracket, or `None`
    /// while that bracket is still open.
    pub fn stop_time(&self) -> Option<f64> {
        self.stop_time
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn state(&self) -> IntervalState {
        match (self.start_time, self.stop_time) {
            (Some(_), Some(_)) => IntervalState::Measured,
            (Some(_), None) => IntervalState::Measuring,
            // stop_time is only ever written after start_time
            (None, _) => IntervalState::Unmeasured,
        }
    }

    pub fn elapsed(&self) -> Option<f64> {
        match (self.start_time, self.stop_time) {
            (Some(start), Some(stop)) => Some(stop - start),
            _ => None,
        }
    }

    /// Opens a bracket. It closes when the returned guard is stopped or dropped.
    pub fn start(&mut self) -> IntervalGuard<'_, C> {
        let now = self.clock.now();
        self.start_time = Some(now);
        self.stop_time = None;
        debug!(interval = %self.name, start_time = now, "interval started");

        IntervalGuard { interval: self }
    }

    /// Runs `work` inside a bracket and returns its result unchanged.
    pub fn measure<T, F>(&mut self, work: F) -> T
    where
        F: FnOnce() -> T,
    {
        let _guard = self.start();
        work()
    }

    fn finish(&mut self) {
        let now = self.clock.now();
        self.stop_time = Some(now);
        debug!(
            interval = %self.name,
            start_time = ?self.start_time,
            stop_time = now,
            panicking = std::thread::panicking(),
            "interval stopped"
        );

        if let Some(start) = self.start_time.filter(|start| now < *start) {
            warn!(
                interval = %self.name,
                start_time = start,
                stop_time = now,
                "clock went backwards, runtime is negative"
            );
        }
    }

    /// Builds the runtime sample and, optionally, the two timestamp samples.
    ///
    /// Empty until a bracket has completed. Order is always Runtime, then
    /// Start Timestamp and Stop Timestamp when `include_timestamps` is set.
    pub fn generate_samples(&self, include_timestamps: bool) -> Vec<Sample> {
        let (Some(start), Some(stop)) = (self.start_time, self.stop_time) else {
            return Vec::new();
        };

        let elapsed = stop - start;
        let mut samples = Vec::with_capacity(if include_timestamps { 3 } else { 1 });
        samples.push(Sample::new(
            format!("{} Runtime", self.name),
            elapsed,
            SECONDS,
        ));
        if include_timestamps {
            samples.push(Sample::new(
                format!("{} Start Timestamp", self.name),
                start,
                SECONDS,
            ));
            samples.push(Sample::new(
                format!("{} Stop Timestamp", self.name),
                stop,
                SECONDS,
            ));
        }
        samples
    }

    /// Hands the generated samples to `reporter`.
    pub fn report(
        &self,
        reporter: &dyn Reporter,
        include_timestamps: bool,
    ) -> Result<(), Box<dyn std::error::Error>> {
        reporter.report(&self.name, &self.generate_samples(include_timestamps))
    }
}

/// An open bracket on a [`TimedInterval`].
///
/// Dropping the guard records the stop timestamp, so the bracket closes on
/// early returns, `?` propagation and unwinding alike.
#[must_use = "the interval stops as soon as the guard is dropped"]
pub struct IntervalGuard<'a, C: Clock> {
    interval: &'a mut TimedInterval<C>,
}

impl<C: Clock> IntervalGuard<'_, C> {
    pub fn name(&self) -> &str {
        &self.interval.name
    }

    pub fn start_time(&self) -> Option<f64> {
        self.interval.start_time
    }

    /// Closes the bracket now.
    pub fn stop(self) {}
}

impl<C: Clock> Drop for IntervalGuard<'_, C> {
    #[inline]
    fn drop(&mut self) {
        self.interval.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    fn disk() -> TimedInterval<ManualClock> {
        TimedInterval::with_clock("Disk", ManualClock::from_readings([100.0, 102.5]))
    }

    #[test]
    fn test_fresh_interval_is_empty() {
        let interval = TimedInterval::new("Fresh");

        assert_eq!(interval.name(), "Fresh");
        assert_eq!(interval.start_time(), None);
        assert_eq!(interval.stop_time(), None);
        assert_eq!(interval.state(), IntervalState::Unmeasured);
        assert_eq!(interval.elapsed(), None);
        assert!(interval.generate_samples(false).is_empty());
        assert!(interval.generate_samples(true).is_empty());
    }

    #[test]
    fn test_runtime_sample_only() {
        let mut interval = disk();
        interval.measure(|| {});

        assert_eq!(interval.state(), IntervalState::Measured);
        assert_eq!(
            interval.generate_samples(false),
            vec![Sample::new("Disk Runtime", 2.5, "seconds")]
        );
    }

    #[test]
    fn test_runtime_and_timestamp_samples() {
        let mut interval = disk();
        interval.measure(|| {});

        assert_eq!(
            interval.generate_samples(true),
            vec![
                Sample::new("Disk Runtime", 2.5, "seconds"),
                Sample::new("Disk Start Timestamp", 100.0, "seconds"),
                Sample::new("Disk Stop Timestamp", 102.5, "seconds"),
            ]
        );
    }

    #[test]
    fn test_generate_samples_is_idempotent() {
        let mut interval = disk();
        interval.measure(|| {});

        assert_eq!(interval.generate_samples(true), interval.generate_samples(true));
        assert_eq!(interval.elapsed(), Some(2.5));
    }

    #[test]
    fn test_measure_returns_work_value() {
        let mut interval = disk();
        let out = interval.measure(|| 6 * 7);

        assert_eq!(out, 42);
    }

    #[test]
    fn test_system_clock_start_before_stop() {
        let mut interval = TimedInterval::new("Sleep");
        interval.measure(|| std::thread::sleep(std::time::Duration::from_millis(5)));

        let start = interval.start_time().unwrap();
        let stop = interval.stop_time().unwrap();
        assert!(start <= stop);

        let samples = interval.generate_samples(false);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].metric, "Sleep Runtime");
        assert_eq!(samples[0].value, stop - start);
        assert_eq!(samples[0].unit, "seconds");
    }

    #[test]
    fn test_second_measure_overwrites_first() {
        let clock = ManualClock::from_readings([1.0, 2.0, 10.0, 13.0]);
        let mut interval = TimedInterval::with_clock("Boot", clock);

        interval.measure(|| {});
        assert_eq!(interval.elapsed(), Some(1.0));

        interval.measure(|| {});
        assert_eq!(interval.start_time(), Some(10.0));
        assert_eq!(interval.stop_time(), Some(13.0));
        assert_eq!(
            interval.generate_samples(true),
            vec![
                Sample::new("Boot Runtime", 3.0, "seconds"),
                Sample::new("Boot Start Timestamp", 10.0, "seconds"),
                Sample::new("Boot Stop Timestamp", 13.0, "seconds"),
            ]
        );
    }

    #[derive(Debug, PartialEq)]
    struct WorkFailed(u32);

    #[test]
    fn test_error_propagates_and_stop_is_recorded() {
        let mut interval = disk();
        let result: Result<(), WorkFailed> = interval.measure(|| Err(WorkFailed(7)));

        assert_eq!(result, Err(WorkFailed(7)));
        assert_eq!(interval.stop_time(), Some(102.5));
        assert_eq!(interval.generate_samples(false).len(), 1);
    }

    #[test]
    fn test_panic_propagates_and_stop_is_recorded() {
        let mut interval = disk();
        let result = catch_unwind(AssertUnwindSafe(|| {
            interval.measure(|| panic!("work failed"));
        }));

        let payload = result.expect_err("panic should propagate");
        assert_eq!(payload.downcast_ref::<&str>(), Some(&"work failed"));
        assert_eq!(interval.state(), IntervalState::Measured);
        assert_eq!(interval.elapsed(), Some(2.5));
    }

    #[test]
    fn test_guard_lifecycle() {
        let mut interval = disk();
        {
            let guard = interval.start();
            assert_eq!(guard.name(), "Disk");
            assert_eq!(guard.start_time(), Some(100.0));
            guard.stop();
        }

        assert_eq!(interval.state(), IntervalState::Measured);
        assert_eq!(interval.stop_time(), Some(102.5));
    }

    #[test]
    fn test_reentry_clears_previous_stop() {
        let clock = ManualClock::from_readings([1.0, 2.0, 5.0, 6.0]);
        let mut interval = TimedInterval::with_clock("Net", clock);
        interval.measure(|| {});

        let guard = interval.start();
        std::mem::forget(guard);

        assert_eq!(interval.state(), IntervalState::Measuring);
        assert_eq!(interval.start_time(), Some(5.0));
        assert_eq!(interval.stop_time(), None);
        assert!(interval.generate_samples(true).is_empty());
    }

    #[test]
    fn test_early_return_closes_bracket() {
        fn run(interval: &mut TimedInterval<ManualClock>) -> Result<u8, String> {
            let _guard = interval.start();
            "x".parse::<u8>().map_err(|e| e.to_string())?;
            Ok(1)
        }

        let mut interval = disk();
        assert!(run(&mut interval).is_err());
        assert_eq!(interval.elapsed(), Some(2.5));
    }

    #[test]
    fn test_negative_runtime_is_reported_as_is() {
        let clock = ManualClock::from_readings([50.0, 49.0]);
        let mut interval = TimedInterval::with_clock("Skew", clock);
        interval.measure(|| {});

        assert_eq!(
            interval.generate_samples(false),
            vec![Sample::new("Skew Runtime", -1.0, "seconds")]
        );
    }

    #[test]
    fn test_negative_runtime_warns_once_on_stop() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;
        use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

        struct WarnCounter(Arc<AtomicUsize>);

        impl<S: tracing::Subscriber> Layer<S> for WarnCounter {
            fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
                if *event.metadata().level() == tracing::Level::WARN {
                    self.0.fetch_add(1, Ordering::SeqCst);
                }
            }
        }

        let warnings = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(WarnCounter(Arc::clone(&warnings)));

        tracing::subscriber::with_default(subscriber, || {
            let clock = ManualClock::from_readings([50.0, 49.0]);
            let mut interval = TimedInterval::with_clock("Skew", clock);
            interval.measure(|| {});
            assert_eq!(warnings.load(Ordering::SeqCst), 1);

            for _ in 0..3 {
                interval.generate_samples(true);
            }
            assert_eq!(warnings.load(Ordering::SeqCst), 1);
        });
    }

    #[test]
    fn test_state_follows_both_timestamps() {
        let mut interval = disk();
        assert_eq!(interval.state(), IntervalState::Unmeasured);

        let guard = interval.start();
        std::mem::forget(guard);
        assert_eq!(interval.state(), IntervalState::Measuring);

        interval.finish();
        assert_eq!(interval.state(), IntervalState::Measured);
    }

    #[test]
    fn test_empty_name_is_allowed() {
        let mut interval = TimedInterval::with_clock("", ManualClock::from_readings([0.0, 1.0]));
        interval.measure(|| {});

        assert_eq!(interval.generate_samples(false)[0].metric, " Runtime");
    }
}

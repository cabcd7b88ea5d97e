//! A named, scoped timer.
//!
//! A [`TimedInterval`] brackets a unit of work with a start and a stop
//! timestamp and turns the result into [`Sample`]s: the runtime, plus the raw
//! timestamps on request. Samples can be handed to any [`Reporter`].

pub mod clock;
mod error;
mod interval;
pub mod output;
mod sample;

pub use clock::{Clock, ManualClock, QuantaClock, SystemClock};
pub use error::Error;
pub use interval::{IntervalGuard, IntervalState, TimedInterval};
pub use output::{
    Format, JsonPrettyReporter, JsonReporter, Reporter, SamplesJson, TableReporter,
    TracingReporter,
};
pub use sample::Sample;

/// Measures a block on an existing interval and evaluates to the block's value.
///
/// ```rust
/// use timed_interval::{measure_block, TimedInterval};
///
/// let mut interval = TimedInterval::new("Sum");
/// let total = measure_block!(interval, { (1..=10).sum::<u32>() });
/// assert_eq!(total, 55);
/// assert_eq!(interval.generate_samples(false).len(), 1);
/// ```
#[macro_export]
macro_rules! measure_block {
    ($interval:expr, $expr:expr) => {{
        $interval.measure(|| $expr)
    }};
}

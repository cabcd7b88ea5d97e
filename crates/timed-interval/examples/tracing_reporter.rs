use std::time::Duration;
use timed_interval::{QuantaClock, TimedInterval, TracingReporter};

fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let mut network = TimedInterval::with_clock("Network", QuantaClock::new());
    for i in 0..3 {
        network.measure(|| std::thread::sleep(Duration::from_millis(i * 2)));
    }

    network
        .report(&TracingReporter, true)
        .map_err(|e| eyre::eyre!("Failed to report samples: {}", e))?;

    Ok(())
}

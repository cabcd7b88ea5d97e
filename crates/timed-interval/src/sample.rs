use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single labeled measurement handed to downstream reporting.
///
/// Samples are produced by [`TimedInterval::generate_samples`](crate::TimedInterval::generate_samples)
/// and never stored by the interval itself.
///
/// # Examples
///
/// ```rust
/// use timed_interval::Sample;
///
/// let sample = Sample::new("Disk Runtime", 2.5, "seconds");
/// assert_eq!(sample.to_string(), "Disk Runtime: 2.5 seconds");
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Sample {
    pub metric: String,
    pub value: f64,
    pub unit: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl Sample {
    pub fn new(metric: impl Into<String>, value: f64, unit: impl Into<String>) -> Self {
        Self {
            metric: metric.into(),
            value,
            unit: unit.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Attaches a metadata entry, replacing any previous value under `key`.
    pub fn with_metadata(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} {}", self.metric, self.value, self.unit)
    }
}

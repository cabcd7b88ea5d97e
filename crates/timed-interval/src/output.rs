use colored::*;
use prettytable::{color, Attr, Cell, Row, Table};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::info;

use crate::error::Error;
use crate::sample::Sample;

/// Trait for consuming the samples an interval produces.
///
/// Implement this trait to send samples to a logging system, a CI pipeline,
/// a results file or anything else that aggregates measurements.
///
/// # Examples
///
/// ```rust
/// use timed_interval::{Reporter, Sample};
/// use std::error::Error;
///
/// struct CountingReporter;
///
/// impl Reporter for CountingReporter {
///     fn report(&self, name: &str, samples: &[Sample]) -> Result<(), Box<dyn Error>> {
///         println!("{name}: {} samples", samples.len());
///         Ok(())
///     }
/// }
/// ```
pub trait Reporter {
    fn report(&self, name: &str, samples: &[Sample]) -> Result<(), Box<dyn std::error::Error>>;
}

/// Built-in stdout output formats.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Format {
    #[default]
    Table,
    Json,
    JsonPretty,
}

impl Format {
    pub fn reporter(self) -> Box<dyn Reporter> {
        match self {
            Format::Table => Box::new(TableReporter),
            Format::Json => Box::new(JsonReporter),
            Format::JsonPretty => Box::new(JsonPrettyReporter),
        }
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "table" => Ok(Format::Table),
            "json" => Ok(Format::Json),
            "json-pretty" | "json_pretty" => Ok(Format::JsonPretty),
            _ => Err(Error::UnknownFormat(s.to_string())),
        }
    }
}

/// JSON representation of one interval's samples.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SamplesJson {
    pub interval: String,
    pub samples: Vec<Sample>,
}

impl SamplesJson {
    pub fn new(name: &str, samples: &[Sample]) -> Self {
        Self {
            interval: name.to_string(),
            samples: samples.to_vec(),
        }
    }
}

// Epoch timestamps are at least this large; durations stay well below it.
const TIMESTAMP_MAGNITUDE: f64 = 1e6;
const SUB_MICRO: f64 = 1e-6;

fn format_value(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude == 0.0 {
        "0".to_string()
    } else if magnitude < SUB_MICRO {
        format!("{value:.3e}")
    } else if magnitude >= TIMESTAMP_MAGNITUDE {
        format!("{value:.6}")
    } else {
        format!("{value:.9}")
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    }
}

pub fn build_table(samples: &[Sample], use_colors: bool) -> Table {
    let mut table = Table::new();

    let header_cells: Vec<Cell> = ["Metric", "Value", "Unit"]
        .into_iter()
        .map(|header| {
            if use_colors {
                Cell::new(header)
                    .with_style(Attr::Bold)
                    .with_style(Attr::ForegroundColor(color::CYAN))
            } else {
                Cell::new(header).with_style(Attr::Bold)
            }
        })
        .collect();
    table.add_row(Row::new(header_cells));

    for sample in samples {
        table.add_row(Row::new(vec![
            Cell::new(&sample.metric),
            Cell::new(&format_value(sample.value)),
            Cell::new(&sample.unit),
        ]));
    }

    table
}

fn display_no_samples_message(name: &str) {
    println!(
        "\n{} No samples recorded for {}",
        "[timed-interval]".blue().bold(),
        name.yellow().bold()
    );
    println!();
    println!(
        "Wrap the work in {} before generating samples:",
        "TimedInterval::measure".cyan().bold()
    );
    println!();
    println!("  {}", "interval.measure(|| {".cyan());
    println!("  {}", "    // your code here".dimmed());
    println!("  {}", "});".cyan());
    println!();
}

pub struct TableReporter;

impl Reporter for TableReporter {
    fn report(&self, name: &str, samples: &[Sample]) -> Result<(), Box<dyn std::error::Error>> {
        if samples.is_empty() {
            display_no_samples_message(name);
            return Ok(());
        }

        let use_colors = std::env::var("NO_COLOR").is_err();
        println!(
            "\n{} Samples from {}:",
            "[timed-interval]".blue().bold(),
            name.yellow().bold()
        );
        build_table(samples, use_colors).printstd();
        Ok(())
    }
}

pub struct JsonReporter;

impl Reporter for JsonReporter {
    fn report(&self, name: &str, samples: &[Sample]) -> Result<(), Box<dyn std::error::Error>> {
        let json = SamplesJson::new(name, samples);
        println!("{}", serde_json::to_string(&json).map_err(Error::from)?);
        Ok(())
    }
}

pub struct JsonPrettyReporter;

impl Reporter for JsonPrettyReporter {
    fn report(&self, name: &str, samples: &[Sample]) -> Result<(), Box<dyn std::error::Error>> {
        let json = SamplesJson::new(name, samples);
        println!("{}", serde_json::to_string_pretty(&json).map_err(Error::from)?);
        Ok(())
    }
}

/// Emits one `info` event per sample through the `tracing` facade.
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, name: &str, samples: &[Sample]) -> Result<(), Box<dyn std::error::Error>> {
        if samples.is_empty() {
            info!(interval = %name, "no samples recorded");
            return Ok(());
        }

        for sample in samples {
            info!(
                interval = %name,
                metric = %sample.metric,
                value = sample.value,
                unit = %sample.unit,
                "sample"
            );
        }
        Ok(())
    }
}

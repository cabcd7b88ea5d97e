use clap::{Parser, ValueEnum};
use std::time::Duration;
use timed_interval::{measure_block, Format, TimedInterval};

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OutputFormat {
    Table,
    Json,
    JsonPretty,
}

impl From<OutputFormat> for Format {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Table => Format::Table,
            OutputFormat::Json => Format::Json,
            OutputFormat::JsonPretty => Format::JsonPretty,
        }
    }
}

#[derive(Parser, Debug)]
#[command(about = "Measure a few intervals and print their samples")]
struct Args {
    #[arg(long, value_enum, default_value = "table", help = "Output format")]
    format: OutputFormat,
}

fn copy_blocks(n: u64) -> Result<u64, std::io::Error> {
    std::thread::sleep(Duration::from_millis(n));
    Ok(n * 512)
}

fn main() -> eyre::Result<()> {
    let args = Args::parse();
    let reporter = Format::from(args.format).reporter();

    let mut disk = TimedInterval::new("Disk");
    disk.measure(|| copy_blocks(2))?;
    disk.report(reporter.as_ref(), true)
        .map_err(|e| eyre::eyre!("Failed to report Disk samples: {}", e))?;

    let mut boot = TimedInterval::new("Boot");
    let bytes = measure_block!(boot, { copy_blocks(3) })?;
    if bytes == 0 {
        println!("nothing copied");
    }
    boot.report(reporter.as_ref(), false)
        .map_err(|e| eyre::eyre!("Failed to report Boot samples: {}", e))?;

    let idle = TimedInterval::new("Idle");
    idle.report(reporter.as_ref(), true)
        .map_err(|e| eyre::eyre!("Failed to report Idle samples: {}", e))?;

    Ok(())
}

use std::path::PathBuf;
use std::time::Duration;

use barolink_frame::{ResyncPolicy, ScannerConfig};
use barolink_telemetry::ReaderConfig;
use clap::{Args, Subcommand, ValueEnum};

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod encode;
pub mod replay;
pub mod version;
pub mod watch;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read altitude samples from a serial device.
    Watch(WatchArgs),
    /// Read altitude samples from a captured byte stream.
    Replay(ReplayArgs),
    /// Encode one telemetry frame (for building test captures).
    Encode(EncodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Watch(args) => watch::run(args, format),
        Command::Replay(args) => replay::run(args, format),
        Command::Encode(args) => encode::run(args),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Copy, Clone, Debug, Default, ValueEnum)]
pub enum ResyncArg {
    /// Continue from the last four bytes of a rejected frame.
    #[default]
    Tail,
    /// Rescan from one byte after a rejected frame's prefix.
    Byte,
}

impl From<ResyncArg> for ResyncPolicy {
    fn from(arg: ResyncArg) -> Self {
        match arg {
            ResyncArg::Tail => ResyncPolicy::TailReuse,
            ResyncArg::Byte => ResyncPolicy::ByteByByte,
        }
    }
}

#[derive(Args, Debug)]
pub struct ReaderArgs {
    /// Resynchronization strategy after a rejected frame.
    #[arg(long, value_name = "POLICY", default_value = "tail")]
    pub resync: ResyncArg,
    /// Fixed baseline pressure in hPa (default: first reading).
    #[arg(long, value_name = "HPA")]
    pub baseline: Option<f64>,
    /// Trace every byte skipped over an implausible length prefix.
    #[arg(long)]
    pub log_corrupt_prefix: bool,
}

impl ReaderArgs {
    pub fn to_config(&self) -> CliResult<ReaderConfig> {
        if let Some(baseline) = self.baseline {
            if !(baseline.is_finite() && baseline > 0.0) {
                return Err(CliError::new(
                    USAGE,
                    format!("--baseline must be a positive pressure, got {baseline}"),
                ));
            }
        }
        Ok(ReaderConfig {
            scanner: ScannerConfig {
                resync: self.resync.into(),
                log_corrupt_prefix: self.log_corrupt_prefix,
            },
            baseline: self.baseline,
        })
    }
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Serial device path (e.g. /dev/ttyUSB0).
    pub device: String,
    /// Line speed.
    #[arg(long, default_value_t = barolink_transport::DEFAULT_BAUD_RATE)]
    pub baud: u32,
    /// Per-read timeout (e.g. 1s, 250ms).
    #[arg(long, default_value = "1s")]
    pub timeout: String,
    /// Fail when no byte arrives for this long (e.g. 10s). Default: wait forever.
    #[arg(long)]
    pub idle_timeout: Option<String>,
    /// Reopen the device after a link failure, keeping the baseline.
    #[arg(long)]
    pub reconnect: bool,
    /// Delay between reconnect attempts.
    #[arg(long, default_value = "2s")]
    pub reconnect_delay: String,
    /// Exit after printing N samples.
    #[arg(long)]
    pub count: Option<u64>,
    #[command(flatten)]
    pub reader: ReaderArgs,
}

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Captured byte stream.
    pub file: PathBuf,
    /// Exit after printing N samples.
    #[arg(long)]
    pub count: Option<u64>,
    /// Print scanner counters after the last sample.
    #[arg(long)]
    pub stats: bool,
    #[command(flatten)]
    pub reader: ReaderArgs,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Pressure in hPa.
    #[arg(long)]
    pub pressure: f64,
    /// Additional numeric entries (key=value), ignored by readers.
    #[arg(long = "field", value_name = "KEY=VALUE")]
    pub fields: Vec<String>,
    /// Prepend N bytes of line noise before the frame.
    #[arg(long, default_value_t = 0)]
    pub noise: usize,
    /// Append to this file instead of writing to stdout.
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Reject `--count 0`, which could never be satisfied.
pub fn check_count(count: Option<u64>) -> CliResult<Option<u64>> {
    match count {
        Some(0) => Err(CliError::new(USAGE, "--count must be at least 1")),
        other => Ok(other),
    }
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

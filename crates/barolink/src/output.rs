use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use barolink_frame::ScanStats;
use barolink_telemetry::AltitudeSample;
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct SampleOutput {
    seq: u64,
    altitude_ft: f64,
    has_sample: bool,
    pressure_hpa: f64,
    baseline_hpa: f64,
    timestamp: String,
}

pub fn print_sample(seq: u64, sample: &AltitudeSample, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = SampleOutput {
                seq,
                altitude_ft: sample.altitude_ft,
                has_sample: sample.valid,
                pressure_hpa: sample.pressure_hpa,
                baseline_hpa: sample.baseline_hpa,
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["SEQ", "ALTITUDE (ft)", "PRESSURE (hPa)", "BASELINE (hPa)"])
                .add_row(vec![
                    seq.to_string(),
                    format!("{:.1}", sample.altitude_ft),
                    format!("{:.2}", sample.pressure_hpa),
                    format!("{:.2}", sample.baseline_hpa),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "#{seq} altitude={:.1}ft pressure={:.2}hPa baseline={:.2}hPa",
                sample.altitude_ft, sample.pressure_hpa, sample.baseline_hpa
            );
        }
    }
    let _ = std::io::stdout().flush();
}

pub fn print_stats(stats: &ScanStats, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(stats).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["COUNTER", "VALUE"]);
            for (name, value) in stats_rows(stats) {
                table.add_row(vec![name.to_string(), value.to_string()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let line = stats_rows(stats)
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join(" ");
            println!("{line}");
        }
    }
}

pub fn write_raw(data: &[u8]) -> std::io::Result<()> {
    let mut out = std::io::stdout();
    out.write_all(data)?;
    out.flush()
}

fn stats_rows(stats: &ScanStats) -> [(&'static str, u64); 6] {
    [
        ("accepted", stats.accepted),
        ("candidates", stats.candidates),
        ("malformed", stats.malformed),
        ("missing_field", stats.missing_field),
        ("short_discarded", stats.short_discarded),
        ("bytes_skipped", stats.bytes_skipped),
    ]
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

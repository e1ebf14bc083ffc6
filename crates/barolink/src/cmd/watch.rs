use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use barolink_telemetry::TelemetryReader;
use barolink_transport::{open_serial, SerialConfig, SerialSource};

use crate::cmd::{check_count, parse_duration, WatchArgs};
use crate::exit::{
    telemetry_error, transport_error, CliError, CliResult, INTERNAL, INTERRUPTED, SUCCESS,
};
use crate::output::{print_sample, OutputFormat};

pub fn run(args: WatchArgs, format: OutputFormat) -> CliResult<i32> {
    let serial = serial_config(&args)?;
    let reconnect_delay = parse_duration(&args.reconnect_delay)?;
    let count = check_count(args.count)?;
    let config = args.reader.to_config()?;

    let stop = Arc::new(AtomicBool::new(false));
    install_ctrlc_handler(stop.clone())?;

    let source = open_serial(&serial)
        .map_err(|err| transport_error("open failed", err))?
        .with_cancel(stop.clone());
    let mut reader = TelemetryReader::with_config(source, config);
    tracing::info!(device = %serial.path, baud = serial.baud_rate, "watching");

    while !stop.load(Ordering::SeqCst) {
        let sample = match reader.read_one() {
            Ok(sample) => sample,
            Err(err) if err.transport().is_some_and(|t| t.is_cancelled()) => {
                tracing::info!(emitted = reader.emitted(), "interrupted, stopping");
                break;
            }
            Err(err) if args.reconnect && err.is_transport() => {
                tracing::warn!(error = %err, "link lost, reconnecting");
                if !reopen(&mut reader, &serial, reconnect_delay, &stop) {
                    break;
                }
                continue;
            }
            Err(err) => return Err(telemetry_error("read failed", err)),
        };

        print_sample(reader.emitted(), &sample, format);

        if let Some(count) = count {
            if reader.emitted() >= count {
                break;
            }
        }
    }

    Ok(SUCCESS)
}

fn serial_config(args: &WatchArgs) -> CliResult<SerialConfig> {
    let mut config = SerialConfig::new(args.device.as_str());
    config.baud_rate = args.baud;
    config.read_timeout = parse_duration(&args.timeout)?;
    config.idle_timeout = args
        .idle_timeout
        .as_deref()
        .map(parse_duration)
        .transpose()?;
    Ok(config)
}

/// Retry opening the device until it succeeds or the user interrupts.
///
/// The reader keeps its baseline across the swap, so altitudes after a
/// reconnect stay on the same scale.
fn reopen(
    reader: &mut TelemetryReader<SerialSource>,
    serial: &SerialConfig,
    delay: Duration,
    stop: &Arc<AtomicBool>,
) -> bool {
    let mut attempt = 0u32;
    while !stop.load(Ordering::SeqCst) {
        thread::sleep(delay);
        attempt = attempt.saturating_add(1);
        match open_serial(serial) {
            Ok(source) => {
                reader.replace_source(source.with_cancel(stop.clone()));
                tracing::info!(attempt, baseline_hpa = reader.baseline(), "link reopened");
                return true;
            }
            Err(err) => tracing::warn!(attempt, error = %err, "reopen failed"),
        }
    }
    false
}

/// The first ctrl-c cancels the blocked read and ends the loop; a second one
/// exits immediately.
fn install_ctrlc_handler(stop: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        if stop.swap(true, Ordering::SeqCst) {
            std::process::exit(INTERRUPTED);
        }
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

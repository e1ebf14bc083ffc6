use std::fs::File;
use std::io::BufReader;

use barolink_telemetry::TelemetryReader;
use barolink_transport::StreamSource;

use crate::cmd::{check_count, ReplayArgs};
use crate::exit::{io_error, telemetry_error, CliError, CliResult, FAILURE, SUCCESS};
use crate::output::{print_sample, print_stats, OutputFormat};

pub fn run(args: ReplayArgs, format: OutputFormat) -> CliResult<i32> {
    let count = check_count(args.count)?;
    let config = args.reader.to_config()?;
    let file = File::open(&args.file)
        .map_err(|err| io_error(&format!("failed opening {}", args.file.display()), err))?;
    let mut reader = TelemetryReader::with_config(StreamSource::new(BufReader::new(file)), config);

    loop {
        if let Some(count) = count {
            if reader.emitted() >= count {
                break;
            }
        }

        match reader.read_one() {
            Ok(sample) => print_sample(reader.emitted(), &sample, format),
            Err(err) if err.transport().is_some_and(|t| t.is_closed()) => {
                tracing::debug!("end of capture");
                break;
            }
            Err(err) => return Err(telemetry_error("read failed", err)),
        }
    }

    let stats = reader.scan_stats();
    tracing::debug!(?stats, bytes = reader.scanner().get_ref().bytes_read(), "replay finished");
    if args.stats {
        print_stats(&stats, format);
    }

    if reader.emitted() == 0 {
        return Err(CliError::new(
            FAILURE,
            format!("no valid frames in {}", args.file.display()),
        ));
    }
    Ok(SUCCESS)
}

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write;

use barolink_frame::{encode_record, PRESSURE_KEY};
use bytes::BytesMut;

use crate::cmd::EncodeArgs;
use crate::exit::{frame_error, io_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::write_raw;

/// Noise byte used for `--noise`. Non-zero, so no run of it can look like a
/// plausible length prefix.
const NOISE_BYTE: u8 = 0xA5;

pub fn run(args: EncodeArgs) -> CliResult<i32> {
    let record = build_record(&args)?;

    let mut wire = BytesMut::new();
    wire.resize(args.noise, NOISE_BYTE);
    encode_record(&record, &mut wire).map_err(|err| frame_error("encode failed", err))?;

    match &args.out {
        Some(path) => {
            let context = format!("failed writing {}", path.display());
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|err| io_error(&context, err))?;
            file.write_all(&wire).map_err(|err| io_error(&context, err))?;
        }
        None => write_raw(&wire).map_err(|err| io_error("failed writing stdout", err))?,
    }

    tracing::debug!(bytes = wire.len(), pressure = args.pressure, "frame encoded");
    Ok(SUCCESS)
}

fn build_record(args: &EncodeArgs) -> CliResult<BTreeMap<String, f64>> {
    let mut record = BTreeMap::new();
    for field in &args.fields {
        let (key, value) = field
            .split_once('=')
            .ok_or_else(|| CliError::new(USAGE, format!("--field expects KEY=VALUE, got {field}")))?;
        if key == PRESSURE_KEY {
            return Err(CliError::new(USAGE, "use --pressure to set the pressure entry"));
        }
        let value: f64 = value
            .parse()
            .map_err(|_| CliError::new(USAGE, format!("--field {key}: not a number: {value}")))?;
        record.insert(key.to_string(), value);
    }
    record.insert(PRESSURE_KEY.to_string(), args.pressure);
    Ok(record)
}

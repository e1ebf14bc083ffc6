use std::fmt;
use std::io;

use barolink_frame::FrameError;
use barolink_telemetry::TelemetryError;
use barolink_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;
pub const INTERRUPTED: i32 = 130;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::NotFound => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Open { source, .. } | TransportError::Io(source) => {
            io_error(context, source)
        }
        TransportError::Idle { .. } => CliError::new(TIMEOUT, format!("{context}: {err}")),
        TransportError::Closed { .. } => CliError::new(TRANSPORT_ERROR, format!("{context}: {err}")),
        TransportError::Cancelled => CliError::new(INTERRUPTED, format!("{context}: {err}")),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Transport(err) => transport_error(context, err),
        FrameError::PayloadLength { .. } | FrameError::Encode(_) => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
    }
}

pub fn telemetry_error(context: &str, err: TelemetryError) -> CliError {
    match err {
        TelemetryError::Frame(err) => frame_error(context, err),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn idle_link_maps_to_timeout() {
        let err = transport_error(
            "read failed",
            TransportError::Idle {
                idle: Duration::from_secs(5),
            },
        );
        assert_eq!(err.code, TIMEOUT);
        assert!(err.message.starts_with("read failed: "));
    }

    #[test]
    fn closed_link_maps_to_transport_error() {
        let err = telemetry_error(
            "read failed",
            TransportError::Closed {
                requested: 4,
                missing: 4,
            }
            .into(),
        );
        assert_eq!(err.code, TRANSPORT_ERROR);
    }

    #[test]
    fn cancelled_read_maps_to_interrupted() {
        let err = telemetry_error("read failed", TransportError::Cancelled.into());
        assert_eq!(err.code, INTERRUPTED);
        assert_eq!(err.message, "read failed: read cancelled");
    }

    #[test]
    fn permission_denied_on_open() {
        let err = transport_error(
            "open failed",
            TransportError::Open {
                path: "/dev/ttyS0".into(),
                source: io::Error::from(io::ErrorKind::PermissionDenied),
            },
        );
        assert_eq!(err.code, PERMISSION_DENIED);
    }

    #[test]
    fn oversized_payload_is_invalid_data() {
        let err = frame_error("encode failed", FrameError::PayloadLength { len: 300 });
        assert_eq!(err.code, DATA_INVALID);
    }
}

use barolink_frame::FrameError;
use barolink_transport::TransportError;

/// Errors that can escape the telemetry reader.
///
/// Decode failures never appear here; they are absorbed by the scanner.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Frame-level error (in practice, a transport failure while scanning).
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),
}

impl TelemetryError {
    /// The underlying transport failure, if that is what ended the read.
    pub fn transport(&self) -> Option<&TransportError> {
        match self {
            TelemetryError::Frame(FrameError::Transport(err)) => Some(err),
            TelemetryError::Frame(_) => None,
        }
    }

    /// True if the byte source failed or closed.
    pub fn is_transport(&self) -> bool {
        self.transport().is_some()
    }
}

impl From<TransportError> for TelemetryError {
    fn from(err: TransportError) -> Self {
        TelemetryError::Frame(FrameError::Transport(err))
    }
}

pub type Result<T> = std::result::Result<T, TelemetryError>;

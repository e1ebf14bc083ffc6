use std::time::Duration;

/// Errors that can occur while pulling bytes from a link.
///
/// Every variant is fatal to the read in progress: the framing layer never
/// tries to resynchronize across a transport failure.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open the device.
    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// An I/O error occurred on the underlying stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream reached end-of-file before the requested bytes arrived.
    #[error("byte source closed ({missing} of {requested} bytes outstanding)")]
    Closed { requested: usize, missing: usize },

    /// No byte arrived within the configured idle window.
    #[error("no data received for {idle:?}")]
    Idle { idle: Duration },

    /// The read was abandoned because its cancel flag was set.
    #[error("read cancelled")]
    Cancelled,
}

impl TransportError {
    /// True if the link reached end-of-stream (as opposed to failing).
    pub fn is_closed(&self) -> bool {
        matches!(self, TransportError::Closed { .. })
    }

    /// True if the read was abandoned on request.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, TransportError::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;

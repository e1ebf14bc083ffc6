use barolink_transport::TransportError;

/// Errors that can escape the framing layer.
///
/// Malformed payloads and implausible prefixes are not errors here: the
/// scanner absorbs them. Only transport failures surface while reading.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The byte source failed or closed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A payload to encode does not fit the 1..=255 length range.
    #[error("payload length {len} outside 1..=255")]
    PayloadLength { len: usize },

    /// A record could not be CBOR-encoded.
    #[error("encode failed: {0}")]
    Encode(String),
}

impl FrameError {
    /// True if this error came from the byte source.
    pub fn is_transport(&self) -> bool {
        matches!(self, FrameError::Transport(_))
    }
}

impl From<std::io::Error> for FrameError {
    fn from(err: std::io::Error) -> Self {
        FrameError::Transport(TransportError::Io(err))
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;

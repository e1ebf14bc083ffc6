use bytes::{BufMut, Bytes, BytesMut};
use serde::Serialize;

use crate::error::{FrameError, Result};

/// Length prefix: 4 bytes, big-endian.
pub const PREFIX_SIZE: usize = 4;

/// Largest plausible payload length. Zero is never plausible.
pub const MAX_FRAME_LEN: u32 = 255;

/// Returns true if a decoded prefix value may start a real frame.
pub fn is_plausible_length(len: u32) -> bool {
    (1..=MAX_FRAME_LEN).contains(&len)
}

/// A byte range tentatively identified as a frame.
///
/// `payload.len()` always equals `declared_len`; the content is unvalidated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFrame {
    /// The prefix bytes that announced this frame.
    pub prefix: [u8; PREFIX_SIZE],
    /// The payload read after the prefix.
    pub payload: Bytes,
}

impl CandidateFrame {
    /// Build a candidate from a prefix window and the bytes it announced.
    pub fn new(prefix: [u8; PREFIX_SIZE], payload: impl Into<Bytes>) -> Self {
        Self {
            prefix,
            payload: payload.into(),
        }
    }

    /// The length announced by the prefix.
    pub fn declared_len(&self) -> u32 {
        u32::from_be_bytes(self.prefix)
    }

    /// The last [`PREFIX_SIZE`] payload bytes, if the payload is long enough.
    pub fn tail_window(&self) -> Option<[u8; PREFIX_SIZE]> {
        let len = self.payload.len();
        if len < PREFIX_SIZE {
            return None;
        }
        let mut window = [0u8; PREFIX_SIZE];
        window.copy_from_slice(&self.payload[len - PREFIX_SIZE..]);
        Some(window)
    }

    /// The total wire size of this frame (prefix + payload).
    pub fn wire_size(&self) -> usize {
        PREFIX_SIZE + self.payload.len()
    }
}

/// Write an already-encoded payload as a frame.
///
/// Wire format:
/// ```text
/// ┌──────────────────┬─────────────────────────┐
/// │ Length (4B BE)   │ Payload (Length bytes)   │
/// │ 0x00000001..0xFF │ CBOR map { pressure, .. }│
/// └──────────────────┴─────────────────────────┘
/// ```
pub fn encode_payload(payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    let len = payload.len();
    if len == 0 || len > MAX_FRAME_LEN as usize {
        return Err(FrameError::PayloadLength { len });
    }
    dst.reserve(PREFIX_SIZE + len);
    dst.put_u32(len as u32);
    dst.put_slice(payload);
    Ok(())
}

/// CBOR-encode `record` and write it as a frame.
pub fn encode_record<T: Serialize + ?Sized>(record: &T, dst: &mut BytesMut) -> Result<()> {
    let mut payload = Vec::new();
    ciborium::into_writer(record, &mut payload).map_err(|err| FrameError::Encode(err.to_string()))?;
    encode_payload(&payload, dst)
}

//! Telemetry frame extraction from an untrusted byte stream.
//!
//! A frame on the wire is:
//! - A 4-byte big-endian payload length, 1..=255
//! - A CBOR-encoded map carrying at least a numeric `pressure` entry
//!
//! There is no reserved delimiter byte. The length prefix doubles as the
//! synchronization signal, so the scanner slides over implausible lengths
//! one byte at a time and reuses the tail of rejected frames as the next
//! window. Callers only ever see decoded records or transport failures.

pub mod codec;
pub mod decode;
pub mod error;
pub mod scanner;

#[cfg(feature = "async")]
pub mod framed;

pub use codec::{
    encode_payload, encode_record, is_plausible_length, CandidateFrame, MAX_FRAME_LEN, PREFIX_SIZE,
};
pub use decode::{decode_payload, DecodeOutcome, TelemetryRecord, PRESSURE_KEY};
pub use error::{FrameError, Result};
pub use scanner::{FrameScanner, ResyncPolicy, ScanState, ScanStats, ScannerConfig};

#[cfg(feature = "async")]
pub use framed::TelemetryCodec;

//! Barometric altitude telemetry from noisy serial sensor links.
//!
//! A sensor streams length-prefixed CBOR records over a point-to-point link.
//! barolink finds those records in the byte stream (tolerating corruption,
//! truncation and injected noise), zeroes the altitude scale on the first
//! reading, and hands out altitude samples in feet.
//!
//! # Crate Structure
//!
//! - [`transport`]: Byte sources (any `Read`, serial devices)
//! - [`frame`]: Self-synchronizing frame scanner and CBOR payload decoder
//! - [`telemetry`]: Baseline calibration, altitude, and the sample reader

/// Re-export transport types.
pub mod transport {
    pub use barolink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use barolink_frame::*;
}

/// Re-export telemetry types.
pub mod telemetry {
    pub use barolink_telemetry::*;
}

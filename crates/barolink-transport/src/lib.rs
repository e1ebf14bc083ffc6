//! Byte-source abstraction for sensor links.
//!
//! This is the lowest layer of barolink. The framing layer only needs one
//! guarantee from a link: "deliver exactly N bytes or fail". Everything here
//! exists to provide that guarantee on top of:
//! - any [`std::io::Read`] (files, pipes, sockets, in-memory buffers)
//! - serial devices (behind the `serial` feature)

pub mod error;
pub mod source;

#[cfg(feature = "serial")]
pub mod serial;

pub use error::{Result, TransportError};
pub use source::{ByteSource, StreamSource};

#[cfg(feature = "serial")]
pub use serial::{open_serial, SerialConfig, SerialSource, DEFAULT_BAUD_RATE};

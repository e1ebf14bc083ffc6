use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};

use crate::error::{Result, TransportError};
use crate::source::StreamSource;

/// A configured serial device as a byte source.
pub type SerialSource = StreamSource<Box<dyn SerialPort>>;

/// Default line speed of the sensor link.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Serial line settings.
///
/// The sensor link is fixed at 8N1 with no flow control; only the speed and
/// timeouts are usually worth changing.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Device path (e.g. `/dev/ttyUSB0`, `COM3`).
    pub path: String,
    /// Line speed. Default: 115200.
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub flow_control: FlowControl,
    /// Upper bound on a single blocking read. Default: 1s.
    pub read_timeout: Duration,
    /// Fail after this long without any byte. Default: wait forever.
    pub idle_timeout: Option<Duration>,
}

impl SerialConfig {
    /// Default 8N1 settings for `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            flow_control: FlowControl::None,
            read_timeout: Duration::from_secs(1),
            idle_timeout: None,
        }
    }
}

/// Open and configure a serial device as a [`StreamSource`].
pub fn open_serial(config: &SerialConfig) -> Result<SerialSource> {
    let port = serialport::new(config.path.as_str(), config.baud_rate)
        .data_bits(config.data_bits)
        .parity(config.parity)
        .stop_bits(config.stop_bits)
        .flow_control(config.flow_control)
        .timeout(config.read_timeout)
        .open()
        .map_err(|err| TransportError::Open {
            path: config.path.clone(),
            source: err.into(),
        })?;

    tracing::debug!(
        path = %config.path,
        baud = config.baud_rate,
        timeout_ms = config.read_timeout.as_millis() as u64,
        "serial device opened"
    );

    Ok(StreamSource::with_idle_timeout(port, config.idle_timeout))
}

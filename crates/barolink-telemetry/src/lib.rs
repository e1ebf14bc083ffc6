//! Altitude telemetry on top of the frame scanner.
//!
//! This is the layer a display loop talks to. [`TelemetryReader::read_one`]
//! blocks until one frame decodes with a usable pressure, zeroes the altitude
//! scale on the first such frame, and returns the altitude in feet relative
//! to that baseline.

pub mod altitude;
pub mod calibrator;
pub mod error;
pub mod reader;

pub use altitude::{
    altitude_feet, AltitudeSample, DEFAULT_BASELINE_HPA, FEET_PER_METER, ISA_EXPONENT,
    ISA_SCALE_HEIGHT_M,
};
pub use calibrator::BaselineCalibrator;
pub use error::{Result, TelemetryError};
pub use reader::{ReaderConfig, ReaderState, Samples, TelemetryReader};

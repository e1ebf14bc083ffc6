//! Barometric altitude.

use serde::Serialize;

/// Standard sea-level pressure in hectopascals.
pub const DEFAULT_BASELINE_HPA: f64 = 1013.25;

/// Metres to international feet.
pub const FEET_PER_METER: f64 = 3.28084;

/// Scale height of the international standard atmosphere approximation.
pub const ISA_SCALE_HEIGHT_M: f64 = 44330.0;

/// Exponent of the pressure ratio in the hypsometric approximation.
pub const ISA_EXPONENT: f64 = 0.1903;

/// Altitude in feet of `pressure` above the level where pressure is `p0`.
///
/// Both pressures are in hectopascals and expected to be positive. The
/// result decreases strictly as `pressure` increases and is ~0 when the two
/// are equal.
pub fn altitude_feet(pressure: f64, p0: f64) -> f64 {
    FEET_PER_METER * ISA_SCALE_HEIGHT_M * (1.0 - (pressure / p0).powf(ISA_EXPONENT))
}

/// One altitude reading as handed to a display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AltitudeSample {
    /// Altitude above the baseline, in feet.
    pub altitude_ft: f64,
    /// False only for the placeholder returned by [`AltitudeSample::none`].
    pub valid: bool,
    /// Pressure reading the altitude was computed from (hPa).
    pub pressure_hpa: f64,
    /// Baseline in effect when the sample was computed (hPa).
    pub baseline_hpa: f64,
}

impl AltitudeSample {
    /// Compute a sample from a pressure reading and baseline.
    pub fn new(pressure_hpa: f64, baseline_hpa: f64) -> Self {
        Self {
            altitude_ft: altitude_feet(pressure_hpa, baseline_hpa),
            valid: true,
            pressure_hpa,
            baseline_hpa,
        }
    }

    /// The "nothing received yet" value for a consumer that must draw
    /// something before the first frame arrives.
    pub fn none() -> Self {
        Self {
            altitude_ft: 0.0,
            valid: false,
            pressure_hpa: 0.0,
            baseline_hpa: DEFAULT_BASELINE_HPA,
        }
    }
}

impl Default for AltitudeSample {
    fn default() -> Self {
        Self::none()
    }
}

use std::sync::OnceLock;

use crate::altitude::DEFAULT_BASELINE_HPA;

/// Holds the zero-altitude reference pressure.
///
/// The first observed pressure becomes the baseline and every later
/// observation is ignored. The set-once write goes through a [`OnceLock`],
/// so a calibrator shared between threads can never be initialized twice.
#[derive(Debug, Default)]
pub struct BaselineCalibrator {
    p0: OnceLock<f64>,
}

impl BaselineCalibrator {
    /// An uncalibrated calibrator.
    pub fn new() -> Self {
        Self::default()
    }

    /// A calibrator fixed to `p0` from the start.
    pub fn with_baseline(p0: f64) -> Self {
        Self {
            p0: OnceLock::from(p0),
        }
    }

    /// Record `pressure` as the baseline if none is set yet, and return the
    /// baseline in effect.
    pub fn observe(&self, pressure: f64) -> f64 {
        let mut first = false;
        let p0 = *self.p0.get_or_init(|| {
            first = true;
            pressure
        });
        if first {
            tracing::info!(baseline_hpa = p0, "baseline pressure calibrated");
        }
        p0
    }

    /// The baseline, or the standard-atmosphere default before calibration.
    pub fn baseline(&self) -> f64 {
        self.p0.get().copied().unwrap_or(DEFAULT_BASELINE_HPA)
    }

    /// True once a baseline has been observed or preset.
    pub fn is_calibrated(&self) -> bool {
        self.p0.get().is_some()
    }

    /// Forget the baseline; the next observation recalibrates.
    pub fn reset(&mut self) {
        self.p0.take();
    }
}

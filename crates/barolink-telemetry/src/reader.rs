use barolink_frame::{FrameScanner, ScanStats, ScannerConfig, TelemetryRecord};
use barolink_transport::ByteSource;
use serde::Serialize;

use crate::altitude::AltitudeSample;
use crate::calibrator::BaselineCalibrator;
use crate::error::Result;

/// Reader configuration.
#[derive(Debug, Clone, Default)]
pub struct ReaderConfig {
    /// Frame scanner settings.
    pub scanner: ScannerConfig,
    /// Fixed baseline (hPa). When unset, the first decoded pressure is used.
    pub baseline: Option<f64>,
}

/// Position of the reader in its emit cycle.
///
/// `AwaitingFrame → HaveRecord → (Uncalibrated →) Calibrated → Emit →
/// AwaitingFrame`. `Uncalibrated` is only ever visited once per baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReaderState {
    /// Scanning the source for the next decodable frame.
    AwaitingFrame,
    /// A record with a pressure has been decoded.
    HaveRecord,
    /// The record is about to become the baseline.
    Uncalibrated,
    /// A baseline is in effect for the record.
    Calibrated,
    /// A sample is ready to hand out.
    Emit,
}

#[derive(Debug, Clone, Copy)]
enum Stage {
    AwaitingFrame,
    HaveRecord(TelemetryRecord),
    Uncalibrated(TelemetryRecord),
    Calibrated(TelemetryRecord),
    Emit(AltitudeSample),
}

impl Stage {
    fn state(&self) -> ReaderState {
        match self {
            Stage::AwaitingFrame => ReaderState::AwaitingFrame,
            Stage::HaveRecord(_) => ReaderState::HaveRecord,
            Stage::Uncalibrated(_) => ReaderState::Uncalibrated,
            Stage::Calibrated(_) => ReaderState::Calibrated,
            Stage::Emit(_) => ReaderState::Emit,
        }
    }
}

/// Turns a byte source into a stream of altitude samples.
///
/// Single consumer, blocking pull: each [`read_one`](Self::read_one) call
/// scans until a frame decodes with a usable pressure. Corrupt and
/// incomplete frames only add latency; the only error a caller sees is a
/// transport failure.
pub struct TelemetryReader<S> {
    scanner: FrameScanner<S>,
    calibrator: BaselineCalibrator,
    stage: Stage,
    last: AltitudeSample,
    emitted: u64,
}

impl<S: ByteSource> TelemetryReader<S> {
    /// Create a reader with default configuration.
    pub fn new(source: S) -> Self {
        Self::with_config(source, ReaderConfig::default())
    }

    /// Create a reader with explicit configuration.
    pub fn with_config(source: S, config: ReaderConfig) -> Self {
        let calibrator = match config.baseline {
            Some(p0) => BaselineCalibrator::with_baseline(p0),
            None => BaselineCalibrator::new(),
        };
        Self {
            scanner: FrameScanner::with_config(source, config.scanner),
            calibrator,
            stage: Stage::AwaitingFrame,
            last: AltitudeSample::none(),
            emitted: 0,
        }
    }

    /// Block until the next valid altitude sample.
    pub fn read_one(&mut self) -> Result<AltitudeSample> {
        loop {
            if let Some(sample) = self.step()? {
                return Ok(sample);
            }
        }
    }

    /// Advance the state machine by one transition.
    ///
    /// Returns the sample when leaving [`ReaderState::Emit`]. Only the
    /// `AwaitingFrame` transition blocks on the source; a transport error
    /// leaves the reader in `AwaitingFrame`.
    pub fn step(&mut self) -> Result<Option<AltitudeSample>> {
        let (next, emitted) = match self.stage {
            Stage::AwaitingFrame => {
                let record = self.scanner.next_record()?;
                (Stage::HaveRecord(record), None)
            }
            Stage::HaveRecord(record) if self.calibrator.is_calibrated() => {
                (Stage::Calibrated(record), None)
            }
            Stage::HaveRecord(record) => (Stage::Uncalibrated(record), None),
            Stage::Uncalibrated(record) => {
                self.calibrator.observe(record.pressure);
                (Stage::Calibrated(record), None)
            }
            Stage::Calibrated(record) => {
                let p0 = self.calibrator.observe(record.pressure);
                (Stage::Emit(AltitudeSample::new(record.pressure, p0)), None)
            }
            Stage::Emit(sample) => {
                self.last = sample;
                self.emitted += 1;
                tracing::trace!(
                    altitude_ft = sample.altitude_ft,
                    pressure_hpa = sample.pressure_hpa,
                    "sample emitted"
                );
                (Stage::AwaitingFrame, Some(sample))
            }
        };
        self.stage = next;
        Ok(emitted)
    }

    /// Lazy, unbounded sequence of samples.
    ///
    /// The sequence ends after yielding the first error. It is not
    /// restartable from the same iterator, but the reader itself keeps its
    /// baseline and can be iterated again (e.g. after
    /// [`replace_source`](Self::replace_source)).
    pub fn samples(&mut self) -> Samples<'_, S> {
        Samples {
            reader: self,
            done: false,
        }
    }

    /// Swap in a new byte source, keeping the calibrated baseline.
    ///
    /// Any record in flight belongs to the old stream and is dropped.
    pub fn replace_source(&mut self, source: S) -> S {
        self.stage = Stage::AwaitingFrame;
        self.scanner.replace_source(source)
    }

    /// Forget the baseline; the next decoded pressure recalibrates.
    pub fn reset_baseline(&mut self) {
        self.calibrator.reset();
    }

    /// Current state of the emit cycle.
    pub fn state(&self) -> ReaderState {
        self.stage.state()
    }

    /// Baseline in effect (the default until calibrated).
    pub fn baseline(&self) -> f64 {
        self.calibrator.baseline()
    }

    /// True once the reader has a baseline.
    pub fn is_calibrated(&self) -> bool {
        self.calibrator.is_calibrated()
    }

    /// Most recent sample, or [`AltitudeSample::none`] before the first.
    pub fn last_sample(&self) -> AltitudeSample {
        self.last
    }

    /// Number of samples emitted.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    /// Scanner counters.
    pub fn scan_stats(&self) -> ScanStats {
        self.scanner.stats()
    }

    /// Borrow the frame scanner.
    pub fn scanner(&self) -> &FrameScanner<S> {
        &self.scanner
    }

    /// Consume the reader and return the source.
    pub fn into_inner(self) -> S {
        self.scanner.into_inner()
    }
}

impl<S> std::fmt::Debug for TelemetryReader<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryReader")
            .field("scanner", &self.scanner)
            .field("calibrator", &self.calibrator)
            .field("state", &self.stage.state())
            .field("emitted", &self.emitted)
            .finish()
    }
}

/// Iterator returned by [`TelemetryReader::samples`].
pub struct Samples<'a, S> {
    reader: &'a mut TelemetryReader<S>,
    done: bool,
}

impl<S: ByteSource> Iterator for Samples<'_, S> {
    type Item = Result<AltitudeSample>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.read_one() {
            Ok(sample) => Some(Ok(sample)),
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

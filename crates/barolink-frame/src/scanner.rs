use barolink_transport::ByteSource;
use bytes::{Buf, BytesMut};
use serde::Serialize;

use crate::codec::{is_plausible_length, CandidateFrame, PREFIX_SIZE};
use crate::decode::{decode_payload, DecodeOutcome, TelemetryRecord};
use crate::error::Result;

/// How the scanner realigns after a candidate frame is rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResyncPolicy {
    /// Trust the rejected frame's length and continue from its last four
    /// payload bytes. Frames shorter than four bytes are dropped and the
    /// window is refilled from the source.
    ///
    /// Fast, but a genuine frame starting inside a rejected payload is
    /// skipped.
    #[default]
    TailReuse,
    /// Distrust the rejected frame entirely and restart scanning one byte
    /// after its prefix. Every byte of the stream is considered as a
    /// potential prefix start.
    ByteByByte,
}

/// Scanner configuration.
#[derive(Debug, Clone, Default)]
pub struct ScannerConfig {
    /// Realignment strategy after a rejected frame.
    pub resync: ResyncPolicy,
    /// Emit a trace event for every byte skipped over a corrupt prefix.
    pub log_corrupt_prefix: bool,
}

/// Where the scanner is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanState {
    /// No window; the next scan reads four fresh bytes.
    Fresh,
    /// Sliding over implausible length values.
    Scanning,
    /// A candidate has been handed out and not yet accepted or rejected.
    Decoding,
    /// The last candidate was rejected; the window was rebuilt from it.
    Resynchronizing,
    /// The last candidate decoded to a record.
    Synchronized,
}

/// Counters describing what the scanner has passed over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    /// Bytes discarded without forming part of an accepted frame.
    pub bytes_skipped: u64,
    /// Candidates with a plausible length.
    pub candidates: u64,
    /// Candidates that decoded to a record.
    pub accepted: u64,
    /// Candidates whose payload was not a CBOR map.
    pub malformed: u64,
    /// Candidates whose map lacked a numeric pressure.
    pub missing_field: u64,
    /// Rejected candidates too short to seed a new window.
    pub short_discarded: u64,
}

/// Locates telemetry frames in an unframed, untrusted byte stream.
///
/// Only transport failures are returned as errors. Corrupt prefixes and
/// undecodable payloads are absorbed and scanning continues.
pub struct FrameScanner<S> {
    source: S,
    config: ScannerConfig,
    window: Option<[u8; PREFIX_SIZE]>,
    replay: BytesMut,
    state: ScanState,
    stats: ScanStats,
}

impl<S: ByteSource> FrameScanner<S> {
    /// Create a scanner with default configuration.
    pub fn new(source: S) -> Self {
        Self::with_config(source, ScannerConfig::default())
    }

    /// Create a scanner with explicit configuration.
    pub fn with_config(source: S, config: ScannerConfig) -> Self {
        Self {
            source,
            config,
            window: None,
            replay: BytesMut::new(),
            state: ScanState::Fresh,
            stats: ScanStats::default(),
        }
    }

    /// Scan forward to the next prefix with a plausible length and read the
    /// payload it announces (blocking).
    ///
    /// The returned candidate must be passed back to [`reject`](Self::reject)
    /// if its content turns out to be unusable; otherwise it is considered
    /// consumed.
    pub fn next_candidate(&mut self) -> Result<CandidateFrame> {
        let mut window = match self.window.take() {
            Some(window) => window,
            None => {
                self.state = ScanState::Fresh;
                let mut window = [0u8; PREFIX_SIZE];
                self.fill(&mut window)?;
                window
            }
        };
        self.state = ScanState::Scanning;

        loop {
            let len = u32::from_be_bytes(window);
            if is_plausible_length(len) {
                let mut payload = vec![0u8; len as usize];
                self.fill(&mut payload)?;
                self.stats.candidates += 1;
                self.state = ScanState::Decoding;
                return Ok(CandidateFrame::new(window, payload));
            }

            if self.config.log_corrupt_prefix {
                tracing::trace!(prefix = len, dropped = window[0], "implausible length, sliding");
            }
            self.stats.bytes_skipped += 1;

            let mut next = [0u8; 1];
            self.fill(&mut next)?;
            window.copy_within(1.., 0);
            window[PREFIX_SIZE - 1] = next[0];
        }
    }

    /// Give back a candidate whose content was unusable and realign the
    /// window according to the configured [`ResyncPolicy`].
    pub fn reject(&mut self, candidate: &CandidateFrame) {
        self.state = ScanState::Resynchronizing;

        match self.config.resync {
            ResyncPolicy::TailReuse => match candidate.tail_window() {
                Some(tail) => {
                    self.stats.bytes_skipped += (candidate.wire_size() - PREFIX_SIZE) as u64;
                    self.window = Some(tail);
                }
                None => {
                    self.stats.bytes_skipped += candidate.wire_size() as u64;
                    self.stats.short_discarded += 1;
                    self.window = None;
                }
            },
            ResyncPolicy::ByteByByte => {
                let mut replay =
                    BytesMut::with_capacity(candidate.wire_size() - 1 + self.replay.len());
                replay.extend_from_slice(&candidate.prefix[1..]);
                replay.extend_from_slice(&candidate.payload);
                replay.extend_from_slice(&self.replay);
                self.replay = replay;
                self.stats.bytes_skipped += 1;
                self.window = None;
            }
        }
    }

    /// Block until a frame decodes to a record with a usable pressure.
    pub fn next_record(&mut self) -> Result<TelemetryRecord> {
        loop {
            let candidate = self.next_candidate()?;

            match decode_payload(&candidate.payload) {
                DecodeOutcome::Frame(record) => {
                    self.stats.accepted += 1;
                    self.state = ScanState::Synchronized;
                    return Ok(record);
                }
                DecodeOutcome::Malformed(reason) => {
                    self.stats.malformed += 1;
                    tracing::debug!(
                        len = candidate.declared_len(),
                        %reason,
                        "malformed frame, resynchronizing"
                    );
                    self.reject(&candidate);
                }
                DecodeOutcome::MissingField => {
                    self.stats.missing_field += 1;
                    tracing::debug!(
                        len = candidate.declared_len(),
                        "frame without usable pressure, resynchronizing"
                    );
                    self.reject(&candidate);
                }
            }
        }
    }

    /// Swap in a new byte source (e.g. after reopening a device).
    ///
    /// Any partially scanned window and pending replay bytes belong to the
    /// old stream and are discarded. Statistics are kept.
    pub fn replace_source(&mut self, source: S) -> S {
        self.window = None;
        self.replay.clear();
        self.state = ScanState::Fresh;
        std::mem::replace(&mut self.source, source)
    }

    /// Current position in the scan cycle.
    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Counters accumulated since construction.
    pub fn stats(&self) -> ScanStats {
        self.stats
    }

    /// Current scanner configuration.
    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Change the realignment strategy for subsequent rejections.
    pub fn set_resync_policy(&mut self, resync: ResyncPolicy) {
        self.config.resync = resync;
    }

    /// Borrow the underlying source.
    pub fn get_ref(&self) -> &S {
        &self.source
    }

    /// Mutably borrow the underlying source.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Consume the scanner and return the source.
    pub fn into_inner(self) -> S {
        self.source
    }

    /// Fill `buf` from pending replay bytes first, then from the source.
    fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        let from_replay = self.replay.len().min(buf.len());
        if from_replay > 0 {
            buf[..from_replay].copy_from_slice(&self.replay[..from_replay]);
            self.replay.advance(from_replay);
        }
        if from_replay < buf.len() {
            self.source.read_exact(&mut buf[from_replay..])?;
        }
        Ok(())
    }
}

impl<S> std::fmt::Debug for FrameScanner<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameScanner")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("stats", &self.stats)
            .finish()
    }
}

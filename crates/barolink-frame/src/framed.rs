use bytes::{Buf, BytesMut};
use tokio_util::codec::Decoder;

use crate::codec::{is_plausible_length, PREFIX_SIZE};
use crate::decode::{decode_payload, DecodeOutcome, TelemetryRecord};
use crate::error::FrameError;
use crate::scanner::{ResyncPolicy, ScanStats};

/// `tokio_util` codec with the same scan and resync rules as
/// [`FrameScanner`](crate::FrameScanner), for use with `FramedRead`.
///
/// The buffer takes the place of the sliding window: implausible prefixes
/// advance it by one byte, rejected frames advance it to their tail (or one
/// byte past their prefix under [`ResyncPolicy::ByteByByte`]).
#[derive(Debug, Clone, Default)]
pub struct TelemetryCodec {
    resync: ResyncPolicy,
    stats: ScanStats,
}

impl TelemetryCodec {
    /// A codec that realigns with `resync` after a rejected frame.
    pub fn new(resync: ResyncPolicy) -> Self {
        Self {
            resync,
            stats: ScanStats::default(),
        }
    }

    /// Counters accumulated since construction.
    pub fn stats(&self) -> ScanStats {
        self.stats
    }
}

impl Decoder for TelemetryCodec {
    type Item = TelemetryRecord;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            if src.len() < PREFIX_SIZE {
                return Ok(None);
            }

            let mut prefix = [0u8; PREFIX_SIZE];
            prefix.copy_from_slice(&src[..PREFIX_SIZE]);
            let len = u32::from_be_bytes(prefix);
            if !is_plausible_length(len) {
                src.advance(1);
                self.stats.bytes_skipped += 1;
                continue;
            }

            let total = PREFIX_SIZE + len as usize;
            if src.len() < total {
                src.reserve(total - src.len());
                return Ok(None);
            }
            self.stats.candidates += 1;

            let outcome = decode_payload(&src[PREFIX_SIZE..total]);
            match outcome {
                DecodeOutcome::Frame(record) => {
                    src.advance(total);
                    self.stats.accepted += 1;
                    return Ok(Some(record));
                }
                DecodeOutcome::Malformed(_) => self.stats.malformed += 1,
                DecodeOutcome::MissingField => self.stats.missing_field += 1,
            }
            tracing::debug!(len, outcome = outcome.label(), "rejected frame, resynchronizing");

            let skip = match self.resync {
                ResyncPolicy::TailReuse if len as usize >= PREFIX_SIZE => total - PREFIX_SIZE,
                ResyncPolicy::TailReuse => {
                    self.stats.short_discarded += 1;
                    total
                }
                ResyncPolicy::ByteByByte => 1,
            };
            src.advance(skip);
            self.stats.bytes_skipped += skip as u64;
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(record) = self.decode(src)? {
            return Ok(Some(record));
        }
        if !src.is_empty() {
            tracing::debug!(remaining = src.len(), "dropping incomplete bytes at end of stream");
            self.stats.bytes_skipped += src.len() as u64;
            src.clear();
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use barolink_transport::StreamSource;
    use futures_util::StreamExt;
    use proptest::prelude::*;
    use serde::Serialize;
    use tokio_util::codec::FramedRead;

    use super::*;
    use crate::codec::{encode_payload, encode_record};
    use crate::scanner::{FrameScanner, ScannerConfig};

    #[derive(Serialize)]
    struct Reading {
        pressure: f64,
    }

    #[derive(Serialize)]
    struct Status<'a> {
        station: &'a str,
    }

    #[test]
    fn waits_for_complete_frame() {
        let mut wire = BytesMut::new();
        encode_record(&Reading { pressure: 1012.0 }, &mut wire).unwrap();
        let full = wire.clone();
        wire.truncate(full.len() - 1);

        let mut codec = TelemetryCodec::default();
        assert!(codec.decode(&mut wire).unwrap().is_none());
        assert_eq!(wire.len(), full.len() - 1);

        wire.extend_from_slice(&full[full.len() - 1..]);
        let record = codec.decode(&mut wire).unwrap().unwrap();
        assert_eq!(record.pressure, 1012.0);
        assert!(wire.is_empty());
    }

    #[test]
    fn skips_noise_and_rejected_frames() {
        let mut wire = BytesMut::new();
        wire.extend_from_slice(&[0xFF, 0xFF, 0x13]);
        encode_record(&Status { station: "alpha" }, &mut wire).unwrap();
        encode_payload(&[0x61, 0x41], &mut wire).unwrap();
        encode_record(&Reading { pressure: 1011.0 }, &mut wire).unwrap();

        let mut codec = TelemetryCodec::default();
        let record = codec.decode(&mut wire).unwrap().unwrap();
        assert_eq!(record.pressure, 1011.0);

        let stats = codec.stats();
        assert_eq!(stats.missing_field, 1);
        assert_eq!(stats.malformed, 1);
        assert_eq!(stats.short_discarded, 1);
        assert_eq!(stats.accepted, 1);
    }

    /// Drain `wire` through the codec the way `FramedRead` does at EOF.
    fn codec_records(wire: &[u8], resync: ResyncPolicy) -> Vec<f64> {
        let mut buf = BytesMut::from(wire);
        let mut codec = TelemetryCodec::new(resync);
        let mut seen = Vec::new();
        while let Some(record) = codec.decode_eof(&mut buf).unwrap() {
            seen.push(record.pressure);
        }
        seen
    }

    fn scanner_records(wire: &[u8], resync: ResyncPolicy) -> Vec<f64> {
        let config = ScannerConfig {
            resync,
            ..ScannerConfig::default()
        };
        let mut scanner =
            FrameScanner::with_config(StreamSource::new(Cursor::new(wire.to_vec())), config);
        let mut seen = Vec::new();
        loop {
            match scanner.next_record() {
                Ok(record) => seen.push(record.pressure),
                Err(err) => {
                    assert!(err.is_transport(), "unexpected error: {err}");
                    return seen;
                }
            }
        }
    }

    #[test]
    fn hidden_frame_depends_on_resync_policy() {
        // A bogus 200-byte prefix swallows a real frame.
        let mut wire = BytesMut::new();
        wire.extend_from_slice(&200u32.to_be_bytes());
        encode_record(&Reading { pressure: 990.0 }, &mut wire).unwrap();
        wire.resize(4 + 200, 0xEE);
        encode_record(&Reading { pressure: 995.0 }, &mut wire).unwrap();

        assert_eq!(codec_records(&wire, ResyncPolicy::TailReuse), vec![995.0]);
        assert_eq!(
            codec_records(&wire, ResyncPolicy::ByteByByte),
            vec![990.0, 995.0]
        );

        for resync in [ResyncPolicy::TailReuse, ResyncPolicy::ByteByByte] {
            assert_eq!(codec_records(&wire, resync), scanner_records(&wire, resync));
        }
    }

    #[test]
    fn byte_by_byte_advances_one_byte_past_rejected_prefix() {
        let mut wire = BytesMut::new();
        encode_payload(&[0x61, 0x41], &mut wire).unwrap();
        encode_record(&Reading { pressure: 1006.0 }, &mut wire).unwrap();

        let mut codec = TelemetryCodec::new(ResyncPolicy::ByteByByte);
        let record = codec.decode(&mut wire).unwrap().unwrap();
        assert_eq!(record.pressure, 1006.0);

        let stats = codec.stats();
        assert_eq!(stats.malformed, 1);
        assert_eq!(stats.short_discarded, 0);
        assert!(wire.is_empty());
    }

    #[derive(Debug, Clone)]
    enum Chunk {
        Noise(Vec<u8>),
        Reading(f64),
        Missing(f64),
        Garbage(Vec<u8>),
    }

    fn chunk() -> impl Strategy<Value = Chunk> {
        prop_oneof![
            prop::collection::vec(any::<u8>(), 0..16).prop_map(Chunk::Noise),
            (900.0f64..1100.0).prop_map(Chunk::Reading),
            (-40.0f64..60.0).prop_map(Chunk::Missing),
            prop::collection::vec(any::<u8>(), 1..40).prop_map(Chunk::Garbage),
        ]
    }

    #[derive(Serialize)]
    struct Heartbeat {
        temperature: f64,
    }

    proptest! {
        #[test]
        fn codec_matches_scanner(chunks in prop::collection::vec(chunk(), 0..12)) {
            let mut wire = BytesMut::new();
            for chunk in &chunks {
                match chunk {
                    Chunk::Noise(bytes) => wire.extend_from_slice(bytes),
                    Chunk::Reading(pressure) => {
                        encode_record(&Reading { pressure: *pressure }, &mut wire).unwrap()
                    }
                    Chunk::Missing(temperature) => {
                        encode_record(&Heartbeat { temperature: *temperature }, &mut wire).unwrap()
                    }
                    Chunk::Garbage(bytes) => encode_payload(bytes, &mut wire).unwrap(),
                }
            }

            for resync in [ResyncPolicy::TailReuse, ResyncPolicy::ByteByByte] {
                prop_assert_eq!(codec_records(&wire, resync), scanner_records(&wire, resync));
            }
        }
    }

    #[tokio::test]
    async fn framed_read_yields_records_in_order() {
        let mut wire = BytesMut::new();
        for pressure in [1013.25, 1000.0, 990.5] {
            encode_record(&Reading { pressure }, &mut wire).unwrap();
            wire.extend_from_slice(&[0xFF]);
        }

        let bytes = wire.to_vec();
        let mut framed = FramedRead::new(bytes.as_slice(), TelemetryCodec::default());
        let mut seen = Vec::new();
        while let Some(record) = framed.next().await {
            seen.push(record.unwrap().pressure);
        }
        assert_eq!(seen, vec![1013.25, 1000.0, 990.5]);
    }
}

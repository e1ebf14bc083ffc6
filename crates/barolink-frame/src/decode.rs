use ciborium::Value;

/// Map key carrying the pressure reading.
pub const PRESSURE_KEY: &str = "pressure";

/// A decoded telemetry record with a usable pressure reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryRecord {
    /// Pressure in hectopascals. Not range-checked.
    pub pressure: f64,
}

/// Result of interpreting a candidate payload.
///
/// Neither failure variant is fatal; the scanner resynchronizes on both.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeOutcome {
    /// The payload is a map with a numeric `pressure` entry.
    Frame(TelemetryRecord),
    /// The payload is not a single well-formed CBOR map.
    Malformed(String),
    /// The payload is a map, but `pressure` is absent or not numeric.
    MissingField,
}

impl DecodeOutcome {
    /// Short label for logs and statistics.
    pub fn label(&self) -> &'static str {
        match self {
            DecodeOutcome::Frame(_) => "frame",
            DecodeOutcome::Malformed(_) => "malformed",
            DecodeOutcome::MissingField => "missing_field",
        }
    }
}

/// Decode a candidate payload.
///
/// Trailing bytes after the encoded map make the payload malformed. Integer
/// pressures are accepted and widened to `f64`; entries other than
/// `pressure` are ignored.
pub fn decode_payload(payload: &[u8]) -> DecodeOutcome {
    let mut rest = payload;
    let value: Value = match ciborium::from_reader(&mut rest) {
        Ok(value) => value,
        Err(err) => return DecodeOutcome::Malformed(err.to_string()),
    };
    if !rest.is_empty() {
        return DecodeOutcome::Malformed(format!("{} trailing bytes after record", rest.len()));
    }

    let entries = match value {
        Value::Map(entries) => entries,
        other => return DecodeOutcome::Malformed(format!("expected map, found {}", kind(&other))),
    };

    let pressure = entries
        .iter()
        .find(|(key, _)| key.as_text() == Some(PRESSURE_KEY))
        .and_then(|(_, value)| as_number(value));

    match pressure {
        Some(pressure) => DecodeOutcome::Frame(TelemetryRecord { pressure }),
        None => DecodeOutcome::MissingField,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Float(f) => Some(*f),
        Value::Integer(i) => Some(i128::from(*i) as f64),
        _ => None,
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Integer(_) => "integer",
        Value::Bytes(_) => "bytes",
        Value::Float(_) => "float",
        Value::Text(_) => "text",
        Value::Bool(_) => "bool",
        Value::Null => "null",
        Value::Tag(..) => "tag",
        Value::Array(_) => "array",
        Value::Map(_) => "map",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use serde::Serialize;

    use super::*;

    fn cbor<T: Serialize>(value: &T) -> Vec<u8> {
        let mut out = Vec::new();
        ciborium::into_writer(value, &mut out).unwrap();
        out
    }

    #[derive(Serialize)]
    struct Reading {
        pressure: f64,
        temperature: f64,
        humidity: f64,
    }

    #[derive(Serialize)]
    struct NoPressure {
        temperature: f64,
    }

    #[test]
    fn decodes_pressure_and_ignores_other_fields() {
        let payload = cbor(&Reading {
            pressure: 1000.5,
            temperature: 21.0,
            humidity: 40.0,
        });
        assert_eq!(
            decode_payload(&payload),
            DecodeOutcome::Frame(TelemetryRecord { pressure: 1000.5 })
        );
    }

    #[test]
    fn integer_pressure_is_widened() {
        let payload = cbor(&Value::Map(vec![(
            Value::Text("pressure".into()),
            Value::Integer(998.into()),
        )]));
        assert_eq!(
            decode_payload(&payload),
            DecodeOutcome::Frame(TelemetryRecord { pressure: 998.0 })
        );
    }

    #[test]
    fn missing_pressure_is_missing_field() {
        let payload = cbor(&NoPressure { temperature: 20.0 });
        assert_eq!(decode_payload(&payload), DecodeOutcome::MissingField);
    }

    #[test]
    fn non_numeric_pressure_is_missing_field() {
        let payload = cbor(&Value::Map(vec![(
            Value::Text("pressure".into()),
            Value::Text("high".into()),
        )]));
        assert_eq!(decode_payload(&payload), DecodeOutcome::MissingField);
    }

    #[test]
    fn non_map_is_malformed() {
        let payload = cbor(&Value::Array(vec![Value::Float(1013.25)]));
        assert!(matches!(decode_payload(&payload), DecodeOutcome::Malformed(_)));
    }

    #[test]
    fn truncated_payload_is_malformed() {
        let payload = cbor(&Reading {
            pressure: 1000.5,
            temperature: 21.0,
            humidity: 40.0,
        });
        let outcome = decode_payload(&payload[..payload.len() - 3]);
        assert!(matches!(outcome, DecodeOutcome::Malformed(_)));
        assert_eq!(outcome.label(), "malformed");
    }

    #[test]
    fn trailing_bytes_are_malformed() {
        let mut payload = cbor(&Reading {
            pressure: 1000.5,
            temperature: 21.0,
            humidity: 40.0,
        });
        payload.push(0x00);
        assert!(matches!(decode_payload(&payload), DecodeOutcome::Malformed(_)));
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(
            decode_payload(&[0xff, 0xff, 0xff]),
            DecodeOutcome::Malformed(_)
        ));
    }
}

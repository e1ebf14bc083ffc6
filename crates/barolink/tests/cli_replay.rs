#![cfg(feature = "cli")]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "barolink-cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn barolink(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_barolink"))
        .args(["--log-level", "error"])
        .args(args)
        .output()
        .expect("barolink should run")
}

fn encode_into(capture: &Path, pressure: &str, extra: &[&str]) {
    let mut args = vec![
        "encode",
        "--pressure",
        pressure,
        "--out",
        capture.to_str().expect("utf-8 path"),
    ];
    args.extend_from_slice(extra);
    let out = barolink(&args);
    assert!(
        out.status.success(),
        "encode failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );
}

fn json_lines(stdout: &[u8]) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(stdout)
        .lines()
        .map(|line| serde_json::from_str(line).expect("each line should be json"))
        .collect()
}

#[test]
fn replay_zeroes_on_first_frame() {
    let dir = unique_temp_dir("replay");
    let capture = dir.join("capture.bin");
    encode_into(&capture, "1013.25", &["--field", "temperature=20.5"]);
    encode_into(&capture, "1000", &["--noise", "17"]);

    let out = barolink(&["replay", capture.to_str().unwrap(), "--format", "json"]);
    assert!(out.status.success());

    let samples = json_lines(&out.stdout);
    assert_eq!(samples.len(), 2);
    assert!(samples[0]["altitude_ft"].as_f64().unwrap().abs() < 1e-6);
    assert_eq!(samples[0]["baseline_hpa"].as_f64(), Some(1013.25));
    let second = samples[1]["altitude_ft"].as_f64().unwrap();
    assert!((second - 363.5).abs() < 0.5, "got {second}");
    assert_eq!(samples[1]["has_sample"].as_bool(), Some(true));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn replay_skips_frame_without_pressure() {
    let dir = unique_temp_dir("missing-field");
    let capture = dir.join("capture.bin");

    // {"temp": 1} as a 7-byte CBOR map.
    let heartbeat = [0x00, 0x00, 0x00, 0x07, 0xA1, 0x64, b't', b'e', b'm', b'p', 0x01];
    std::fs::write(&capture, heartbeat).expect("capture should be writable");
    encode_into(&capture, "1005", &[]);

    let out = barolink(&[
        "replay",
        capture.to_str().unwrap(),
        "--format",
        "json",
        "--stats",
    ]);
    assert!(out.status.success());

    let lines = json_lines(&out.stdout);
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["pressure_hpa"].as_f64(), Some(1005.0));
    assert_eq!(lines[1]["missing_field"].as_u64(), Some(1));
    assert_eq!(lines[1]["accepted"].as_u64(), Some(1));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn replay_of_pure_noise_fails() {
    let dir = unique_temp_dir("noise");
    let capture = dir.join("capture.bin");
    std::fs::write(&capture, [0xEEu8; 64]).expect("capture should be writable");

    let out = barolink(&["replay", capture.to_str().unwrap(), "--format", "json"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("no valid frames"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn replay_honours_count_and_baseline() {
    let dir = unique_temp_dir("count");
    let capture = dir.join("capture.bin");
    for pressure in ["1000", "999", "998"] {
        encode_into(&capture, pressure, &[]);
    }

    let out = barolink(&[
        "replay",
        capture.to_str().unwrap(),
        "--format",
        "json",
        "--count",
        "2",
        "--baseline",
        "1013.25",
    ]);
    assert!(out.status.success());

    let samples = json_lines(&out.stdout);
    assert_eq!(samples.len(), 2);
    assert_eq!(samples[0]["baseline_hpa"].as_f64(), Some(1013.25));
    assert!(samples[0]["altitude_ft"].as_f64().unwrap() > 300.0);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn replay_rejects_zero_count() {
    let dir = unique_temp_dir("zero-count");
    let capture = dir.join("capture.bin");
    encode_into(&capture, "1000", &[]);

    let out = barolink(&["replay", capture.to_str().unwrap(), "--count", "0"]);
    assert_eq!(out.status.code(), Some(64));
    assert!(out.stdout.is_empty());
    assert!(String::from_utf8_lossy(&out.stderr).contains("--count must be at least 1"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn watch_missing_device_fails_to_open() {
    let out = barolink(&["watch", "/dev/barolink-no-such-device", "--format", "json"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("open failed"));
}

#[test]
fn version_prints_package_version() {
    let out = barolink(&["version"]);
    assert!(out.status.success());
    assert_eq!(
        String::from_utf8_lossy(&out.stdout).trim(),
        format!("barolink {}", env!("CARGO_PKG_VERSION"))
    );
}

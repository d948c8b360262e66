use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "wlansim-rs-{prefix}-{}-{nanos}",
        std::process::id()
    ));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn write_file(dir: &PathBuf, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write temp file");
    path
}

const SHORT_SCENARIO: &str = r#"
{
    "sink_window": { "start_s": 0.1, "stop_s": 0.5 },
    "source_window": { "start_s": 0.2, "stop_s": 0.3 },
    "horizon_s": 0.5
}
"#;

#[test]
fn wifi_hybrid_writes_report_json() {
    let dir = unique_temp_dir("cli-report");
    let config = write_file(&dir, "scenario.json", SHORT_SCENARIO);
    let report = dir.join("report.json");

    let output = Command::new(env!("CARGO_BIN_EXE_wifi-hybrid"))
        .args([
            "--config",
            config.to_str().unwrap(),
            "--verbose",
            "false",
            "--report-json",
            report.to_str().unwrap(),
        ])
        .output()
        .expect("run wifi-hybrid");
    assert!(
        output.status.success(),
        "wifi-hybrid failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("scenario n_wifi=4 cw_min=63"), "stdout: {stdout}");

    let raw = fs::read_to_string(&report).expect("read report.json");
    let v: Value = serde_json::from_str(&raw).expect("parse report.json");
    assert_eq!(v["sources"].as_array().map(|a| a.len()), Some(4));
    assert_eq!(v["sinks"].as_array().map(|a| a.len()), Some(1));
    assert_eq!(v["engine"]["routing_populations"], 1);
    assert_eq!(v["sinks"][0]["address"], "10.1.2.4");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn wifi_hybrid_flags_override_config_and_enable_capture() {
    let dir = unique_temp_dir("cli-pcap");
    let config = write_file(&dir, "scenario.json", SHORT_SCENARIO);
    let report = dir.join("report.json");

    let output = Command::new(env!("CARGO_BIN_EXE_wifi-hybrid"))
        .args([
            "--config",
            config.to_str().unwrap(),
            "--n-wifi",
            "2",
            "--cw-min",
            "31",
            "--tracing",
            "true",
            "--pcap-dir",
            dir.to_str().unwrap(),
            "--report-json",
            report.to_str().unwrap(),
        ])
        .output()
        .expect("run wifi-hybrid");
    assert!(
        output.status.success(),
        "wifi-hybrid failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let raw = fs::read_to_string(&report).expect("read report.json");
    let v: Value = serde_json::from_str(&raw).expect("parse report.json");
    assert_eq!(v["n_wifi"], 2);
    assert_eq!(v["cw_min"], 31);
    assert_eq!(v["sources"].as_array().map(|a| a.len()), Some(2));
    for name in ["third-0-0.pcap", "third-0-1.pcap", "third-1-0.pcap", "third-1-1.pcap"] {
        assert!(dir.join(name).exists(), "missing {name}");
    }

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn wifi_hybrid_exits_nonzero_on_config_error() {
    let dir = unique_temp_dir("cli-error");
    let config = write_file(&dir, "scenario.json", SHORT_SCENARIO);

    let output = Command::new(env!("CARGO_BIN_EXE_wifi-hybrid"))
        .args(["--config", config.to_str().unwrap(), "--n-wifi", "0"])
        .output()
        .expect("run wifi-hybrid");
    assert!(
        !output.status.success(),
        "expected non-zero exit, got success"
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("at least one station"),
        "stderr did not contain expected message: {stderr}"
    );

    let _ = fs::remove_dir_all(&dir);
}

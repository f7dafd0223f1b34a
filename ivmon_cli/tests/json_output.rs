use assert_cmd::Command;
use rstest::rstest;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

fn write_config(dir: &tempfile::TempDir, extra: &str) -> PathBuf {
    let toml = r#"
[hx711]
ready_polls = 50
ready_poll_ms = 1
inter_read_ms = 1
settle_ms = 5

[readings]
average = 2
tare = 3
calibration = 5
verification = 3
measurement = 3

[calibration]
stabilization_ms = 5
settle_ms = 5

[monitor]
interval_ms = 10
"#;
    let path = dir.path().join("ivmon.toml");
    fs::write(&path, format!("{toml}\n{extra}")).unwrap();
    path
}

fn ivmon_json(cfg: &PathBuf) -> Command {
    let mut cmd = Command::cargo_bin("ivmon").unwrap();
    cmd.arg("--config").arg(cfg).arg("--json");
    cmd.env_remove("RUST_LOG")
        .env_remove("IVMON_SIM_LOAD_G")
        .env_remove("IVMON_SIM_DISCONNECTED");
    cmd
}

fn json_lines(bytes: &[u8]) -> Vec<Value> {
    String::from_utf8_lossy(bytes)
        .lines()
        .filter(|l| l.trim_start().starts_with('{'))
        .map(|l| serde_json::from_str(l).expect("valid JSON line"))
        .collect()
}

#[test]
fn run_report_is_json() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");

    let out = ivmon_json(&cfg)
        .args(["run", "--cycles", "2"])
        .write_stdin("2\n420\n\nno\n")
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let reports = json_lines(&out.stdout);
    assert_eq!(reports.len(), 1, "exactly one report on stdout");
    let report = &reports[0];
    assert_eq!(report["calibration"]["mode"], "SavedFactor");
    assert_eq!(report["calibration"]["scale"].as_f64(), Some(420.0));
    assert_eq!(report["monitor"]["cycles"].as_u64(), Some(2));
    assert_eq!(report["monitor"]["interrupted"], false);
    assert_eq!(report["monitor"]["transmitting"], false);
    assert_eq!(report["monitor"]["unsent"].as_u64(), Some(0));
}

#[rstest]
#[case("IVMON_SIM_DISCONNECTED", "1", 2, "WiringFault")]
#[case("IVMON_SIM_LOAD_G", "0", 3, "InputClosed")]
fn errors_are_json_on_stderr(
    #[case] env: &str,
    #[case] value: &str,
    #[case] code: i32,
    #[case] reason: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");

    let out = ivmon_json(&cfg)
        .env(env, value)
        .arg("run")
        .write_stdin("")
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(code));

    // Logs are JSON too; the error object is the last line.
    let lines = json_lines(&out.stderr);
    let err = lines.last().expect("error object");
    assert_eq!(err["reason"], reason);
    assert!(err["message"].as_str().unwrap().starts_with("What happened"));
}

#[test]
fn log_file_gets_json_lines() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("ivmon.log");
    let extra = format!(
        "[logging]\nfile = {:?}\nlevel = \"info\"\n",
        log.display().to_string()
    );
    let cfg = write_config(&dir, &extra);

    Command::cargo_bin("ivmon")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .arg("self-check")
        .env_remove("RUST_LOG")
        .env_remove("IVMON_SIM_DISCONNECTED")
        .assert()
        .success();

    let text = fs::read_to_string(&log).expect("log file written");
    let events = json_lines(text.as_bytes());
    assert!(
        events
            .iter()
            .any(|e| e["fields"]["message"] == "HX711 initialized"),
        "no init event in {text}"
    );
}

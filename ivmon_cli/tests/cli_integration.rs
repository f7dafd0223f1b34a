use assert_cmd::Command;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

// Short waits and small averages so the simulated station runs in well under a second
const FAST_SIM: &str = r#"
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
moving_average_size = 2

[indicators]
blink_half_period_ms = 5
"#;

// Saved factor 420 (the sim's counts per gram), empty scale, skip verification
const SAVED_FACTOR_ANSWERS: &str = "2\n420\n\nno\n";

fn write_config(dir: &tempfile::TempDir, extra: &str) -> PathBuf {
    let path = dir.path().join("ivmon.toml");
    fs::write(&path, format!("{FAST_SIM}\n{extra}")).unwrap();
    path
}

fn ivmon(cfg: &PathBuf) -> Command {
    let mut cmd = Command::cargo_bin("ivmon").unwrap();
    cmd.arg("--config").arg(cfg);
    cmd.env_remove("RUST_LOG")
        .env_remove("IVMON_SIM_LOAD_G")
        .env_remove("IVMON_SIM_DISCONNECTED");
    cmd
}

#[rstest]
#[case(&["--help"], "", 0, "Usage:", "stdout")]
#[case(&["self-check"], "", 0, "HX711 OK", "stdout")]
#[case(&["run", "--cycles", "2"], SAVED_FACTOR_ANSWERS, 0, "Scale factor 420.00", "stdout")]
#[case(&["run", "--cycles", "2"], SAVED_FACTOR_ANSWERS, 0, "CONTINUOUS MEASUREMENT", "stdout")]
#[case(&["run"], "", 3, "Operator input ended", "stderr")]
#[case(&["run", "--cycles", "1", "--collector-url", "ftp://nowhere"], "", 1, "collector.url", "stderr")]
#[case(&["bogus"], "", 2, "unrecognized subcommand", "stderr")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] stdin: &str,
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");

    let mut cmd = ivmon(&cfg);
    cmd.args(args);
    cmd.write_stdin(stdin);

    let assert = cmd.assert().code(exit_code);
    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        "stderr" => {
            assert.stderr(predicate::str::contains(needle));
        }
        other => panic!("unknown stream: {other}"),
    }
}

#[test]
fn disconnected_hx711_is_a_wiring_fault() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");

    ivmon(&cfg)
        .env("IVMON_SIM_DISCONNECTED", "1")
        .arg("self-check")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("never signalled"))
        .stdout(predicate::str::contains("Cleanup complete"));
}

#[test]
fn run_always_cleans_up() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");

    ivmon(&cfg)
        .args(["run", "--cycles", "2"])
        .write_stdin(SAVED_FACTOR_ANSWERS)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 readings"))
        .stdout(predicate::str::contains("no collector configured"))
        .stdout(predicate::str::contains("0 sent").not())
        .stdout(predicate::str::contains("Cleanup complete"));
}

#[test]
fn duplicate_pins_are_rejected_before_touching_hardware() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "[pins]\nhx711_dt = 21\n");

    ivmon(&cfg)
        .arg("self-check")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid configuration"))
        .stderr(predicate::str::contains("both use pin 21"))
        .stdout(predicate::str::contains("HX711").not());
}

#[test]
fn missing_config_file_is_explained() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope.toml");

    ivmon(&missing)
        .arg("self-check")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Could not read the config file"));
}

#[test]
fn malformed_config_is_explained() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[hx711]\ngain = \"lots\"\n").unwrap();

    ivmon(&path)
        .arg("self-check")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not valid TOML"));
}

#[test]
fn sim_load_env_must_be_numeric() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");

    ivmon(&cfg)
        .env("IVMON_SIM_LOAD_G", "heavy")
        .arg("self-check")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("IVMON_SIM_LOAD_G"));
}

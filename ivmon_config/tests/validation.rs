use ivmon_config::{Config, load_file, load_toml};
use rstest::rstest;
use std::io::Write;

#[test]
fn empty_file_is_a_valid_config() {
    let cfg = load_toml("").expect("parse TOML");
    cfg.validate().expect("defaults must validate");
    assert_eq!(cfg.pins.hx711_dt, 17);
    assert_eq!(cfg.pins.hx711_sck, 27);
    assert_eq!(cfg.monitor.low_limit_g, 50.0);
    assert_eq!(cfg.monitor.moving_average_size, 5);
    assert_eq!(cfg.readings.calibration, 20);
    assert_eq!(cfg.calibration.max_attempts, 3);
    assert!(cfg.collector.url.is_none());
    assert_eq!(cfg.collector.timeout_ms, 5000);
}

#[test]
fn partial_sections_keep_other_defaults() {
    let toml = r#"
[pins]
hx711_dt = 5
hx711_sck = 6

[monitor]
low_limit_g = 80.0

[collector]
url = "http://192.168.1.10:8000/sensor"
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    cfg.validate().expect("valid config should pass");
    assert_eq!(cfg.pins.hx711_dt, 5);
    assert_eq!(cfg.pins.low_light, 21);
    assert_eq!(cfg.monitor.low_limit_g, 80.0);
    assert_eq!(cfg.monitor.interval_ms, 500);
    assert_eq!(
        cfg.collector.url.as_deref(),
        Some("http://192.168.1.10:8000/sensor")
    );
}

#[rstest]
#[case("http://192.168.1.10:8000/sensor")]
#[case("https://collector.example.com/sensor")]
fn http_and_https_collectors_are_accepted(#[case] url: &str) {
    let cfg = load_toml(&format!("[collector]\nurl = \"{url}\"\n")).expect("parse TOML");
    cfg.validate().expect("collector url accepted");
}

#[rstest]
#[case("[pins]\nhx711_dt = 20\n", "both use pin 20")]
#[case("[pins]\nlow_light = 40\n", "pins.low_light must be a bcm pin")]
#[case("[hx711]\ngain = 100\n", "hx711.gain must be one of")]
#[case("[readings]\naverage = 0\n", "readings.average must be >= 1")]
#[case("[calibration]\nmax_attempts = 0\n", "calibration.max_attempts must be >= 1")]
#[case(
    "[calibration]\nexcellent_error_pct = 12.0\n",
    "excellent_error_pct must be <= acceptable_error_pct"
)]
#[case("[monitor]\ninterval_ms = 0\n", "monitor.interval_ms must be >= 1")]
#[case("[monitor]\nmoving_average_size = 0\n", "moving_average_size must be >= 1")]
#[case(
    "[indicators]\nblink_half_period_ms = 0\n",
    "blink_half_period_ms must be >= 1"
)]
#[case(
    "[collector]\nurl = \"ftp://example.com\"\n",
    "collector.url must start with http"
)]
#[case("[collector]\ntimeout_ms = 0\n", "collector.timeout_ms must be >= 1")]
#[case("[logging]\nrotation = \"weekly\"\n", "logging.rotation must be one of")]
fn rejects_invalid_values(#[case] toml: &str, #[case] needle: &str) {
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject");
    let msg = format!("{err}").to_lowercase();
    assert!(msg.contains(needle), "{msg:?} does not mention {needle:?}");
}

#[test]
fn rejects_wrong_types_at_parse_time() {
    assert!(load_toml("[monitor]\ninterval_ms = \"fast\"\n").is_err());
}

#[test]
fn load_file_reads_and_validates() {
    let mut f = tempfile::NamedTempFile::new().expect("tmp");
    writeln!(f, "[monitor]\nlow_limit_g = 75.0").expect("write");
    let cfg: Config = load_file(f.path()).expect("load");
    assert_eq!(cfg.monitor.low_limit_g, 75.0);

    let mut bad = tempfile::NamedTempFile::new().expect("tmp");
    writeln!(bad, "[monitor]\ninterval_ms = 0").expect("write");
    let err = load_file(bad.path()).expect_err("invalid");
    assert!(format!("{err}").contains("monitor.interval_ms"));
}

#[test]
fn load_file_reports_missing_path() {
    let err = load_file(std::path::Path::new("/nonexistent/ivmon.toml")).expect_err("missing");
    assert!(format!("{err}").contains("read config"));
}

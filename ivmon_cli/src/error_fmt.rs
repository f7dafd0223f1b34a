//! Human-readable error descriptions and structured JSON error formatting.

use ivmon_core::{AcquireError, CalibrationFailure, WiringFault};
use ivmon_hardware::HwError;

/// Stable machine-readable name for a calibration failure.
pub fn failure_reason_name(f: &CalibrationFailure) -> &'static str {
    match f {
        CalibrationFailure::WiringFault(_) => "WiringFault",
        CalibrationFailure::NoWeightChange { .. } => "NoWeightChange",
        CalibrationFailure::Rejected { .. } => "Rejected",
        CalibrationFailure::QuickVerifyFailed { .. } => "QuickVerifyFailed",
        CalibrationFailure::TareAborted { .. } => "TareAborted",
        CalibrationFailure::InvalidInput(_) => "InvalidInput",
        CalibrationFailure::Interrupted => "Interrupted",
        CalibrationFailure::InputClosed => "InputClosed",
        CalibrationFailure::Hardware(_) => "Hardware",
    }
}

const WIRING_HELP: &str = "How to fix: Check the load cell wiring (Red->E+, Black->E-, White->A+, Green->A-), the HX711 VCC/GND, and the [pins] hx711_dt/hx711_sck values.";

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(cf) = err.downcast_ref::<CalibrationFailure>() {
        return match cf {
            CalibrationFailure::WiringFault(WiringFault::NoSignal { raw }) => format!(
                "What happened: The load cell gave no signal (raw reading {raw}).\nLikely causes: Load cell not connected, a broken wire, or E+/E- swapped.\n{WIRING_HELP}"
            ),
            CalibrationFailure::WiringFault(WiringFault::NotReady) => format!(
                "What happened: The HX711 never signalled that a reading was ready.\nLikely causes: Wrong DT/SCK pins, no power to the HX711, or a loose DT wire.\n{WIRING_HELP}"
            ),
            CalibrationFailure::WiringFault(WiringFault::TooManyBadReads { bad_reads, requested }) => format!(
                "What happened: {bad_reads} of the readings failed while averaging {requested}.\nLikely causes: Intermittent wiring or electrical noise on the DT line.\n{WIRING_HELP}"
            ),
            CalibrationFailure::NoWeightChange { raw } => format!(
                "What happened: Placing the reference weight changed the reading by only {raw:.2} counts.\nLikely causes: Weight too light for this load cell, load cell not mounted so it flexes, or A+/A- swapped.\nHow to fix: Use a heavier reference weight and check the mounting, then run again."
            ),
            CalibrationFailure::Rejected { error_pct } => format!(
                "What happened: Calibration verification was off by {error_pct:.1}% and was not accepted.\nLikely causes: Weight not centred, platform movement, or an inaccurate reference weight.\nHow to fix: Run again with the weight centred and the platform still."
            ),
            CalibrationFailure::QuickVerifyFailed { error_pct } => format!(
                "What happened: The saved scale factor was off by {error_pct:.1}%.\nLikely causes: The factor belongs to a different load cell or the setup changed.\nHow to fix: Run a full calibration (option 1) and save the new factor."
            ),
            CalibrationFailure::TareAborted { offset } => format!(
                "What happened: The empty-scale baseline was only {offset:.0} counts and the tare was abandoned.\nLikely causes: Load cell not connected properly.\n{WIRING_HELP}"
            ),
            CalibrationFailure::InvalidInput(what) => format!(
                "What happened: Invalid input for the {what}.\nLikely causes: A non-numeric or non-positive weight was typed.\nHow to fix: Enter the weight in grams as a positive number, e.g. 500."
            ),
            CalibrationFailure::InputClosed => "What happened: Operator input ended before calibration finished.\nLikely causes: stdin was closed or redirected from a short file.\nHow to fix: Run interactively, or provide every calibration answer on stdin.".to_string(),
            CalibrationFailure::Interrupted => "Interrupted by user.".to_string(),
            CalibrationFailure::Hardware(msg) => format!(
                "What happened: GPIO error during calibration ({msg}).\nLikely causes: Pin already in use or insufficient permissions.\nHow to fix: Check the [pins] values and that the process may access /dev/gpiomem."
            ),
        };
    }

    if let Some(AcquireError::SensorUnusable { bad_reads, requested }) =
        err.downcast_ref::<AcquireError>()
    {
        return format!(
            "What happened: {bad_reads} of the readings failed while averaging {requested}.\nLikely causes: Intermittent wiring.\n{WIRING_HELP}"
        );
    }

    if let Some(hw) = err.downcast_ref::<HwError>() {
        return format!(
            "What happened: Hardware error ({hw}).\nLikely causes: Wrong pin numbers, GPIO not accessible, or HX711 not powered.\n{WIRING_HELP}"
        );
    }

    // String-based heuristics for errors coming from init or config
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.starts_with("read config") {
        return format!(
            "What happened: Could not read the config file ({msg}).\nLikely causes: Wrong --config path or missing permissions.\nHow to fix: Check the path, or omit --config to use built-in defaults."
        );
    }

    if lower.starts_with("parse config") {
        return format!(
            "What happened: The config file is not valid TOML for ivmon ({msg}).\nLikely causes: A typo, a wrong value type, or a misplaced section.\nHow to fix: Compare the file against the documented sections and keys."
        );
    }

    if lower.contains("pins.") || lower.contains("calibration.") || lower.contains("readings.")
        || lower.contains("monitor.") || lower.contains("hx711.") || lower.contains("collector.")
        || lower.contains("logging.") || lower.contains("indicators.")
    {
        return format!(
            "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
        );
    }

    if lower.contains("open gpio") || lower.contains("open pin") {
        return format!(
            "What happened: Failed to initialize GPIO ({msg}).\nLikely causes: Incorrect pin numbers or insufficient GPIO permissions.\nHow to fix: Fix the [pins] values; ensure the process may access GPIO."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Error: {msg}"
    )
}

/// 2 for wiring faults, 3 for other calibration failures, 1 for the rest.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match err.downcast_ref::<CalibrationFailure>() {
        Some(CalibrationFailure::WiringFault(_)) => 2,
        Some(CalibrationFailure::Interrupted) => 0,
        Some(_) => 3,
        None => 1,
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let reason = err
        .downcast_ref::<CalibrationFailure>()
        .map_or("Error", failure_reason_name);
    json!({ "reason": reason, "message": humanize(err) }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wiring_faults_exit_2() {
        let e = eyre::Report::new(CalibrationFailure::WiringFault(WiringFault::NotReady));
        assert_eq!(exit_code_for_error(&e), 2);
        assert!(humanize(&e).contains("never signalled"));
    }

    #[test]
    fn other_calibration_failures_exit_3() {
        let e = eyre::Report::new(CalibrationFailure::Rejected { error_pct: 12.5 });
        assert_eq!(exit_code_for_error(&e), 3);
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&e)).unwrap();
        assert_eq!(v["reason"], "Rejected");
        assert!(v["message"].as_str().unwrap().contains("12.5%"));
    }

    #[test]
    fn config_errors_are_explained() {
        let e = eyre::eyre!("pins.hx711_dt and pins.low_light both use pin 21");
        assert_eq!(exit_code_for_error(&e), 1);
        assert!(humanize(&e).starts_with("What happened: Invalid configuration"));
    }
}

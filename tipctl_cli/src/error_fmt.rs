//! Human-readable error descriptions and structured JSON error formatting.

use tipctl_core::error::{BuildError, ControlError, FaultKind};

pub fn fault_name(f: &FaultKind) -> &'static str {
    match f {
        FaultKind::ThermalRunaway => "ThermalRunaway",
    }
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingGate => {
                "What happened: No sample gate was provided to the control task.\nLikely causes: The ADC notification source was not wired into the builder.\nHow to fix: Pass the gate via with_gate(...).".to_string()
            }
            BuildError::MissingSensor => {
                "What happened: No tip sensor was provided to the control task.\nLikely causes: The temperature front end failed to initialize.\nHow to fix: Pass the sensor via with_sensor(...).".to_string()
            }
            BuildError::MissingHeater => {
                "What happened: No heater output was provided to the control task.\nLikely causes: The PWM driver failed to initialize.\nHow to fix: Pass the heater via with_heater(...).".to_string()
            }
            BuildError::MissingWatchdog => {
                "What happened: No watchdog was provided to the control task.\nLikely causes: The watchdog peripheral was not wired into the builder.\nHow to fix: Pass the watchdog via with_watchdog(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See etc/tipctl.toml for a sample."
            ),
        };
    }

    if let Some(ce) = err.downcast_ref::<ControlError>() {
        return match ce {
            ControlError::Fault(FaultKind::ThermalRunaway) => {
                "What happened: Thermal runaway detected; the heater was latched off.\nLikely causes: Tip not seated, broken heater connection, or a sensor that no longer tracks the tip.\nHow to fix: Check the tip and its contacts, then start a new session (runaway clears on restart).".to_string()
            }
            ControlError::HeaterFault(msg) => format!(
                "What happened: Heater driver reported a fault ({msg}).\nLikely causes: Overcurrent, shorted element, or a stopped PWM timer.\nHow to fix: Power-cycle the iron and inspect the heater wiring before heating again."
            ),
            ControlError::Heater(msg) => format!(
                "What happened: Heater command failed ({msg}).\nLikely causes: Driver busy or not initialized.\nHow to fix: Re-run with --log-level=debug for details."
            ),
            ControlError::Config(msg) => format!(
                "What happened: Configuration error ({msg}).\nLikely causes: Out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    // String-based heuristics for errors coming from config loading
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.starts_with("read config") {
        return format!(
            "What happened: Could not read the config file.\nLikely causes: Wrong path or missing permissions.\nHow to fix: Check the --config path. Original: {msg}"
        );
    }
    if lower.starts_with("parse config") {
        return format!(
            "What happened: Config file is not valid TOML for this tool.\nLikely causes: Broken TOML syntax or a value of the wrong type.\nHow to fix: Compare with etc/tipctl.toml. Original: {msg}"
        );
    }
    if lower.contains("must be") {
        return format!(
            "What happened: Invalid configuration.\nLikely causes: {msg}.\nHow to fix: Edit the TOML config and try again."
        );
    }
    if lower.starts_with("self-check") {
        return format!(
            "What happened: Self-check failed.\nLikely causes: {msg}.\nHow to fix: Re-run with --log-level=debug to see every cycle."
        );
    }

    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: 3 thermal runaway, 4 heater fault, 1 anything else.
/// (2 is clap's usage error.)
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match err.downcast_ref::<ControlError>() {
        Some(ControlError::Fault(FaultKind::ThermalRunaway)) => 3,
        Some(ControlError::HeaterFault(_)) => 4,
        _ => 1,
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let msg = humanize(err);
    let reason = match err.downcast_ref::<ControlError>() {
        Some(ControlError::Fault(f)) => fault_name(f),
        Some(ControlError::HeaterFault(_)) => "HeaterFault",
        Some(ControlError::Heater(_)) => "Heater",
        Some(ControlError::Config(_)) => "Config",
        None if err.downcast_ref::<BuildError>().is_some() => "Build",
        None => "Error",
    };
    json!({ "reason": reason, "message": msg }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runaway_maps_to_exit_3_and_reason() {
        let err = eyre::Report::new(ControlError::Fault(FaultKind::ThermalRunaway));
        assert_eq!(exit_code_for_error(&err), 3);
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&err)).unwrap();
        assert_eq!(v["reason"], "ThermalRunaway");
        assert!(v["message"].as_str().unwrap().contains("Thermal runaway"));
    }

    #[test]
    fn heater_fault_maps_to_exit_4() {
        let err = eyre::Report::new(ControlError::HeaterFault("overcurrent".into()));
        assert_eq!(exit_code_for_error(&err), 4);
        assert!(humanize(&err).contains("overcurrent"));
    }

    #[test]
    fn config_validation_message_is_explained() {
        let err = eyre::eyre!("control.rate_hz must be > 0");
        assert_eq!(exit_code_for_error(&err), 1);
        assert!(humanize(&err).contains("Invalid configuration"));
    }
}

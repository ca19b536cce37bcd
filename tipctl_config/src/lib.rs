#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the tip temperature controller.
//!
//! `Config` and its sections are deserialized from TOML and checked by
//! `Config::validate`. Every section is optional; an empty file yields the
//! stock controller tuning and a benign simulated iron.
use serde::Deserialize;

/// Where the integral (heat-loss) term comes from.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IntegralSource {
    /// Rolling average of recent temperature errors.
    #[default]
    ErrorHistory,
    /// Rolling average of recently committed heater power.
    CommittedPower,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ControlSection {
    /// Control cycles per second (one ADC conversion per cycle).
    pub rate_hz: u32,
    /// Bounded wait for the sample-ready notification, in ticks (ms).
    pub sample_timeout_ticks: u32,
    pub integral: IntegralSource,
    /// Filtered reads issued at task start to settle the ADC filter.
    pub preseed_reads: u32,
    /// Emit one debug event per cycle with the full controller state.
    pub trace_state: bool,
}

impl Default for ControlSection {
    fn default() -> Self {
        Self {
            rate_hz: 8,
            sample_timeout_ticks: 2000,
            integral: IntegralSource::ErrorHistory,
            preseed_reads: 64,
            trace_state: false,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ModelSection {
    /// Tenths of a watt needed per °C of error, before the divisor.
    pub thermal_mass_x10w_per_c: i32,
    /// Softens the feed-forward term so the integral dominates near target.
    pub divisor: i32,
}

impl Default for ModelSection {
    fn default() -> Self {
        Self {
            thermal_mass_x10w_per_c: 65,
            divisor: 4,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SafetySection {
    /// Absolute setpoint ceiling in °C.
    pub max_target_c: u32,
    /// Error and temperature-change threshold of the runaway detector (°C).
    pub runaway_threshold_c: u16,
    /// Seconds the tip may fail to move while heating hard before tripping.
    pub runaway_time_s: u32,
    /// Raw ADC readings within this many counts of 0x7FFF cut the heater.
    pub adc_saturation_margin: u16,
}

impl Default for SafetySection {
    fn default() -> Self {
        Self {
            max_target_c: 450,
            runaway_threshold_c: 10,
            runaway_time_s: 20,
            adc_saturation_margin: 32,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct KeepAwakeSection {
    /// Pulse floor in tenths of a watt; 0 disables keep-awake pulses.
    pub pulse_x10w: u16,
    /// Pulse period in units of 2.5 s.
    pub wait_multiplier: u16,
    /// Pulse length in units of 250 ms.
    pub duration_multiplier: u16,
}

impl Default for KeepAwakeSection {
    fn default() -> Self {
        Self {
            pulse_x10w: 0,
            wait_multiplier: 4,
            duration_multiplier: 1,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct PowerSection {
    /// User power limit in watts (0 = unlimited).
    pub limit_w: u16,
    /// Supply limit in watts as negotiated with the source (0 = unlimited).
    pub supply_limit_w: u16,
    /// Maximum increase per cycle in tenths of a watt (0 disables slew limiting).
    pub slew_limit_x10w: i32,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SimSection {
    pub ambient_c: i32,
    /// Highest temperature the simulated tip sensor reports.
    pub tip_max_c: u32,
    /// Heat capacity of tip and heater in mJ/°C.
    pub heat_capacity_mj_per_c: u32,
    /// Loss to ambient in mW per °C above ambient.
    pub loss_mw_per_c: u32,
    /// Heater ceiling in tenths of a watt.
    pub heater_max_x10w: i32,
    /// ADC counts per °C; 0x7FFF is full scale.
    pub counts_per_c: u32,
}

impl Default for SimSection {
    fn default() -> Self {
        Self {
            ambient_c: 25,
            tip_max_c: 500,
            heat_capacity_mj_per_c: 1690,
            loss_mw_per_c: 25,
            heater_max_x10w: 650,
            counts_per_c: 60,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub control: ControlSection,
    pub model: ModelSection,
    pub safety: SafetySection,
    pub keep_awake: KeepAwakeSection,
    pub power: PowerSection,
    pub sim: SimSection,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read, parse and validate a config file.
pub fn load_file(path: &std::path::Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {}: {}", path.display(), e))?;
    let cfg = load_toml(&text).map_err(|e| eyre::eyre!("parse config {}: {}", path.display(), e))?;
    cfg.validate()?;
    Ok(cfg)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Control
        if self.control.rate_hz == 0 {
            eyre::bail!("control.rate_hz must be > 0");
        }
        if self.control.rate_hz > 1000 {
            eyre::bail!("control.rate_hz must be <= 1000 (one cycle per tick)");
        }
        if self.control.sample_timeout_ticks == 0 {
            eyre::bail!("control.sample_timeout_ticks must be >= 1");
        }
        if self.control.preseed_reads > 1024 {
            eyre::bail!("control.preseed_reads is unreasonably large (>1024)");
        }

        // Model
        if self.model.thermal_mass_x10w_per_c <= 0 {
            eyre::bail!("model.thermal_mass_x10w_per_c must be > 0");
        }
        if self.model.divisor <= 0 {
            eyre::bail!("model.divisor must be > 0");
        }

        // Safety
        if self.safety.max_target_c == 0 || self.safety.max_target_c > 450 {
            eyre::bail!("safety.max_target_c must be in [1, 450]");
        }
        if self.safety.runaway_threshold_c == 0 {
            eyre::bail!("safety.runaway_threshold_c must be >= 1");
        }
        if self.safety.runaway_time_s == 0 {
            eyre::bail!("safety.runaway_time_s must be >= 1");
        }
        if self.safety.runaway_time_s > 10 * 60 {
            eyre::bail!("safety.runaway_time_s is unreasonably large (>10min)");
        }
        if self.safety.adc_saturation_margin > 0x7FFF {
            eyre::bail!("safety.adc_saturation_margin must be <= 32767");
        }

        // Keep-awake
        if self.keep_awake.pulse_x10w > 0 {
            if self.keep_awake.wait_multiplier == 0 {
                eyre::bail!("keep_awake.wait_multiplier must be >= 1 when pulses are enabled");
            }
            if self.keep_awake.duration_multiplier == 0 {
                eyre::bail!(
                    "keep_awake.duration_multiplier must be >= 1 when pulses are enabled"
                );
            }
        }

        // Power
        if self.power.slew_limit_x10w < 0 {
            eyre::bail!("power.slew_limit_x10w must be >= 0");
        }

        // Sim
        if self.sim.heat_capacity_mj_per_c == 0 {
            eyre::bail!("sim.heat_capacity_mj_per_c must be > 0");
        }
        if self.sim.counts_per_c == 0 {
            eyre::bail!("sim.counts_per_c must be > 0");
        }
        if self.sim.tip_max_c == 0 {
            eyre::bail!("sim.tip_max_c must be > 0");
        }
        if self.sim.heater_max_x10w <= 0 {
            eyre::bail!("sim.heater_max_x10w must be > 0");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let cfg = load_toml("").expect("parse empty");
        assert_eq!(cfg.control.rate_hz, 8);
        assert_eq!(cfg.control.sample_timeout_ticks, 2000);
        assert_eq!(cfg.safety.max_target_c, 450);
        assert_eq!(cfg.safety.adc_saturation_margin, 32);
        assert_eq!(cfg.control.integral, IntegralSource::ErrorHistory);
        cfg.validate().expect("defaults are valid");
    }

    #[test]
    fn integral_source_parses_snake_case() {
        let cfg = load_toml("[control]\nintegral = \"committed_power\"\n").expect("parse");
        assert_eq!(cfg.control.integral, IntegralSource::CommittedPower);
    }
}

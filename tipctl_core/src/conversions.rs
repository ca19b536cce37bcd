//! `From` implementations bridging `tipctl_config` types to `tipctl_core` types.

use tipctl_traits::TICKS_PER_SECOND;

use crate::config::{ControlCfg, KeepAwakeCfg, PowerCfg, SafetyCfg};
use crate::power::ThermalMassModel;

// ── ControlCfg ───────────────────────────────────────────────────────────────

impl From<&tipctl_config::ControlSection> for ControlCfg {
    fn from(c: &tipctl_config::ControlSection) -> Self {
        Self {
            rate_hz: c.rate_hz,
            sample_timeout: c.sample_timeout_ticks,
            integral: c.integral,
            preseed_reads: c.preseed_reads,
            trace_state: c.trace_state,
            ..Self::default()
        }
    }
}

// ── SafetyCfg ────────────────────────────────────────────────────────────────

impl From<&tipctl_config::SafetySection> for SafetyCfg {
    fn from(c: &tipctl_config::SafetySection) -> Self {
        Self {
            max_target_c: c.max_target_c,
            runaway_threshold_c: c.runaway_threshold_c,
            runaway_time: c.runaway_time_s.saturating_mul(TICKS_PER_SECOND),
            adc_saturation_margin: c.adc_saturation_margin,
        }
    }
}

// ── PowerCfg ─────────────────────────────────────────────────────────────────

impl From<&tipctl_config::PowerSection> for PowerCfg {
    fn from(c: &tipctl_config::PowerSection) -> Self {
        Self {
            slew_limit_x10w: (c.slew_limit_x10w > 0).then_some(c.slew_limit_x10w),
        }
    }
}

// ── KeepAwakeCfg ─────────────────────────────────────────────────────────────

impl From<&tipctl_config::KeepAwakeSection> for KeepAwakeCfg {
    fn from(c: &tipctl_config::KeepAwakeSection) -> Self {
        Self {
            pulse_x10w: c.pulse_x10w,
            wait_multiplier: c.wait_multiplier,
            duration_multiplier: c.duration_multiplier,
        }
    }
}

// ── ThermalMassModel ─────────────────────────────────────────────────────────

impl From<&tipctl_config::ModelSection> for ThermalMassModel {
    fn from(c: &tipctl_config::ModelSection) -> Self {
        Self {
            mass_x10w_per_c: c.thermal_mass_x10w_per_c,
            divisor: c.divisor,
        }
    }
}

//! Configuration types for the control task.
//!
//! These are the runtime configuration structs used by `ControlTask`.
//! They are separate from the TOML-deserialized config in `tipctl_config`.

use tipctl_traits::{Setting, Settings, Tick};

pub use tipctl_config::IntegralSource;

/// Loop timing and integral behaviour.
#[derive(Debug, Clone)]
pub struct ControlCfg {
    /// Control cycles per second; informational for the notifier pacing.
    pub rate_hz: u32,
    /// Bounded wait on the sample gate, in ticks.
    pub sample_timeout: Tick,
    /// Source of the integral (heat-loss) term.
    pub integral: IntegralSource,
    /// Filtered reads issued at start to settle the ADC filter.
    pub preseed_reads: u32,
    /// Ticks slept between preseed reads.
    pub preseed_spacing: Tick,
    /// Emit a `debug!` event with the full state on every committed cycle.
    pub trace_state: bool,
}

impl Default for ControlCfg {
    fn default() -> Self {
        Self {
            rate_hz: 8,
            sample_timeout: 2000,
            integral: IntegralSource::ErrorHistory,
            preseed_reads: 64,
            preseed_spacing: 2,
            trace_state: false,
        }
    }
}

/// Setpoint ceiling, runaway detection and ADC saturation cutoff.
#[derive(Debug, Clone)]
pub struct SafetyCfg {
    /// Setpoint ceiling in °C (never above `power::MAX_TARGET_C`).
    pub max_target_c: u32,
    /// Error above which the tip is expected to be heating, and the
    /// temperature move that counts as progress (°C).
    pub runaway_threshold_c: u16,
    /// Ticks the tip may stall while heating hard before runaway trips.
    pub runaway_time: Tick,
    /// Raw readings strictly above `0x7FFF - margin` cut the heater.
    pub adc_saturation_margin: u16,
}

impl Default for SafetyCfg {
    fn default() -> Self {
        Self {
            max_target_c: 450,
            runaway_threshold_c: 10,
            runaway_time: 20 * tipctl_traits::TICKS_PER_SECOND,
            adc_saturation_margin: 32,
        }
    }
}

/// Slew limiting of the committed power.
#[derive(Debug, Clone, Default)]
pub struct PowerCfg {
    /// Maximum increase per cycle in tenths of a watt; `None` disables the limiter.
    pub slew_limit_x10w: Option<i32>,
}

/// Seed values for a `MemorySettings`-style store.
#[derive(Debug, Clone, Default)]
pub struct KeepAwakeCfg {
    pub pulse_x10w: u16,
    pub wait_multiplier: u16,
    pub duration_multiplier: u16,
}

/// Settings store with every value at zero: no keep-awake pulse, no power limit.
#[derive(Debug, Clone, Copy, Default)]
pub struct FactorySettings;

impl Settings for FactorySettings {
    fn get(&self, _setting: Setting) -> u16 {
        0
    }
}

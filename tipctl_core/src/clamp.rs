//! Ordered safety clamps between the power calculator and the heater.
//!
//! Stage order is fixed: keep-awake floor, ADC saturation cutoff, runaway
//! cutoff, user power limit, supply limit, slew limiter. The cutoffs come
//! after the keep-awake floor so a pulse can never heat a saturated or
//! runaway tip, and the limits come after everything that can raise power.

use tipctl_traits::{TICKS_100MS, Tick};

use crate::util::watts_to_x10;

/// Full-scale raw ADC reading.
pub const ADC_FULL_SCALE: u16 = 0x7FFF;
/// Keep-awake pulse period unit (2.5 s).
pub const PULSE_WAIT_UNIT: Tick = 25 * TICKS_100MS;
/// Keep-awake pulse length unit (250 ms).
pub const PULSE_DURATION_UNIT: Tick = 5 * TICKS_100MS / 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClampStage {
    KeepAwake,
    AdcSaturation,
    Runaway,
    PowerLimit,
    SupplyLimit,
    Slew,
}

/// Everything the chain reads for one cycle, captured once.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClampInputs {
    pub now: Tick,
    pub raw_counts: u16,
    pub runaway: bool,
    /// Keep-awake pulse floor in tenths of a watt; 0 disables pulses.
    pub keep_awake_pulse_x10w: u16,
    pub pulse_wait_multiplier: u16,
    pub pulse_duration_multiplier: u16,
    /// User power limit in watts; 0 = unlimited.
    pub power_limit_w: u16,
    /// Supply limit in watts; 0 = unlimited.
    pub supply_limit_w: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClampOutcome {
    pub x10w: i32,
    /// Last stage that changed the value, if any.
    pub limited_by: Option<ClampStage>,
    pub adc_saturated: bool,
}

/// Keep-awake pulse window bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerPulse {
    pub last_start: Tick,
    pub last_end: Tick,
}

impl PowerPulse {
    /// No window open; the first pulse starts one wait period after `now`.
    pub fn new(now: Tick) -> Self {
        Self {
            last_start: now,
            last_end: now,
        }
    }

    /// Open a new window if the wait has elapsed and report whether `now`
    /// is inside the current one.
    pub fn active(&mut self, now: Tick, wait: Tick, duration: Tick) -> bool {
        if now.wrapping_sub(self.last_start) > wait {
            self.last_start = now;
            self.last_end = now.wrapping_add(duration);
        }
        now.wrapping_sub(self.last_start) < self.last_end.wrapping_sub(self.last_start)
    }
}

/// Caps the increase of committed power per cycle, then floors at 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlewLimiter {
    pub step_x10w: i32,
    pub last_x10w: i32,
}

impl SlewLimiter {
    pub fn new(step_x10w: i32) -> Self {
        Self {
            step_x10w,
            last_x10w: 0,
        }
    }

    pub fn limit(&mut self, x10w: i32) -> i32 {
        let mut out = x10w;
        if out.saturating_sub(self.last_x10w) > self.step_x10w {
            out = self.last_x10w.saturating_add(self.step_x10w);
        }
        let out = out.max(0);
        self.last_x10w = out;
        out
    }
}

#[derive(Debug, Clone)]
pub struct SafetyChain {
    adc_cutoff: u16,
    pulse: PowerPulse,
    slew: Option<SlewLimiter>,
}

impl SafetyChain {
    pub fn new(adc_saturation_margin: u16, slew_step_x10w: Option<i32>, now: Tick) -> Self {
        Self {
            adc_cutoff: ADC_FULL_SCALE.saturating_sub(adc_saturation_margin),
            pulse: PowerPulse::new(now),
            slew: slew_step_x10w.map(SlewLimiter::new),
        }
    }

    pub fn apply(&mut self, requested_x10w: i32, inp: &ClampInputs) -> ClampOutcome {
        let mut x = requested_x10w;
        let mut limited_by = None;
        let mut set = |x: &mut i32, v: i32, s: ClampStage| {
            if *x != v {
                *x = v;
                limited_by = Some(s);
            }
        };

        if inp.keep_awake_pulse_x10w > 0 {
            let wait = PULSE_WAIT_UNIT.saturating_mul(Tick::from(inp.pulse_wait_multiplier));
            let duration =
                PULSE_DURATION_UNIT.saturating_mul(Tick::from(inp.pulse_duration_multiplier));
            let floor = i32::from(inp.keep_awake_pulse_x10w);
            if self.pulse.active(inp.now, wait, duration) && x < floor {
                set(&mut x, floor, ClampStage::KeepAwake);
            }
        }

        let adc_saturated = inp.raw_counts > self.adc_cutoff;
        if adc_saturated {
            set(&mut x, 0, ClampStage::AdcSaturation);
        }

        if inp.runaway {
            set(&mut x, 0, ClampStage::Runaway);
        }

        if inp.power_limit_w > 0 {
            let capped = x.min(watts_to_x10(u32::from(inp.power_limit_w)));
            set(&mut x, capped, ClampStage::PowerLimit);
        }

        if inp.supply_limit_w > 0 {
            let capped = x.min(watts_to_x10(inp.supply_limit_w));
            set(&mut x, capped, ClampStage::SupplyLimit);
        }

        if let Some(slew) = self.slew.as_mut() {
            let limited = slew.limit(x);
            set(&mut x, limited, ClampStage::Slew);
        }

        ClampOutcome {
            x10w: x,
            limited_by,
            adc_saturated,
        }
    }

    pub fn pulse(&self) -> PowerPulse {
        self.pulse
    }

    pub fn slew(&self) -> Option<SlewLimiter> {
        self.slew
    }
}

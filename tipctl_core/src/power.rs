//! Requested heater power from tip temperature error.
//!
//! requested = feed-forward(error) + integral, in tenths of a watt.
//!
//! There is no derivative term: the thermocouple signal is too noisy for a
//! temperature slope to help, so sudden cooling is left to the feed-forward
//! term reacting to the larger error on the next cycle.

use tipctl_traits::PowerModel;

use crate::config::IntegralSource;
use crate::history::{ErrorHistory, RollingHistory, HISTORY_LEN};
use crate::util::saturate_i16;

/// Absolute setpoint ceiling in °C, whatever the configuration says.
pub const MAX_TARGET_C: u32 = 450;

/// Clamp a requested setpoint to the global ceiling and to what the tip can measure.
#[inline]
pub fn clamp_target(target_c: u32, max_target_c: u32, tip_max_c: u32) -> u32 {
    target_c.min(max_target_c.min(MAX_TARGET_C)).min(tip_max_c)
}

/// `target - current + 1`, saturated to `i16`.
///
/// The +1 aims about a degree above the setpoint, which keeps the displayed
/// temperature from flickering just below target.
#[inline]
pub fn temperature_error(target_c: u32, current_c: u32) -> i32 {
    i32::from(saturate_i16(
        i64::from(target_c) - i64::from(current_c) + 1,
    ))
}

/// Feed-forward model: power to lift the tip's thermal mass by the error
/// within one cycle, softened by `divisor` so the integral dominates near
/// the setpoint.
#[derive(Debug, Clone, Copy)]
pub struct ThermalMassModel {
    pub mass_x10w_per_c: i32,
    pub divisor: i32,
}

impl Default for ThermalMassModel {
    fn default() -> Self {
        Self {
            mass_x10w_per_c: 65,
            divisor: 4,
        }
    }
}

impl PowerModel for ThermalMassModel {
    fn error_to_x10_watts(&self, error_c: i32) -> i32 {
        error_c.saturating_mul(self.mass_x10w_per_c) / self.divisor.max(1)
    }
}

/// Breakdown of one power calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PowerDemand {
    /// Setpoint actually used (0 when the heater is off).
    pub target_c: u32,
    /// Error handed to the runaway detector (0 when off).
    pub error_c: i32,
    pub feed_forward_x10w: i32,
    pub integral_x10w: i32,
    pub requested_x10w: i32,
}

/// Owns the rolling histories behind the integral term.
#[derive(Debug, Clone)]
pub struct PowerCalculator {
    max_target_c: u32,
    integral: IntegralSource,
    errors: ErrorHistory,
    committed: RollingHistory<HISTORY_LEN>,
}

impl PowerCalculator {
    pub fn new(max_target_c: u32, integral: IntegralSource) -> Self {
        Self {
            max_target_c,
            integral,
            errors: ErrorHistory::new(),
            committed: RollingHistory::new(),
        }
    }

    /// Compute the requested power for this cycle and update the error history.
    ///
    /// A zero target requests zero power and leaves the history untouched.
    pub fn compute(
        &mut self,
        target_c: u32,
        current_c: u32,
        tip_max_c: u32,
        model: &dyn PowerModel,
    ) -> PowerDemand {
        if target_c == 0 {
            return PowerDemand::default();
        }
        let target_c = clamp_target(target_c, self.max_target_c, tip_max_c);
        let error_c = temperature_error(target_c, current_c);
        self.errors.update(error_c);

        let feed_forward_x10w = model.error_to_x10_watts(error_c);
        let integral_x10w = match self.integral {
            IntegralSource::ErrorHistory => self.errors.average(),
            IntegralSource::CommittedPower => self.committed.average(),
        };
        PowerDemand {
            target_c,
            error_c,
            feed_forward_x10w,
            integral_x10w,
            requested_x10w: feed_forward_x10w.saturating_add(integral_x10w),
        }
    }

    /// Record what actually reached the heater (after every clamp).
    pub fn record_committed(&mut self, x10w: i32) {
        self.committed.update(x10w);
    }

    pub fn error_history(&self) -> &ErrorHistory {
        &self.errors
    }
}

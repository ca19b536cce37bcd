//! Thermal runaway detection.
//!
//! While the controller is asking for a lot more heat (error above the
//! threshold) the tip must move by more than the threshold within the time
//! limit. If it stalls, the heater is assumed disconnected from the sensor
//! (tip off the thermocouple, broken tip, shorted sensor) and heating stops
//! for the rest of the task's life.

use tipctl_traits::Tick;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunawayState {
    #[default]
    Normal,
    Runaway,
}

/// Temperature and time the detector measures progress from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Baseline {
    pub temp_c: u16,
    pub since: Tick,
}

#[derive(Debug, Clone)]
pub struct RunawayDetector {
    threshold_c: u16,
    limit: Tick,
    baseline: Baseline,
    state: RunawayState,
}

impl RunawayDetector {
    /// Baseline starts at 0 °C stamped `now`, so the first heating cycle rebases.
    pub fn new(threshold_c: u16, limit: Tick, now: Tick) -> Self {
        Self {
            threshold_c,
            limit,
            baseline: Baseline {
                temp_c: 0,
                since: now,
            },
            state: RunawayState::Normal,
        }
    }

    /// Feed one `(temperature, error)` pair. Returns `true` only on the cycle
    /// that trips the detector.
    pub fn observe(&mut self, current_c: u32, error_c: i32, now: Tick) -> bool {
        let current = u16::try_from(current_c).unwrap_or(u16::MAX);
        if error_c > i32::from(self.threshold_c) {
            let delta = current.abs_diff(self.baseline.temp_c);
            if delta > self.threshold_c {
                self.rebase(current, now);
            } else if now.wrapping_sub(self.baseline.since) > self.limit
                && self.state == RunawayState::Normal
            {
                self.state = RunawayState::Runaway;
                return true;
            }
        } else {
            self.rebase(current, now);
        }
        false
    }

    fn rebase(&mut self, temp_c: u16, now: Tick) {
        self.baseline = Baseline { temp_c, since: now };
    }

    pub fn is_tripped(&self) -> bool {
        self.state == RunawayState::Runaway
    }

    pub fn state(&self) -> RunawayState {
        self.state
    }

    pub fn baseline(&self) -> Baseline {
        self.baseline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stall_while_heating_trips_once() {
        let mut d = RunawayDetector::new(10, 1000, 0);
        // First heating cycle: 20 °C is more than 10 away from the 0 baseline.
        assert!(!d.observe(20, 300, 0));
        assert!(!d.observe(22, 300, 500));
        assert!(!d.observe(22, 300, 1000));
        assert!(d.observe(22, 300, 1001));
        assert!(d.is_tripped());
        // Sticky, and reported once.
        assert!(!d.observe(22, 300, 5000));
        assert!(!d.observe(22, 0, 6000));
        assert_eq!(d.state(), RunawayState::Runaway);
    }

    #[test]
    fn small_error_keeps_rebasing() {
        let mut d = RunawayDetector::new(10, 1000, 0);
        for t in (0..10_000).step_by(100) {
            assert!(!d.observe(300, 5, t));
        }
        assert_eq!(d.baseline(), Baseline { temp_c: 300, since: 9_900 });
    }

    #[test]
    fn limit_is_measured_across_tick_wrap() {
        let start = u32::MAX - 100;
        let mut d = RunawayDetector::new(10, 1000, start);
        assert!(!d.observe(25, 300, start));
        assert!(!d.observe(25, 300, start.wrapping_add(1000)));
        assert!(d.observe(25, 300, start.wrapping_add(1001)));
    }
}

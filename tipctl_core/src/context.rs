//! Process-wide values shared between the control task and the rest of the
//! firmware: setpoint and supply limit written by the UI / power negotiation,
//! and the runaway flag written only by the control task.
//!
//! Each field has a single writer, so plain atomics are enough.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

#[derive(Debug, Default)]
pub struct ControlContext {
    target_c: AtomicU32,
    supply_limit_w: AtomicU32,
    thermal_runaway: AtomicBool,
}

impl ControlContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Setpoint in °C; 0 turns the heater off.
    pub fn set_target_c(&self, c: u32) {
        self.target_c.store(c, Ordering::Relaxed);
    }

    pub fn target_c(&self) -> u32 {
        self.target_c.load(Ordering::Relaxed)
    }

    /// Wattage the power source can deliver; 0 = unlimited.
    pub fn set_supply_limit_w(&self, w: u32) {
        self.supply_limit_w.store(w, Ordering::Relaxed);
    }

    pub fn supply_limit_w(&self) -> u32 {
        self.supply_limit_w.load(Ordering::Relaxed)
    }

    /// Sticky until the control task restarts.
    pub fn thermal_runaway(&self) -> bool {
        self.thermal_runaway.load(Ordering::Acquire)
    }

    pub(crate) fn latch_runaway(&self) {
        self.thermal_runaway.store(true, Ordering::Release);
    }

    pub(crate) fn clear_runaway(&self) {
        self.thermal_runaway.store(false, Ordering::Release);
    }
}

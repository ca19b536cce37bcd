//! Test and helper mocks for tipctl_core.
//!
//! Every mock is `Clone` with shared state, so a test can hand one copy to
//! the control task and keep another to steer or inspect it.

use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tipctl_traits::{Heater, TipSensor, Watchdog};

/// Tip sensor reporting whatever the test last set.
#[derive(Debug, Clone)]
pub struct FixedSensor {
    temp_c: Arc<AtomicU32>,
    raw: Arc<AtomicU16>,
    max_c: u32,
    reads: Arc<AtomicU64>,
}

impl FixedSensor {
    pub fn new(temp_c: u32, max_c: u32) -> Self {
        Self {
            temp_c: Arc::new(AtomicU32::new(temp_c)),
            raw: Arc::new(AtomicU16::new(0)),
            max_c,
            reads: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn set_temp_c(&self, c: u32) {
        self.temp_c.store(c, Ordering::Relaxed);
    }

    pub fn set_raw(&self, raw: u16) {
        self.raw.store(raw, Ordering::Relaxed);
    }

    /// Temperature reads so far (including start-up preseed reads).
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }
}

impl TipSensor for FixedSensor {
    fn tip_temp_c(&mut self, _filtered: bool) -> u32 {
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.temp_c.load(Ordering::Relaxed)
    }

    fn raw_counts(&mut self) -> u16 {
        self.raw.load(Ordering::Relaxed)
    }

    fn max_measurable_c(&self) -> u32 {
        self.max_c
    }
}

/// Heater that records every command; `off()` records 0.
#[derive(Debug, Clone, Default)]
pub struct RecordingHeater {
    commands: Arc<Mutex<Vec<i32>>>,
    failing: Arc<AtomicBool>,
}

impl RecordingHeater {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> Vec<i32> {
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last(&self) -> Option<i32> {
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .copied()
    }

    /// Make every following command fail with a driver fault.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }

    fn record(&self, x10w: i32) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.failing.load(Ordering::Relaxed) {
            return Err(Box::new(std::io::Error::other("heater driver fault")));
        }
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(x10w);
        Ok(())
    }
}

impl Heater for RecordingHeater {
    fn set_x10_watts(
        &mut self,
        x10_watts: i32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.record(x10_watts)
    }

    fn off(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.record(0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CountingWatchdog {
    resets: Arc<AtomicU64>,
}

impl CountingWatchdog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resets(&self) -> u64 {
        self.resets.load(Ordering::Relaxed)
    }
}

impl Watchdog for CountingWatchdog {
    fn reset(&mut self) {
        self.resets.fetch_add(1, Ordering::Relaxed);
    }
}

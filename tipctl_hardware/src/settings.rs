//! In-memory settings store.
//!
//! Stands in for persisted settings. Values are plain atomics so a UI thread
//! can change them while the control task reads them once per cycle.

use std::sync::atomic::{AtomicU16, Ordering};

use tipctl_traits::{Setting, Settings};

#[derive(Debug, Default)]
pub struct MemorySettings {
    keep_awake_pulse: AtomicU16,
    keep_awake_wait: AtomicU16,
    keep_awake_duration: AtomicU16,
    power_limit: AtomicU16,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, setting: Setting) -> &AtomicU16 {
        match setting {
            Setting::KeepAwakePulse => &self.keep_awake_pulse,
            Setting::KeepAwakePulseWait => &self.keep_awake_wait,
            Setting::KeepAwakePulseDuration => &self.keep_awake_duration,
            Setting::PowerLimit => &self.power_limit,
        }
    }

    pub fn set(&self, setting: Setting, value: u16) {
        tracing::debug!(?setting, value, "setting changed");
        self.slot(setting).store(value, Ordering::Relaxed);
    }

    /// Builder-style seeding.
    pub fn with(self, setting: Setting, value: u16) -> Self {
        self.slot(setting).store(value, Ordering::Relaxed);
        self
    }
}

impl Settings for MemorySettings {
    fn get(&self, setting: Setting) -> u16 {
        self.slot(setting).load(Ordering::Relaxed)
    }
}

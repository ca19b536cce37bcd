//! Seams between the tip temperature controller and the firmware around it.
//!
//! Everything the control task consumes from its collaborators (ADC, thermal
//! model, settings storage, heater driver, watchdog, tick source) is a trait
//! here, so the core stays hardware-agnostic and can run against simulations.
pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock, TICKS_100MS, TICKS_PER_SECOND, Tick};

/// Result of a bounded wait on the sample-ready notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleWait {
    /// A fresh temperature sample is available.
    Ready,
    /// Nothing arrived within the timeout.
    Timeout,
}

/// Blocks until the ADC reports new data or `timeout` ticks pass.
pub trait SampleGate {
    fn wait_for_sample(&mut self, timeout: Tick) -> SampleWait;
}

/// Tip temperature readings (already converted by the thermocouple model).
pub trait TipSensor {
    /// Tip temperature in °C, optionally through the ADC's own filter.
    fn tip_temp_c(&mut self, filtered: bool) -> u32;
    /// Unconverted ADC reading; full scale is `0x7FFF`.
    fn raw_counts(&mut self) -> u16;
    /// Highest temperature the fitted tip/sensor can still measure.
    fn max_measurable_c(&self) -> u32;
}

/// Feed-forward model: temperature error (°C) to power in tenths of a watt.
///
/// Must be monotonic with positive error giving more power; negative
/// results are allowed and pull power back during overshoot.
pub trait PowerModel {
    fn error_to_x10_watts(&self, error_c: i32) -> i32;
}

/// Persisted user settings the controller reads every cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Setting {
    /// Keep-awake pulse level in tenths of a watt (0 disables the pulse).
    KeepAwakePulse,
    /// Multiplier on the 2.5 s pulse wait unit.
    KeepAwakePulseWait,
    /// Multiplier on the 250 ms pulse duration unit.
    KeepAwakePulseDuration,
    /// Power limit in whole watts (0 = unlimited).
    PowerLimit,
}

pub trait Settings {
    fn get(&self, setting: Setting) -> u16;
}

pub trait Heater {
    fn set_x10_watts(&mut self, x10_watts: i32)
    -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn off(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

pub trait Watchdog {
    fn reset(&mut self);
}

impl<T: SampleGate + ?Sized> SampleGate for Box<T> {
    fn wait_for_sample(&mut self, timeout: Tick) -> SampleWait {
        (**self).wait_for_sample(timeout)
    }
}

impl<T: TipSensor + ?Sized> TipSensor for Box<T> {
    fn tip_temp_c(&mut self, filtered: bool) -> u32 {
        (**self).tip_temp_c(filtered)
    }
    fn raw_counts(&mut self) -> u16 {
        (**self).raw_counts()
    }
    fn max_measurable_c(&self) -> u32 {
        (**self).max_measurable_c()
    }
}

impl<T: Heater + ?Sized> Heater for Box<T> {
    fn set_x10_watts(
        &mut self,
        x10_watts: i32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).set_x10_watts(x10_watts)
    }
    fn off(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).off()
    }
}

impl<T: Watchdog + ?Sized> Watchdog for Box<T> {
    fn reset(&mut self) {
        (**self).reset();
    }
}

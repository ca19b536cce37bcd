#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core tip temperature control (hardware-agnostic).
//!
//! All hardware interactions go through the traits in `tipctl_traits`
//! (`SampleGate`, `TipSensor`, `PowerModel`, `Settings`, `Heater`,
//! `Watchdog`, `Clock`).
//!
//! ## Architecture
//!
//! - **Error filter**: fixed-window rolling history with running sum (`history`)
//! - **Power calculator**: feed-forward plus integral, target ceilings (`power`)
//! - **Runaway detector**: timed state machine, sticky trip (`runaway`)
//! - **Safety chain**: ordered clamps before the heater (`clamp`)
//! - **Control task**: one cycle gate → sensor → power → runaway → clamps →
//!   heater → watchdog (`controller`), built with `builder`
//! - **Host plumbing**: paced sample notifier (`sampler`) and loop (`runner`)
//!
//! ## Units
//!
//! Temperatures are whole °C, power is tenths of a watt in `i32`, time is
//! wrapping `u32` ticks (1 ms).

pub mod builder;
pub mod clamp;
pub mod config;
pub mod context;
pub mod controller;
pub mod conversions;
pub mod error;
pub mod history;
pub mod hw_error;
pub mod mocks;
pub mod power;
pub mod runaway;
pub mod runner;
pub mod sampler;
pub mod status;
pub mod util;

pub use builder::{BoxedControlTask, ControlTaskBuilder};
pub use clamp::{ClampInputs, ClampOutcome, ClampStage, SafetyChain};
pub use config::{ControlCfg, FactorySettings, IntegralSource, KeepAwakeCfg, PowerCfg, SafetyCfg};
pub use context::ControlContext;
pub use controller::ControlTask;
pub use error::{BuildError, ControlError, FaultKind, Result};
pub use history::{ErrorHistory, HISTORY_LEN, RollingHistory};
pub use power::{MAX_TARGET_C, PowerCalculator, PowerDemand, ThermalMassModel};
pub use runaway::{RunawayDetector, RunawayState};
pub use runner::{RunSummary, StopReason};
pub use status::{CycleOutcome, CycleReport};

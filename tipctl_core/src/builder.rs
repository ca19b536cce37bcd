//! Type-state builder for `ControlTask`.
//!
//! `build()` only exists once the gate, sensor, heater and watchdog are all
//! provided. `try_build()` is always available for dynamic checks.

use std::marker::PhantomData;
use std::sync::Arc;

use tipctl_traits::clock::{Clock, MonotonicClock};
use tipctl_traits::{Heater, PowerModel, SampleGate, Settings, TipSensor, Watchdog};

use crate::config::{ControlCfg, FactorySettings, PowerCfg, SafetyCfg};
use crate::context::ControlContext;
use crate::controller::ControlTask;
use crate::error::{BuildError, Result};
use crate::power::{MAX_TARGET_C, ThermalMassModel};

/// Control task with boxed collaborators, as produced by the builder.
pub type BoxedControlTask = ControlTask<
    Box<dyn SampleGate + Send>,
    Box<dyn TipSensor + Send>,
    Box<dyn Heater + Send>,
    Box<dyn Watchdog + Send>,
>;

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

#[derive(Default)]
struct Options {
    model: Option<Box<dyn PowerModel + Send + Sync>>,
    settings: Option<Arc<dyn Settings + Send + Sync>>,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
    context: Option<Arc<ControlContext>>,
    control: Option<ControlCfg>,
    safety: Option<SafetyCfg>,
    power: Option<PowerCfg>,
}

pub struct ControlTaskBuilder<G, S, H, W> {
    gate: Option<Box<dyn SampleGate + Send>>,
    sensor: Option<Box<dyn TipSensor + Send>>,
    heater: Option<Box<dyn Heater + Send>>,
    watchdog: Option<Box<dyn Watchdog + Send>>,
    opts: Options,
    _state: PhantomData<(G, S, H, W)>,
}

impl Default for ControlTaskBuilder<Missing, Missing, Missing, Missing> {
    fn default() -> Self {
        Self {
            gate: None,
            sensor: None,
            heater: None,
            watchdog: None,
            opts: Options::default(),
            _state: PhantomData,
        }
    }
}

impl BoxedControlTask {
    /// Start building a control task.
    pub fn builder() -> ControlTaskBuilder<Missing, Missing, Missing, Missing> {
        ControlTaskBuilder::default()
    }
}

fn validate(control: &ControlCfg, safety: &SafetyCfg, power: &PowerCfg) -> Result<()> {
    if control.rate_hz == 0 {
        return Err(BuildError::InvalidConfig("control.rate_hz must be > 0").into());
    }
    if control.sample_timeout == 0 {
        return Err(BuildError::InvalidConfig("control.sample_timeout must be >= 1").into());
    }
    if safety.max_target_c == 0 || safety.max_target_c > MAX_TARGET_C {
        return Err(BuildError::InvalidConfig("safety.max_target_c must be in [1, 450]").into());
    }
    if safety.runaway_threshold_c == 0 {
        return Err(BuildError::InvalidConfig("safety.runaway_threshold_c must be >= 1").into());
    }
    if safety.runaway_time == 0 {
        return Err(BuildError::InvalidConfig("safety.runaway_time must be >= 1").into());
    }
    if matches!(power.slew_limit_x10w, Some(step) if step <= 0) {
        return Err(BuildError::InvalidConfig("power.slew_limit_x10w must be > 0").into());
    }
    Ok(())
}

impl<G, S, H, W> ControlTaskBuilder<G, S, H, W> {
    /// Fallible build available in any type-state; returns detailed error for missing pieces.
    pub fn try_build(self) -> Result<BoxedControlTask> {
        let gate = self
            .gate
            .ok_or_else(|| eyre::Report::new(BuildError::MissingGate))?;
        let sensor = self
            .sensor
            .ok_or_else(|| eyre::Report::new(BuildError::MissingSensor))?;
        let heater = self
            .heater
            .ok_or_else(|| eyre::Report::new(BuildError::MissingHeater))?;
        let watchdog = self
            .watchdog
            .ok_or_else(|| eyre::Report::new(BuildError::MissingWatchdog))?;

        let opts = self.opts;
        let control = opts.control.unwrap_or_default();
        let safety = opts.safety.unwrap_or_default();
        let power = opts.power.unwrap_or_default();
        validate(&control, &safety, &power)?;

        Ok(ControlTask::assemble(
            gate,
            sensor,
            heater,
            watchdog,
            opts.model
                .unwrap_or_else(|| Box::new(ThermalMassModel::default())),
            opts.settings.unwrap_or_else(|| Arc::new(FactorySettings)),
            opts.clock.unwrap_or_else(|| Arc::new(MonotonicClock::new())),
            opts.context.unwrap_or_default(),
            control,
            safety,
            power,
        ))
    }

    fn retype<G2, S2, H2, W2>(self) -> ControlTaskBuilder<G2, S2, H2, W2> {
        ControlTaskBuilder {
            gate: self.gate,
            sensor: self.sensor,
            heater: self.heater,
            watchdog: self.watchdog,
            opts: self.opts,
            _state: PhantomData,
        }
    }
}

/// Chainable setters that do not affect type-state.
impl<G, S, H, W> ControlTaskBuilder<G, S, H, W> {
    pub fn with_control(mut self, control: ControlCfg) -> Self {
        self.opts.control = Some(control);
        self
    }
    pub fn with_safety(mut self, safety: SafetyCfg) -> Self {
        self.opts.safety = Some(safety);
        self
    }
    pub fn with_power(mut self, power: PowerCfg) -> Self {
        self.opts.power = Some(power);
        self
    }
    /// Feed-forward model; defaults to `ThermalMassModel::default()`.
    pub fn with_model(mut self, model: impl PowerModel + Send + Sync + 'static) -> Self {
        self.opts.model = Some(Box::new(model));
        self
    }
    /// Settings store; defaults to `FactorySettings` (everything 0).
    pub fn with_settings(mut self, settings: Arc<dyn Settings + Send + Sync>) -> Self {
        self.opts.settings = Some(settings);
        self
    }
    /// Provide a custom clock implementation; defaults to `MonotonicClock` when not provided.
    pub fn with_clock(mut self, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        self.opts.clock = Some(clock);
        self
    }
    /// Share a context with the rest of the process; a fresh one is created otherwise.
    pub fn with_context(mut self, ctx: Arc<ControlContext>) -> Self {
        self.opts.context = Some(ctx);
        self
    }
}

// Setters that advance type-state
impl<S, H, W> ControlTaskBuilder<Missing, S, H, W> {
    pub fn with_gate(
        mut self,
        gate: impl SampleGate + Send + 'static,
    ) -> ControlTaskBuilder<Set, S, H, W> {
        self.gate = Some(Box::new(gate));
        self.retype()
    }
}

impl<G, H, W> ControlTaskBuilder<G, Missing, H, W> {
    pub fn with_sensor(
        mut self,
        sensor: impl TipSensor + Send + 'static,
    ) -> ControlTaskBuilder<G, Set, H, W> {
        self.sensor = Some(Box::new(sensor));
        self.retype()
    }
}

impl<G, S, W> ControlTaskBuilder<G, S, Missing, W> {
    pub fn with_heater(
        mut self,
        heater: impl Heater + Send + 'static,
    ) -> ControlTaskBuilder<G, S, Set, W> {
        self.heater = Some(Box::new(heater));
        self.retype()
    }
}

impl<G, S, H> ControlTaskBuilder<G, S, H, Missing> {
    pub fn with_watchdog(
        mut self,
        watchdog: impl Watchdog + Send + 'static,
    ) -> ControlTaskBuilder<G, S, H, Set> {
        self.watchdog = Some(Box::new(watchdog));
        self.retype()
    }
}

impl ControlTaskBuilder<Set, Set, Set, Set> {
    /// Validate and build. Only available once every collaborator is set.
    pub fn build(self) -> Result<BoxedControlTask> {
        self.try_build()
    }
}

//! The control task (`ControlTask`).
//!
//! One cycle: wait for a sample, read the tip, compute the requested power,
//! feed the runaway detector, run the safety chain, commit to the heater and
//! only then service the watchdog.

use std::sync::Arc;

use tipctl_traits::clock::Clock;
use tipctl_traits::{
    Heater, PowerModel, SampleGate, SampleWait, Setting, Settings, TipSensor, Watchdog,
};

use crate::clamp::{ClampInputs, SafetyChain};
use crate::config::{ControlCfg, PowerCfg, SafetyCfg};
use crate::context::ControlContext;
use crate::error::{ControlError, FaultKind, Result};
use crate::hw_error::map_hw_error;
use crate::power::PowerCalculator;
use crate::runaway::RunawayDetector;
use crate::status::{CycleOutcome, CycleReport};

/// The tip temperature control task, generic over its hardware collaborators.
pub struct ControlTask<G, S, H, W> {
    pub(crate) gate: G,
    pub(crate) sensor: S,
    pub(crate) heater: H,
    pub(crate) watchdog: W,
    pub(crate) model: Box<dyn PowerModel + Send + Sync>,
    pub(crate) settings: Arc<dyn Settings + Send + Sync>,
    pub(crate) clock: Arc<dyn Clock + Send + Sync>,
    pub(crate) ctx: Arc<ControlContext>,
    pub(crate) control: ControlCfg,
    pub(crate) safety: SafetyCfg,
    pub(crate) power: PowerCfg,

    pub(crate) calc: PowerCalculator,
    pub(crate) runaway: RunawayDetector,
    pub(crate) chain: SafetyChain,
    pub(crate) adc_saturated: bool,
    pub(crate) started: bool,
}

impl<G, S, H, W> core::fmt::Debug for ControlTask<G, S, H, W> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ControlTask")
            .field("target_c", &self.ctx.target_c())
            .field("runaway", &self.runaway.state())
            .field("started", &self.started)
            .finish_non_exhaustive()
    }
}

impl<G, S, H, W> ControlTask<G, S, H, W>
where
    G: SampleGate,
    S: TipSensor,
    H: Heater,
    W: Watchdog,
{
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn assemble(
        gate: G,
        sensor: S,
        heater: H,
        watchdog: W,
        model: Box<dyn PowerModel + Send + Sync>,
        settings: Arc<dyn Settings + Send + Sync>,
        clock: Arc<dyn Clock + Send + Sync>,
        ctx: Arc<ControlContext>,
        control: ControlCfg,
        safety: SafetyCfg,
        power: PowerCfg,
    ) -> Self {
        let now = clock.now();
        Self {
            calc: PowerCalculator::new(safety.max_target_c, control.integral),
            runaway: RunawayDetector::new(safety.runaway_threshold_c, safety.runaway_time, now),
            chain: SafetyChain::new(safety.adc_saturation_margin, power.slew_limit_x10w, now),
            gate,
            sensor,
            heater,
            watchdog,
            model,
            settings,
            clock,
            ctx,
            control,
            safety,
            power,
            adc_saturated: false,
            started: false,
        }
    }

    pub fn context(&self) -> &Arc<ControlContext> {
        &self.ctx
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn runaway(&self) -> &RunawayDetector {
        &self.runaway
    }

    pub fn calculator(&self) -> &PowerCalculator {
        &self.calc
    }

    pub fn chain(&self) -> &SafetyChain {
        &self.chain
    }

    /// Task entry: heater off, target 0, runaway cleared, fresh state, then
    /// warm the ADC filter with spaced reads.
    pub fn start(&mut self) -> Result<()> {
        self.heater
            .off()
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))?;
        self.ctx.set_target_c(0);
        self.ctx.clear_runaway();

        let now = self.clock.now();
        self.calc = PowerCalculator::new(self.safety.max_target_c, self.control.integral);
        self.runaway = RunawayDetector::new(
            self.safety.runaway_threshold_c,
            self.safety.runaway_time,
            now,
        );
        self.chain = SafetyChain::new(
            self.safety.adc_saturation_margin,
            self.power.slew_limit_x10w,
            now,
        );
        self.adc_saturated = false;

        for _ in 0..self.control.preseed_reads {
            self.clock.sleep(self.control.preseed_spacing);
            let _ = self.sensor.tip_temp_c(true);
        }
        self.started = true;
        tracing::info!(
            preseed_reads = self.control.preseed_reads,
            integral = ?self.control.integral,
            slew = ?self.power.slew_limit_x10w,
            "control task started"
        );
        Ok(())
    }

    /// Turn the heater off (best-effort callers log the error).
    pub fn heater_off(&mut self) -> Result<()> {
        self.heater
            .off()
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
    }

    /// One control cycle.
    ///
    /// A sample timeout commands the heater off and leaves every piece of
    /// controller state untouched; the watchdog is not serviced. A failed
    /// heater commit is returned as an error, also without a watchdog reset.
    pub fn cycle(&mut self) -> Result<CycleOutcome> {
        if self.gate.wait_for_sample(self.control.sample_timeout) == SampleWait::Timeout {
            tracing::warn!(
                timeout_ticks = self.control.sample_timeout,
                "no tip sample before timeout; heater off"
            );
            self.heater
                .off()
                .map_err(|e| eyre::Report::new(map_hw_error(&*e)))?;
            return Ok(CycleOutcome::SampleTimeout);
        }

        let target_c = self.ctx.target_c();
        let temp_c = self.sensor.tip_temp_c(true);
        let tip_max_c = self.sensor.max_measurable_c();
        let now = self.clock.now();

        let demand = self
            .calc
            .compute(target_c, temp_c, tip_max_c, self.model.as_ref());

        let tripped = self.runaway.observe(temp_c, demand.error_c, now);
        if tripped {
            self.ctx.latch_runaway();
            let baseline = self.runaway.baseline();
            tracing::error!(
                temp_c,
                target_c = demand.target_c,
                error_c = demand.error_c,
                baseline_c = baseline.temp_c,
                stalled_ticks = now.wrapping_sub(baseline.since),
                fault = %ControlError::Fault(FaultKind::ThermalRunaway),
                "tip not heating; heater disabled until restart"
            );
        }

        let inputs = ClampInputs {
            now,
            raw_counts: self.sensor.raw_counts(),
            runaway: self.ctx.thermal_runaway(),
            keep_awake_pulse_x10w: self.settings.get(Setting::KeepAwakePulse),
            pulse_wait_multiplier: self.settings.get(Setting::KeepAwakePulseWait),
            pulse_duration_multiplier: self.settings.get(Setting::KeepAwakePulseDuration),
            power_limit_w: self.settings.get(Setting::PowerLimit),
            supply_limit_w: self.ctx.supply_limit_w(),
        };
        let clamped = self.chain.apply(demand.requested_x10w, &inputs);

        if clamped.adc_saturated != self.adc_saturated {
            self.adc_saturated = clamped.adc_saturated;
            if clamped.adc_saturated {
                tracing::warn!(raw = inputs.raw_counts, "tip ADC saturated; heater cut");
            } else {
                tracing::info!(raw = inputs.raw_counts, "tip ADC back in range");
            }
        }

        if let Err(e) = self.heater.set_x10_watts(clamped.x10w) {
            let err = map_hw_error(&*e);
            tracing::warn!(error = %err, x10w = clamped.x10w, "heater commit failed");
            return Err(eyre::Report::new(err));
        }
        self.calc.record_committed(clamped.x10w);

        if self.control.trace_state {
            tracing::debug!(
                temp_c,
                target_c = demand.target_c,
                error_c = demand.error_c,
                feed_forward_x10w = demand.feed_forward_x10w,
                integral_x10w = demand.integral_x10w,
                requested_x10w = demand.requested_x10w,
                committed_x10w = clamped.x10w,
                limited_by = ?clamped.limited_by,
                "cycle"
            );
        }

        self.watchdog.reset();

        Ok(CycleOutcome::Committed(CycleReport {
            temp_c,
            demand,
            committed_x10w: clamped.x10w,
            limited_by: clamped.limited_by,
            runaway: inputs.runaway,
            runaway_tripped: tripped,
        }))
    }
}

impl<G, S, H, W> ControlTask<G, S, H, W> {
    /// Whether the last committed cycle was cut by ADC saturation.
    pub fn adc_saturated(&self) -> bool {
        self.adc_saturated
    }
}

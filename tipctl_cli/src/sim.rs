//! Simulation assembly: config mapping, simulated iron, and the control run.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use tipctl_config::Config;
use tipctl_core::error::Result as CoreResult;
use tipctl_core::sampler::{PacedNotifier, notification_channel};
use tipctl_core::util::period_ticks;
use tipctl_core::{
    BoxedControlTask, ControlCfg, ControlContext, CycleOutcome, KeepAwakeCfg, PowerCfg,
    RunSummary, SafetyCfg, ThermalMassModel, runner,
};
use tipctl_hardware::{IronPlant, MemorySettings, PlantParams, SimWatchdog, SimulatedAdcGate};
use tipctl_traits::clock::{Clock, ManualClock, MonotonicClock, TICKS_PER_SECOND, Tick};
use tipctl_traits::{SampleGate, Setting};

/// Ticks the simulated watchdog tolerates between resets.
const WATCHDOG_TIMEOUT: Tick = 3 * TICKS_PER_SECOND;

#[derive(Debug, Clone, Default)]
pub struct SimOptions {
    pub target_c: u32,
    pub seconds: u32,
    pub realtime: bool,
    pub supply_limit_w: Option<u32>,
    pub disconnect_heater_at_s: Option<u32>,
    pub saturate_adc: bool,
    pub drop_samples: u32,
    pub trace_state: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct SimReport {
    pub target_c: u32,
    pub summary: RunSummary,
    pub watchdog_resets: u64,
    pub heater_disconnected: bool,
}

pub fn plant_params(s: &tipctl_config::SimSection) -> PlantParams {
    PlantParams {
        ambient_c: s.ambient_c,
        tip_max_c: s.tip_max_c,
        heat_capacity_mj_per_c: s.heat_capacity_mj_per_c,
        loss_mw_per_c: s.loss_mw_per_c,
        heater_max_x10w: s.heater_max_x10w,
        counts_per_c: s.counts_per_c,
    }
}

/// Settings store seeded from `[keep_awake]` and `[power]`.
pub fn seed_settings(cfg: &Config) -> MemorySettings {
    let ka = KeepAwakeCfg::from(&cfg.keep_awake);
    MemorySettings::new()
        .with(Setting::KeepAwakePulse, ka.pulse_x10w)
        .with(Setting::KeepAwakePulseWait, ka.wait_multiplier)
        .with(Setting::KeepAwakePulseDuration, ka.duration_multiplier)
        .with(Setting::PowerLimit, cfg.power.limit_w)
}

pub fn run_simulation(cfg: &Config, opts: &SimOptions, shutdown: &AtomicBool) -> CoreResult<SimReport> {
    // Builder/config mapping via From impls in tipctl_core::conversions
    let mut control: ControlCfg = (&cfg.control).into();
    control.trace_state |= opts.trace_state;
    let safety: SafetyCfg = (&cfg.safety).into();
    let power: PowerCfg = (&cfg.power).into();
    let rate_hz = control.rate_hz;
    let cycles = u64::from(opts.seconds) * u64::from(rate_hz);

    // Real time: wall clock plus a paced notifier thread. Otherwise a manual
    // clock that the gate advances one conversion period per wait.
    let mut paced: Option<PacedNotifier> = None;
    let (clock, gate): (Arc<dyn Clock + Send + Sync>, Box<dyn SampleGate + Send>) =
        if opts.realtime {
            let clock = MonotonicClock::new();
            let (notifier, gate) = notification_channel();
            let p = PacedNotifier::spawn(notifier, rate_hz, clock);
            if opts.drop_samples > 0 {
                p.pause();
            }
            paced = Some(p);
            (Arc::new(clock), Box::new(gate))
        } else {
            let clock = ManualClock::new();
            let gate = SimulatedAdcGate::new(clock.clone(), period_ticks(rate_hz));
            gate.drop_next(opts.drop_samples);
            (Arc::new(clock), Box::new(gate))
        };

    let plant = IronPlant::new(plant_params(&cfg.sim), clock.clone());
    plant.set_adc_saturated(opts.saturate_adc);
    let watchdog = SimWatchdog::new(clock.clone(), WATCHDOG_TIMEOUT);
    let ctx = Arc::new(ControlContext::new());

    let mut task = BoxedControlTask::builder()
        .with_gate(gate)
        .with_sensor(plant.sensor())
        .with_heater(plant.heater())
        .with_watchdog(watchdog.clone())
        .with_model(ThermalMassModel::from(&cfg.model))
        .with_settings(Arc::new(seed_settings(cfg)))
        .with_clock(clock.clone())
        .with_context(ctx.clone())
        .with_control(control)
        .with_safety(safety)
        .with_power(power)
        .build()?;
    task.start()?;
    ctx.set_target_c(opts.target_c);
    ctx.set_supply_limit_w(
        opts.supply_limit_w
            .unwrap_or(u32::from(cfg.power.supply_limit_w)),
    );
    tracing::info!(
        target_c = opts.target_c,
        seconds = opts.seconds,
        realtime = opts.realtime,
        "simulation start"
    );

    let start = clock.now();
    let disconnect_after = opts
        .disconnect_heater_at_s
        .map(|s| s.saturating_mul(TICKS_PER_SECOND));
    let mut disconnected = false;
    let mut timeouts = 0u32;
    let report_every = u64::from(rate_hz.max(1));

    let summary = runner::run_with(&mut task, shutdown, Some(cycles), |n, outcome| {
        let elapsed = clock.ticks_since(start);
        if !disconnected && disconnect_after.is_some_and(|at| elapsed >= at) {
            plant.disconnect_heater();
            disconnected = true;
            tracing::warn!(elapsed_ticks = elapsed, "heater disconnected from tip");
        }
        match outcome {
            CycleOutcome::SampleTimeout => {
                timeouts += 1;
                if timeouts >= opts.drop_samples
                    && let Some(p) = paced.as_ref()
                {
                    p.resume();
                }
            }
            CycleOutcome::Committed(r) if n % report_every == 0 => {
                tracing::info!(
                    t_s = elapsed / TICKS_PER_SECOND,
                    temp_c = r.temp_c,
                    committed_x10w = r.committed_x10w,
                    "progress"
                );
            }
            CycleOutcome::Committed(_) => {}
        }
    })?;
    drop(paced);

    Ok(SimReport {
        target_c: opts.target_c,
        summary,
        watchdog_resets: watchdog.resets(),
        heater_disconnected: disconnected,
    })
}

/// Run one simulated second with the heater off and check the loop services
/// the watchdog every cycle.
pub fn self_check(cfg: &Config) -> CoreResult<()> {
    let opts = SimOptions {
        target_c: 0,
        seconds: 1,
        ..SimOptions::default()
    };
    let report = run_simulation(cfg, &opts, &AtomicBool::new(false))?;
    let s = report.summary;
    if s.committed == 0 || s.timeouts > 0 {
        eyre::bail!(
            "self-check: control loop did not commit every cycle ({} of {})",
            s.committed,
            s.cycles
        );
    }
    if report.watchdog_resets != s.committed {
        eyre::bail!(
            "self-check: watchdog serviced {} times for {} commits",
            report.watchdog_resets,
            s.committed
        );
    }
    if s.runaway || s.last_committed_x10w != 0 {
        eyre::bail!("self-check: heater powered with a zero setpoint");
    }
    Ok(())
}

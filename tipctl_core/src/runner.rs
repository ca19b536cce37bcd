//! Host-side loop around `ControlTask::cycle`.
//!
//! Firmware runs the task forever; on a host the loop also ends on a stop
//! flag or a cycle budget so simulations and tests terminate.

use std::sync::atomic::{AtomicBool, Ordering};

use tipctl_traits::{Heater, SampleGate, TipSensor, Watchdog};

use crate::controller::ControlTask;
use crate::error::Result;
use crate::status::CycleOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The shutdown flag was raised.
    Shutdown,
    /// `max_cycles` passes completed.
    CycleBudget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Passes through the gate (committed + timed out).
    pub cycles: u64,
    pub committed: u64,
    pub timeouts: u64,
    /// Tip temperature of the last committed cycle.
    pub final_temp_c: Option<u32>,
    pub peak_temp_c: u32,
    pub last_committed_x10w: i32,
    pub runaway: bool,
    pub stopped: StopReason,
}

/// Run until `shutdown` is raised or `max_cycles` passes complete.
pub fn run<G, S, H, W>(
    task: &mut ControlTask<G, S, H, W>,
    shutdown: &AtomicBool,
    max_cycles: Option<u64>,
) -> Result<RunSummary>
where
    G: SampleGate,
    S: TipSensor,
    H: Heater,
    W: Watchdog,
{
    run_with(task, shutdown, max_cycles, |_, _| {})
}

/// Like `run`, calling `observe(cycle_index, outcome)` after every pass.
///
/// Starts the task first if needed. On shutdown or error the heater is
/// commanded off (best-effort); errors are returned to the caller.
pub fn run_with<G, S, H, W, F>(
    task: &mut ControlTask<G, S, H, W>,
    shutdown: &AtomicBool,
    max_cycles: Option<u64>,
    mut observe: F,
) -> Result<RunSummary>
where
    G: SampleGate,
    S: TipSensor,
    H: Heater,
    W: Watchdog,
    F: FnMut(u64, &CycleOutcome),
{
    if !task.is_started() {
        task.start()?;
    }

    let mut summary = RunSummary {
        cycles: 0,
        committed: 0,
        timeouts: 0,
        final_temp_c: None,
        peak_temp_c: 0,
        last_committed_x10w: 0,
        runaway: false,
        stopped: StopReason::Shutdown,
    };

    loop {
        if shutdown.load(Ordering::Relaxed) {
            summary.stopped = StopReason::Shutdown;
            break;
        }
        if max_cycles.is_some_and(|max| summary.cycles >= max) {
            summary.stopped = StopReason::CycleBudget;
            break;
        }

        let outcome = match task.cycle() {
            Ok(o) => o,
            Err(e) => {
                if let Err(off_err) = task.heater_off() {
                    tracing::warn!(error = %off_err, "heater off failed after cycle error");
                }
                return Err(e);
            }
        };

        match &outcome {
            CycleOutcome::Committed(report) => {
                summary.committed += 1;
                summary.final_temp_c = Some(report.temp_c);
                summary.peak_temp_c = summary.peak_temp_c.max(report.temp_c);
                summary.last_committed_x10w = report.committed_x10w;
            }
            CycleOutcome::SampleTimeout => summary.timeouts += 1,
        }
        observe(summary.cycles, &outcome);
        summary.cycles += 1;
    }

    if let Err(e) = task.heater_off() {
        tracing::warn!(error = %e, "heater off failed at stop");
    }
    summary.runaway = task.context().thermal_runaway();
    tracing::info!(
        cycles = summary.cycles,
        timeouts = summary.timeouts,
        final_temp_c = ?summary.final_temp_c,
        runaway = summary.runaway,
        stopped = ?summary.stopped,
        "control loop stopped"
    );
    Ok(summary)
}

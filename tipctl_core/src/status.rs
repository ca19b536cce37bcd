//! Result of one control cycle.

use crate::clamp::ClampStage;
use crate::power::PowerDemand;

/// What one pass through the control task did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A sample arrived and power was committed to the heater.
    Committed(CycleReport),
    /// No sample within the timeout; the heater was commanded off.
    SampleTimeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub temp_c: u32,
    pub demand: PowerDemand,
    pub committed_x10w: i32,
    pub limited_by: Option<ClampStage>,
    pub runaway: bool,
    /// Set on the one cycle where the runaway detector tripped.
    pub runaway_tripped: bool,
}

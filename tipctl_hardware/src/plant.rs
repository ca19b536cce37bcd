//! First-order thermal model of a soldering tip.
//!
//! One shared `IronPlant` state backs the sensor and heater handles; time
//! advances lazily from the injected clock whenever either handle is used.
//! Faults can be injected at runtime through the plant handle.

use std::sync::{Arc, Mutex, MutexGuard};

use tipctl_traits::clock::{Clock, TICKS_PER_SECOND, Tick};
use tipctl_traits::{Heater, TipSensor};

use crate::error::HwError;

/// ADC full scale.
pub const ADC_FULL_SCALE: u16 = 0x7FFF;

/// Physical parameters of the simulated iron.
#[derive(Debug, Clone)]
pub struct PlantParams {
    pub ambient_c: i32,
    /// Highest temperature the tip sensor reports.
    pub tip_max_c: u32,
    pub heat_capacity_mj_per_c: u32,
    pub loss_mw_per_c: u32,
    pub heater_max_x10w: i32,
    pub counts_per_c: u32,
}

impl Default for PlantParams {
    fn default() -> Self {
        Self {
            ambient_c: 25,
            tip_max_c: 500,
            heat_capacity_mj_per_c: 1690,
            loss_mw_per_c: 25,
            heater_max_x10w: 650,
            counts_per_c: 60,
        }
    }
}

#[derive(Debug)]
struct PlantState {
    temp_c: f32,
    heater_x10w: i32,
    last_update: Tick,
    heater_disconnected: bool,
    adc_saturated: bool,
    driver_failing: bool,
    commits: u64,
}

/// Shared simulated iron: hand out `sensor()` and `heater()` to the controller,
/// keep the plant to inspect state and inject faults.
#[derive(Clone)]
pub struct IronPlant {
    params: Arc<PlantParams>,
    state: Arc<Mutex<PlantState>>,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl core::fmt::Debug for IronPlant {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IronPlant")
            .field("params", &self.params)
            .field("temp_c", &self.temp_c())
            .finish()
    }
}

impl IronPlant {
    pub fn new(params: PlantParams, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        let now = clock.now();
        let ambient = params.ambient_c as f32;
        Self {
            params: Arc::new(params),
            state: Arc::new(Mutex::new(PlantState {
                temp_c: ambient,
                heater_x10w: 0,
                last_update: now,
                heater_disconnected: false,
                adc_saturated: false,
                driver_failing: false,
                commits: 0,
            })),
            clock,
        }
    }

    pub fn sensor(&self) -> SimTipSensor {
        SimTipSensor {
            plant: self.clone(),
        }
    }

    pub fn heater(&self) -> SimHeater {
        SimHeater {
            plant: self.clone(),
        }
    }

    pub fn params(&self) -> &PlantParams {
        &self.params
    }

    /// Current tip temperature (advances the model first).
    pub fn temp_c(&self) -> f32 {
        self.advanced().temp_c
    }

    /// Power the heater is currently driven at, in tenths of a watt.
    pub fn heater_x10w(&self) -> i32 {
        self.lock().heater_x10w
    }

    /// Number of successful heater commits (including `off`).
    pub fn commits(&self) -> u64 {
        self.lock().commits
    }

    /// Heater element open circuit: commands are accepted but produce no heat.
    pub fn disconnect_heater(&self) {
        tracing::warn!("sim: heater element disconnected");
        self.advanced().heater_disconnected = true;
    }

    /// Pin the ADC at full scale (e.g. open thermocouple).
    pub fn set_adc_saturated(&self, saturated: bool) {
        tracing::warn!(saturated, "sim: adc saturation changed");
        self.advanced().adc_saturated = saturated;
    }

    /// Make every heater command fail at the driver level.
    pub fn set_driver_failing(&self, failing: bool) {
        tracing::warn!(failing, "sim: heater driver failure changed");
        self.lock().driver_failing = failing;
    }

    /// Force the tip temperature (tests and scenario setup).
    pub fn set_temp_c(&self, temp_c: f32) {
        self.advanced().temp_c = temp_c;
    }

    fn lock(&self) -> MutexGuard<'_, PlantState> {
        // A panic while holding the lock leaves plain numeric state behind.
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Integrate the model up to now and return the locked state.
    fn advanced(&self) -> MutexGuard<'_, PlantState> {
        let now = self.clock.now();
        let mut st = self.lock();
        let dt_ticks = now.wrapping_sub(st.last_update);
        st.last_update = now;
        if dt_ticks == 0 {
            return st;
        }
        let p = &self.params;
        let dt_s = dt_ticks as f32 / TICKS_PER_SECOND as f32;
        let heat_w = if st.heater_disconnected {
            0.0
        } else {
            st.heater_x10w as f32 / 10.0
        };
        let loss_w = (p.loss_mw_per_c as f32 / 1000.0) * (st.temp_c - p.ambient_c as f32);
        let capacity_j_per_c = p.heat_capacity_mj_per_c as f32 / 1000.0;
        st.temp_c += (heat_w - loss_w) * dt_s / capacity_j_per_c;
        if st.temp_c < p.ambient_c as f32 {
            st.temp_c = p.ambient_c as f32;
        }
        st
    }
}

/// Tip sensor view of the plant.
#[derive(Debug, Clone)]
pub struct SimTipSensor {
    plant: IronPlant,
}

impl TipSensor for SimTipSensor {
    fn tip_temp_c(&mut self, _filtered: bool) -> u32 {
        let t = self.plant.temp_c().round().max(0.0) as u32;
        t.min(self.max_measurable_c())
    }

    fn raw_counts(&mut self) -> u16 {
        let st = self.plant.advanced();
        if st.adc_saturated {
            return ADC_FULL_SCALE;
        }
        let counts = st.temp_c.max(0.0) * self.plant.params.counts_per_c as f32;
        counts.min(f32::from(ADC_FULL_SCALE)) as u16
    }

    fn max_measurable_c(&self) -> u32 {
        let adc_limit = u32::from(ADC_FULL_SCALE) / self.plant.params.counts_per_c.max(1);
        self.plant.params.tip_max_c.min(adc_limit)
    }
}

/// Heater driver view of the plant. Power is clamped to the element's rating.
#[derive(Debug, Clone)]
pub struct SimHeater {
    plant: IronPlant,
}

impl SimHeater {
    fn drive(&mut self, x10_watts: i32) -> crate::error::Result<()> {
        let max = self.plant.params.heater_max_x10w;
        let mut st = self.plant.advanced();
        if st.driver_failing {
            return Err(HwError::Driver("gate driver not responding".into()));
        }
        st.heater_x10w = x10_watts.clamp(0, max);
        st.commits += 1;
        Ok(())
    }
}

impl Heater for SimHeater {
    fn set_x10_watts(
        &mut self,
        x10_watts: i32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.drive(x10_watts).map_err(Into::into)
    }

    fn off(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.drive(0).map_err(Into::into)
    }
}

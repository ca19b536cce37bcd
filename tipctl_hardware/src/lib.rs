//! Simulated collaborators for the tip controller: a thermal plant with
//! sensor and heater views, an ADC notification gate, a watchdog and an
//! in-memory settings store.
pub mod error;
pub mod gate;
pub mod plant;
pub mod settings;
pub mod watchdog;

pub use gate::SimulatedAdcGate;
pub use plant::{ADC_FULL_SCALE, IronPlant, PlantParams, SimHeater, SimTipSensor};
pub use settings::MemorySettings;
pub use watchdog::SimWatchdog;

use thiserror::Error;

/// Sticky faults that end a heating session.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    #[error("thermal runaway")]
    ThermalRunaway,
}

#[derive(Debug, Error, Clone)]
pub enum ControlError {
    #[error("heater error: {0}")]
    Heater(String),
    #[error("heater fault: {0}")]
    HeaterFault(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("fault: {0}")]
    Fault(FaultKind),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing sample gate")]
    MissingGate,
    #[error("missing tip sensor")]
    MissingSensor,
    #[error("missing heater")]
    MissingHeater,
    #[error("missing watchdog")]
    MissingWatchdog,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;

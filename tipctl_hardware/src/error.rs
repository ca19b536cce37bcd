use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("heater driver fault: {0}")]
    Driver(String),
    #[error("pwm timer stopped")]
    TimerStopped,
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;

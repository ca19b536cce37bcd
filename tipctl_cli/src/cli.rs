//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(
    name = "tipctl",
    version,
    about = "Soldering tip temperature controller (simulation host)"
)]
pub struct Cli {
    /// Path to config TOML; built-in defaults when omitted
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log and report as JSON lines instead of pretty text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); overrides [logging] level
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Heat the simulated tip to a setpoint and report how the controller behaved
    Simulate {
        /// Setpoint in °C (0 keeps the heater off)
        #[arg(long, value_name = "C")]
        target_c: u32,
        /// Simulated duration in seconds
        #[arg(long, value_name = "S", default_value_t = 30)]
        seconds: u32,
        /// Pace cycles with the wall clock instead of running as fast as possible
        #[arg(long, action = ArgAction::SetTrue)]
        realtime: bool,
        /// Supply wattage limit (0 = unlimited)
        #[arg(long, value_name = "W")]
        supply_limit_w: Option<u32>,
        /// Disconnect the heater from the tip after this many seconds
        #[arg(long, value_name = "S")]
        disconnect_heater_at_s: Option<u32>,
        /// Hold the tip ADC at full scale for the whole run
        #[arg(long, action = ArgAction::SetTrue)]
        saturate_adc: bool,
        /// Swallow the first N sample-ready notifications
        #[arg(long, value_name = "N", default_value_t = 0)]
        drop_samples: u32,
        /// Log the full controller state on every cycle (debug level)
        #[arg(long, action = ArgAction::SetTrue)]
        trace_state: bool,
    },
    /// Quick health check: config valid, simulated loop commits and services the watchdog
    SelfCheck,
}

//! `tipctl`: runs the tip temperature controller against a simulated iron.

mod cli;
mod error_fmt;
mod sim;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::WrapErr;
use tipctl_core::error::{ControlError, FaultKind};
use tipctl_core::StopReason;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};
use crate::sim::{SimOptions, SimReport};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    let _ = color_eyre::install();

    if let Err(err) = real_main(cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&err));
        } else {
            eprintln!("{}", humanize(&err));
        }
        std::process::exit(exit_code_for_error(&err));
    }
}

fn real_main(cli: Cli) -> eyre::Result<()> {
    let cfg = match cli.config.as_deref() {
        Some(path) => tipctl_config::load_file(path)?,
        None => {
            let cfg = tipctl_config::Config::default();
            cfg.validate()?;
            cfg
        }
    };
    init_tracing(cli.json, cli.log_level.as_deref(), &cfg.logging)?;

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let flag = shutdown.clone();
        if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed)) {
            tracing::warn!(error = %e, "could not install Ctrl-C handler");
        }
    }

    match cli.cmd {
        Commands::Simulate {
            target_c,
            seconds,
            realtime,
            supply_limit_w,
            disconnect_heater_at_s,
            saturate_adc,
            drop_samples,
            trace_state,
        } => {
            let opts = SimOptions {
                target_c,
                seconds,
                realtime,
                supply_limit_w,
                disconnect_heater_at_s,
                saturate_adc,
                drop_samples,
                trace_state,
            };
            let report = sim::run_simulation(&cfg, &opts, &shutdown)?;
            print_report(&report, cli.json);
            if report.summary.runaway {
                return Err(ControlError::Fault(FaultKind::ThermalRunaway).into());
            }
            Ok(())
        }
        Commands::SelfCheck => {
            sim::self_check(&cfg)?;
            if cli.json {
                println!("{}", serde_json::json!({ "command": "self-check", "ok": true }));
            } else {
                println!("self-check ok");
            }
            Ok(())
        }
    }
}

fn print_report(r: &SimReport, json: bool) {
    let s = &r.summary;
    let stopped = match s.stopped {
        StopReason::Shutdown => "Shutdown",
        StopReason::CycleBudget => "CycleBudget",
    };
    if json {
        let line = serde_json::json!({
            "command": "simulate",
            "target_c": r.target_c,
            "final_temp_c": s.final_temp_c,
            "peak_temp_c": s.peak_temp_c,
            "cycles": s.cycles,
            "committed": s.committed,
            "timeouts": s.timeouts,
            "last_committed_x10w": s.last_committed_x10w,
            "runaway": s.runaway,
            "watchdog_resets": r.watchdog_resets,
            "heater_disconnected": r.heater_disconnected,
            "stopped": stopped,
        });
        println!("{line}");
        return;
    }
    let final_c = s
        .final_temp_c
        .map_or_else(|| "n/a".to_string(), |c| format!("{c} °C"));
    println!(
        "simulate complete: target {} °C, final {}, peak {} °C",
        r.target_c, final_c, s.peak_temp_c
    );
    println!(
        "cycles {} (committed {}, timeouts {}), watchdog resets {}, stopped by {}",
        s.cycles, s.committed, s.timeouts, r.watchdog_resets, stopped
    );
    if s.runaway {
        println!("thermal runaway latched; heater off");
    }
}

fn init_tracing(
    json: bool,
    cli_level: Option<&str>,
    logging: &tipctl_config::Logging,
) -> eyre::Result<()> {
    let level = cli_level
        .or(logging.level.as_deref())
        .unwrap_or("info")
        .to_string();
    // RUST_LOG wins over both
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&level))
        .wrap_err_with(|| format!("invalid log level '{level}'"))?;

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    let console = fmt::layer().with_writer(std::io::stderr).with_target(false);
    layers.push(if json {
        console.json().boxed()
    } else {
        console.boxed()
    });

    if let Some(file) = logging.file.as_deref() {
        let path = Path::new(file);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let name = path
            .file_name()
            .ok_or_else(|| eyre::eyre!("logging.file must name a file: {file}"))?;
        let appender = match logging.rotation.as_deref().unwrap_or("never") {
            "daily" => tracing_appender::rolling::daily(dir, name),
            "hourly" => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        layers.push(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer)
                .boxed(),
        );
    }

    let _ = tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init();
    Ok(())
}

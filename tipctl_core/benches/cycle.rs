use std::sync::Arc;

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use tipctl_core::clamp::{ClampInputs, SafetyChain};
use tipctl_core::mocks::{CountingWatchdog, FixedSensor, RecordingHeater};
use tipctl_core::{BoxedControlTask, ControlCfg, ErrorHistory, PowerCfg};
use tipctl_hardware::SimulatedAdcGate;
use tipctl_traits::ManualClock;

// Cheap xorshift so the inputs are not constant-folded.
fn noise(seed: &mut u32) -> i32 {
    let mut x = *seed;
    x ^= x << 13;
    x ^= x >> 17;
    x ^= x << 5;
    *seed = x;
    (x % 2_000) as i32 - 1_000
}

pub fn bench_history(c: &mut Criterion) {
    c.bench_function("history_update_average", |b| {
        let mut h = ErrorHistory::new();
        let mut seed = 0x1234_5678;
        b.iter(|| {
            h.update(noise(&mut seed));
            black_box(h.average())
        });
    });
}

pub fn bench_clamp_chain(c: &mut Criterion) {
    c.bench_function("clamp_chain_all_stages", |b| {
        let mut chain = SafetyChain::new(32, Some(40), 0);
        let mut seed = 0x9E37_79B9;
        let mut now = 0u32;
        b.iter(|| {
            now = now.wrapping_add(125);
            let inp = ClampInputs {
                now,
                raw_counts: 12_000,
                runaway: false,
                keep_awake_pulse_x10w: 5,
                pulse_wait_multiplier: 1,
                pulse_duration_multiplier: 1,
                power_limit_w: 40,
                supply_limit_w: 30,
            };
            black_box(chain.apply(noise(&mut seed) * 5, &inp))
        });
    });
}

pub fn bench_full_cycle(c: &mut Criterion) {
    c.bench_function("control_cycle_mocks", |b| {
        b.iter_batched(
            || {
                let clock = ManualClock::new();
                let mut task = BoxedControlTask::builder()
                    .with_gate(SimulatedAdcGate::new(clock.clone(), 125))
                    .with_sensor(FixedSensor::new(250, 500))
                    .with_heater(RecordingHeater::new())
                    .with_watchdog(CountingWatchdog::new())
                    .with_clock(Arc::new(clock))
                    .with_control(ControlCfg {
                        preseed_reads: 0,
                        ..ControlCfg::default()
                    })
                    .with_power(PowerCfg {
                        slew_limit_x10w: Some(20),
                    })
                    .build()
                    .expect("valid task");
                task.start().expect("start");
                task.context().set_target_c(320);
                task
            },
            |mut task| {
                for _ in 0..64 {
                    black_box(task.cycle().expect("cycle"));
                }
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_history, bench_clamp_chain, bench_full_cycle);
criterion_main!(benches);

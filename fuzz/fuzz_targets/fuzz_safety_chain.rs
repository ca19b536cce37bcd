#![no_main]
use libfuzzer_sys::arbitrary::{self, Arbitrary};
use libfuzzer_sys::fuzz_target;
use tipctl_core::clamp::{ADC_FULL_SCALE, ClampInputs, SafetyChain};

#[derive(Debug, Arbitrary)]
struct Step {
    requested_x10w: i32,
    dt: u16,
    raw_counts: u16,
    runaway: bool,
    pulse_x10w: u16,
    wait: u16,
    duration: u16,
    power_limit_w: u16,
    supply_limit_w: u32,
}

#[derive(Debug, Arbitrary)]
struct Run {
    margin: u16,
    slew: Option<i32>,
    steps: Vec<Step>,
}

fuzz_target!(|run: Run| {
    let margin = run.margin & 0x7FFF;
    let slew = run.slew.filter(|s| *s > 0);
    let mut now = 0u32;
    let mut chain = SafetyChain::new(margin, slew, now);
    for s in run.steps.iter().take(256) {
        now = now.wrapping_add(u32::from(s.dt));
        let inp = ClampInputs {
            now,
            raw_counts: s.raw_counts,
            runaway: s.runaway,
            keep_awake_pulse_x10w: s.pulse_x10w,
            pulse_wait_multiplier: s.wait,
            pulse_duration_multiplier: s.duration,
            power_limit_w: s.power_limit_w,
            supply_limit_w: s.supply_limit_w,
        };
        let out = chain.apply(s.requested_x10w, &inp);
        if s.runaway || s.raw_counts > ADC_FULL_SCALE.saturating_sub(margin) {
            assert_eq!(out.x10w, 0, "cutoff leaked {out:?}");
        }
        if s.power_limit_w > 0 {
            assert!(out.x10w <= i32::from(s.power_limit_w) * 10);
        }
    }
});

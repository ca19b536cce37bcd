//! Per-cycle behaviour of the control task against scripted collaborators.

use std::sync::Arc;

use rstest::rstest;
use tipctl_core::mocks::{CountingWatchdog, FixedSensor, RecordingHeater};
use tipctl_core::{
    BoxedControlTask, ClampStage, ControlCfg, ControlError, CycleOutcome, CycleReport, PowerCfg,
    SafetyCfg,
};
use tipctl_hardware::{MemorySettings, SimulatedAdcGate};
use tipctl_traits::{Clock, ManualClock, PowerModel, Setting};

const PERIOD: u32 = 125;

struct Rig {
    task: BoxedControlTask,
    clock: ManualClock,
    gate: SimulatedAdcGate,
    sensor: FixedSensor,
    heater: RecordingHeater,
    watchdog: CountingWatchdog,
    settings: Arc<MemorySettings>,
}

/// Always requests the same feed-forward power.
struct ConstModel(i32);
impl PowerModel for ConstModel {
    fn error_to_x10_watts(&self, _error_c: i32) -> i32 {
        self.0
    }
}

fn rig_with(temp_c: u32, power: PowerCfg, model: Option<ConstModel>) -> Rig {
    let clock = ManualClock::new();
    let gate = SimulatedAdcGate::new(clock.clone(), PERIOD);
    let sensor = FixedSensor::new(temp_c, 500);
    let heater = RecordingHeater::new();
    let watchdog = CountingWatchdog::new();
    let settings = Arc::new(MemorySettings::new());
    let control = ControlCfg {
        preseed_reads: 0,
        ..ControlCfg::default()
    };
    let builder = BoxedControlTask::builder()
        .with_gate(gate.clone())
        .with_sensor(sensor.clone())
        .with_heater(heater.clone())
        .with_watchdog(watchdog.clone())
        .with_clock(Arc::new(clock.clone()))
        .with_settings(settings.clone())
        .with_control(control)
        .with_safety(SafetyCfg::default())
        .with_power(power);
    let builder = match model {
        Some(m) => builder.with_model(m),
        None => builder,
    };
    let mut task = builder.build().expect("valid task");
    task.start().expect("start");
    Rig {
        task,
        clock,
        gate,
        sensor,
        heater,
        watchdog,
        settings,
    }
}

fn rig(temp_c: u32) -> Rig {
    rig_with(temp_c, PowerCfg::default(), None)
}

fn committed(outcome: CycleOutcome) -> CycleReport {
    match outcome {
        CycleOutcome::Committed(r) => r,
        CycleOutcome::SampleTimeout => panic!("unexpected sample timeout"),
    }
}

#[test]
fn zero_target_commits_zero_and_services_watchdog() {
    let mut r = rig(25);
    let report = committed(r.task.cycle().expect("cycle"));
    assert_eq!(report.demand.requested_x10w, 0);
    assert_eq!(report.demand.error_c, 0);
    assert_eq!(report.committed_x10w, 0);
    assert_eq!(r.watchdog.resets(), 1);
    // start() turned the heater off, then the cycle committed 0.
    assert_eq!(r.heater.commands(), vec![0, 0]);
}

#[test]
fn absurd_target_is_capped_at_global_ceiling() {
    let mut r = rig(25);
    r.task.context().set_target_c(10_000);
    let report = committed(r.task.cycle().expect("cycle"));
    assert_eq!(report.demand.target_c, 450);
    assert_eq!(report.demand.error_c, 450 - 25 + 1);
}

#[rstest]
#[case(30, 20, 200, ClampStage::SupplyLimit)]
#[case(15, 40, 150, ClampStage::PowerLimit)]
#[case(0, 25, 250, ClampStage::SupplyLimit)]
#[case(12, 0, 120, ClampStage::PowerLimit)]
fn smaller_limit_wins(
    #[case] power_limit_w: u16,
    #[case] supply_limit_w: u32,
    #[case] expected_x10w: i32,
    #[case] stage: ClampStage,
) {
    let mut r = rig(25);
    r.settings.set(Setting::PowerLimit, power_limit_w);
    r.task.context().set_supply_limit_w(supply_limit_w);
    r.task.context().set_target_c(450);
    let report = committed(r.task.cycle().expect("cycle"));
    assert!(report.demand.requested_x10w > 400);
    assert_eq!(report.committed_x10w, expected_x10w);
    assert_eq!(report.limited_by, Some(stage));
    assert_eq!(r.heater.last(), Some(expected_x10w));
}

#[rstest]
#[case(0x7FFF - 10, 0)]
#[case(0x7FFF, 0)]
fn saturated_adc_cuts_heater(#[case] raw: u16, #[case] expected: i32) {
    let mut r = rig(25);
    r.task.context().set_target_c(300);
    r.sensor.set_raw(raw);
    let report = committed(r.task.cycle().expect("cycle"));
    assert_eq!(report.committed_x10w, expected);
    assert_eq!(report.limited_by, Some(ClampStage::AdcSaturation));
    assert!(r.task.adc_saturated());
}

#[test]
fn adc_margin_edge_is_not_saturated_and_recovery_is_not_sticky() {
    let mut r = rig(25);
    r.task.context().set_target_c(300);
    r.sensor.set_raw(0x7FFF - 32);
    let report = committed(r.task.cycle().expect("cycle"));
    assert!(report.committed_x10w > 0);

    r.sensor.set_raw(0x7FFF);
    assert_eq!(committed(r.task.cycle().expect("cycle")).committed_x10w, 0);
    r.sensor.set_raw(1_500);
    assert!(committed(r.task.cycle().expect("cycle")).committed_x10w > 0);
    assert!(!r.task.adc_saturated());
}

#[test]
fn sample_timeout_turns_heater_off_and_touches_nothing() {
    let mut r = rig(25);
    r.task.context().set_target_c(300);
    for _ in 0..3 {
        committed(r.task.cycle().expect("cycle"));
    }
    assert!(r.heater.last().unwrap_or_default() > 0);
    let sum_before = r.task.calculator().error_history().sum();
    let baseline_before = r.task.runaway().baseline();
    let pulse_before = r.task.chain().pulse();
    let resets_before = r.watchdog.resets();

    r.gate.drop_next(1);
    let outcome = r.task.cycle().expect("timeout is not an error");
    assert_eq!(outcome, CycleOutcome::SampleTimeout);
    assert_eq!(r.heater.last(), Some(0));
    assert_eq!(r.watchdog.resets(), resets_before);
    assert_eq!(r.task.calculator().error_history().sum(), sum_before);
    assert_eq!(r.task.runaway().baseline(), baseline_before);
    assert_eq!(r.task.chain().pulse(), pulse_before);

    // Next sample resumes normally.
    committed(r.task.cycle().expect("cycle"));
    assert_eq!(r.watchdog.resets(), resets_before + 1);
}

#[test]
fn slew_limiter_ramps_then_caps_at_request() {
    let power = PowerCfg {
        slew_limit_x10w: Some(50),
    };
    // temp = target + 1 keeps error, and so the integral, at zero.
    let mut r = rig_with(301, power, Some(ConstModel(150)));
    r.task.context().set_target_c(300);
    let seen: Vec<i32> = (0..4)
        .map(|_| committed(r.task.cycle().expect("cycle")).committed_x10w)
        .collect();
    assert_eq!(seen, vec![50, 100, 150, 150]);
}

#[test]
fn slew_limiter_floors_negative_requests() {
    let power = PowerCfg {
        slew_limit_x10w: Some(50),
    };
    let mut r = rig_with(301, power, Some(ConstModel(-80)));
    r.task.context().set_target_c(300);
    assert_eq!(committed(r.task.cycle().expect("cycle")).committed_x10w, 0);
}

#[test]
fn keep_awake_pulse_floors_idle_power_inside_window() {
    let mut r = rig(25);
    r.settings.set(Setting::KeepAwakePulse, 5);
    r.settings.set(Setting::KeepAwakePulseWait, 1);
    r.settings.set(Setting::KeepAwakePulseDuration, 1);
    // Target stays 0: only the pulse can produce power.
    let mut pulsed = Vec::new();
    for n in 1..=24u32 {
        let report = committed(r.task.cycle().expect("cycle"));
        assert_eq!(r.clock.now(), n * PERIOD);
        if report.committed_x10w > 0 {
            assert_eq!(report.committed_x10w, 5);
            assert_eq!(report.limited_by, Some(ClampStage::KeepAwake));
            pulsed.push(n);
        }
    }
    // Window opens once more than 2500 ticks have passed and lasts 250.
    assert_eq!(pulsed, vec![21, 22]);
}

#[test]
fn stalled_tip_trips_runaway_once_and_stays_off() {
    let mut r = rig(25);
    r.task.context().set_target_c(300);
    // First heating cycle (t=125) rebases to 25 °C; trip needs > 20_000 ticks since.
    for _ in 0..161 {
        let report = committed(r.task.cycle().expect("cycle"));
        assert!(!report.runaway);
        assert!(report.committed_x10w > 0);
    }
    let trip = committed(r.task.cycle().expect("cycle"));
    assert!(trip.runaway_tripped);
    assert!(trip.runaway);
    assert_eq!(trip.committed_x10w, 0);
    assert_eq!(trip.limited_by, Some(ClampStage::Runaway));
    assert!(r.task.context().thermal_runaway());

    // Even if the tip now moves, heating stays off.
    for t in 0..20 {
        r.sensor.set_temp_c(25 + t * 20);
        let report = committed(r.task.cycle().expect("cycle"));
        assert!(!report.runaway_tripped);
        assert_eq!(report.committed_x10w, 0);
    }

    // A task restart is the reset.
    r.task.start().expect("restart");
    assert!(!r.task.context().thermal_runaway());
    assert_eq!(r.task.context().target_c(), 0);
}

#[test]
fn climbing_tip_never_trips_runaway() {
    let mut r = rig(25);
    r.task.context().set_target_c(300);
    for n in 0..400u32 {
        r.sensor.set_temp_c((25 + 2 * n).min(299));
        let report = committed(r.task.cycle().expect("cycle"));
        assert!(!report.runaway);
    }
    assert!(!r.task.context().thermal_runaway());
}

#[test]
fn heater_failure_is_an_error_without_watchdog_reset() {
    let mut r = rig(25);
    r.task.context().set_target_c(300);
    committed(r.task.cycle().expect("cycle"));
    let resets = r.watchdog.resets();

    r.heater.set_failing(true);
    let err = r.task.cycle().expect_err("commit must fail");
    match err.downcast_ref::<ControlError>() {
        Some(ControlError::HeaterFault(msg)) => assert!(msg.contains("fault")),
        other => panic!("expected HeaterFault, got {other:?}"),
    }
    assert_eq!(r.watchdog.resets(), resets);
}

#[test]
fn start_turns_heater_off_zeroes_target_and_preseeds() {
    let clock = ManualClock::new();
    let sensor = FixedSensor::new(25, 500);
    let heater = RecordingHeater::new();
    let mut task = BoxedControlTask::builder()
        .with_gate(SimulatedAdcGate::new(clock.clone(), PERIOD))
        .with_sensor(sensor.clone())
        .with_heater(heater.clone())
        .with_watchdog(CountingWatchdog::new())
        .with_clock(Arc::new(clock.clone()))
        .build()
        .expect("valid task");
    task.context().set_target_c(300);

    task.start().expect("start");
    assert_eq!(heater.commands(), vec![0]);
    assert_eq!(task.context().target_c(), 0);
    assert_eq!(sensor.reads(), 64);
    assert_eq!(clock.now(), 128);
    assert!(task.is_started());
}

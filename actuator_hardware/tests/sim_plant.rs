use std::f64::consts::TAU;

use actuator_hardware::error::HwError;
use actuator_hardware::{HALL_COUNTS_PER_REV, MAX_QUADRATURE_CPR, MotorModel, SimulatedActuator};
use actuator_traits::{ActuatorHardware, EncoderConfig, EncoderKind, ManualClock};
use rstest::rstest;

fn plant(clock: &ManualClock) -> SimulatedActuator<ManualClock> {
    SimulatedActuator::with_clock(MotorModel::default(), clock.clone())
}

#[rstest]
#[case(EncoderKind::Quadrature, 1, true)]
#[case(EncoderKind::Quadrature, MAX_QUADRATURE_CPR, true)]
#[case(EncoderKind::Quadrature, MAX_QUADRATURE_CPR + 1, false)]
#[case(EncoderKind::Quadrature, 0, false)]
#[case(EncoderKind::HallEffect, HALL_COUNTS_PER_REV, true)]
#[case(EncoderKind::HallEffect, 4096, false)]
#[case(EncoderKind::None, 0, true)]
fn encoder_acceptance(#[case] kind: EncoderKind, #[case] cpr: u32, #[case] accepted: bool) {
    let clock = ManualClock::new();
    let mut sim = plant(&clock);
    let probe = sim.probe();
    let cfg = EncoderConfig::new(cpr, kind);
    assert_eq!(sim.program_encoder(&cfg), accepted);
    if accepted {
        assert_eq!(probe.snapshot().encoder, cfg);
    } else {
        assert_eq!(probe.snapshot().encoder, EncoderConfig::default());
    }
}

#[rstest]
#[case(3.0)]
#[case(-6.0)]
fn velocity_settles_at_free_speed(#[case] volts: f64) {
    let clock = ManualClock::new();
    let mut sim = plant(&clock);
    let cpr = 4096;
    assert!(sim.program_encoder(&EncoderConfig::new(cpr, EncoderKind::Quadrature)));
    sim.write_voltage(volts).unwrap();
    // Twenty time constants
    clock.advance_ms(1000);
    let counts_per_sec = sim.read_raw_velocity().unwrap();
    let omega = counts_per_sec * TAU / f64::from(cpr);
    let expected = MotorModel::default().free_speed_per_volt * volts;
    assert!((omega - expected).abs() < 1e-6 * expected.abs(), "{omega} vs {expected}");
}

#[rstest]
fn probe_tracks_programming() {
    let clock = ManualClock::new();
    let mut sim = plant(&clock);
    let probe = sim.probe();
    sim.program_gains(0.5, 0.0, 0.1).unwrap();
    sim.write_current_limit(25).unwrap();
    sim.program_conversion_multipliers(0.01, 0.02).unwrap();
    sim.write_voltage(1.0).unwrap();

    let s = probe.snapshot();
    assert_eq!(s.gains, (0.5, 0.0, 0.1));
    assert_eq!(s.current_limit_a, Some(25));
    assert_eq!(s.conversion, (0.01, 0.02));
    assert_eq!(s.voltage_writes, 1);
}

#[rstest]
fn invalid_requests_are_rejected_with_typed_errors() {
    let clock = ManualClock::new();
    let mut sim = plant(&clock);
    let err = sim.write_current_limit(0).expect_err("zero limit");
    assert!(matches!(err.downcast_ref::<HwError>(), Some(HwError::Rejected(_))));
    let err = sim.program_gains(f64::NAN, 0.0, 0.0).expect_err("nan gain");
    assert!(matches!(err.downcast_ref::<HwError>(), Some(HwError::Rejected(_))));
}

#[rstest]
#[case(false, false, 1.0)]
#[case(false, true, -1.0)]
#[case(true, false, -1.0)]
#[case(true, true, 1.0)]
fn reversed_compensates_a_backwards_sensor(
    #[case] sensor_inverted: bool,
    #[case] reversed: bool,
    #[case] reported_sign: f64,
) {
    let clock = ManualClock::new();
    let model = MotorModel {
        sensor_inverted,
        ..MotorModel::default()
    };
    let mut sim = SimulatedActuator::with_clock(model, clock.clone());
    let probe = sim.probe();
    let cfg = EncoderConfig::new(4096, EncoderKind::Quadrature).reversed(reversed);
    assert!(sim.program_encoder(&cfg));
    sim.write_voltage(6.0).unwrap();
    clock.advance_ms(200);

    // The motor turns forward whatever the encoder says
    assert!(probe.snapshot().omega > 0.0);
    assert_eq!(sim.read_raw_velocity().unwrap().signum(), reported_sign);
    assert_eq!(sim.read_raw_position().unwrap().signum(), reported_sign);
}

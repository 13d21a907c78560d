use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use actuator_core::mocks::RecordingHardware;
use actuator_core::{
    ActuatorController, ActuatorId, ConfigurationError, ControlMode, ControlState, follow,
    unfollow,
};
use rstest::rstest;

const SYNC: Duration = Duration::from_millis(2);

fn leader() -> ActuatorController {
    ActuatorController::builder(ActuatorId(1))
        .with_follower_sync(SYNC)
        .build()
        .expect("leader")
}

fn physical_follower(id: u32, hw: &RecordingHardware) -> ActuatorController<RecordingHardware> {
    ActuatorController::builder(ActuatorId(id))
        .with_hardware(hw.clone())
        .build()
        .expect("follower")
}

/// Wait up to `limit` for `cond`, polling every sync period.
fn eventually(limit: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = std::time::Instant::now() + limit;
    while std::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(SYNC);
    }
    cond()
}

#[rstest]
fn leader_voltage_reaches_follower_via_sync_thread() {
    let mut lead = leader();
    let hw = RecordingHardware::new();
    let mut f = physical_follower(2, &hw);

    follow(&mut f, &mut lead).unwrap();
    assert!(f.is_following());
    assert_eq!(f.leader(), Some(ActuatorId(1)));
    assert_eq!(lead.follower_ids(), vec![ActuatorId(2)]);

    // set_voltage writes the leader's output without a tick; the sync thread mirrors it
    lead.set_voltage(4.0).unwrap();
    assert!(eventually(Duration::from_millis(500), || f.output_voltage() == 4.0));

    // The follower's tick writes the mirrored value to its own hardware
    assert_eq!(f.update().unwrap(), 4.0);
    assert_eq!(hw.last_voltage(), Some(4.0));
}

#[rstest]
fn leader_tick_pushes_immediately() {
    let mut lead = leader();
    lead.set_control_law(|_: &ControlState| -2.5);
    lead.set_mode(ControlMode::Position);
    let hw = RecordingHardware::new();
    let mut f = physical_follower(2, &hw);
    follow(&mut f, &mut lead).unwrap();

    lead.update().unwrap();
    assert_eq!(f.output_voltage(), -2.5);
}

#[rstest]
fn following_controller_never_evaluates_its_own_law() {
    let mut lead = leader();
    let hw = RecordingHardware::new();
    let mut f = physical_follower(2, &hw);
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    f.set_control_law(move |_: &ControlState| {
        seen.fetch_add(1, Ordering::SeqCst);
        9.0
    });

    follow(&mut f, &mut lead).unwrap();
    lead.set_voltage(1.0).unwrap();
    for _ in 0..5 {
        f.update().unwrap();
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    // Own commands are ignored while following
    f.set_voltage(7.0).unwrap();
    assert_ne!(hw.last_voltage(), Some(7.0));
}

#[rstest]
fn unfollow_zeroes_output_and_resumes_own_law() {
    let mut lead = leader();
    let hw = RecordingHardware::new();
    let mut f = physical_follower(2, &hw);
    follow(&mut f, &mut lead).unwrap();
    lead.set_voltage(3.0).unwrap();
    lead.update().unwrap();

    assert!(unfollow(&mut f, &mut lead));
    assert!(!f.is_following());
    assert_eq!(f.output_voltage(), 0.0);
    assert_eq!(hw.last_voltage(), Some(0.0));
    assert!(lead.follower_ids().is_empty());

    // Leader changes no longer reach the former follower
    lead.set_voltage(5.0).unwrap();
    lead.update().unwrap();
    std::thread::sleep(SYNC * 5);
    assert_eq!(f.output_voltage(), 0.0);
    assert!(!unfollow(&mut f, &mut lead));
}

#[rstest]
fn simulated_follower_resumes_law_after_unfollow() {
    let mut lead = leader();
    let mut f = ActuatorController::builder(ActuatorId(3)).build().unwrap();
    f.set_control_law(|_: &ControlState| 0.75);
    f.set_mode(ControlMode::Velocity);
    follow(&mut f, &mut lead).unwrap();
    lead.set_voltage(3.0).unwrap();
    lead.update().unwrap();
    assert_eq!(f.update().unwrap(), 3.0);

    assert!(unfollow(&mut f, &mut lead));
    assert_eq!(f.update().unwrap(), 0.75);
}

#[rstest]
fn dropping_leader_releases_followers() {
    let mut lead = leader();
    let mut f = ActuatorController::builder(ActuatorId(2)).build().unwrap();
    follow(&mut f, &mut lead).unwrap();
    lead.set_voltage(2.0).unwrap();
    lead.update().unwrap();
    assert_eq!(f.output_voltage(), 2.0);

    drop(lead);
    assert!(!f.is_following());
    assert_eq!(f.output_voltage(), 0.0);
}

#[rstest]
fn dropped_follower_is_pruned_from_leader() {
    let mut lead = leader();
    {
        let mut f = ActuatorController::builder(ActuatorId(2)).build().unwrap();
        follow(&mut f, &mut lead).unwrap();
        assert_eq!(lead.follower_ids().len(), 1);
    }
    assert!(lead.follower_ids().is_empty());
    lead.set_voltage(1.0).unwrap();
    lead.update().unwrap();
}

#[rstest]
fn invalid_follow_relationships_are_rejected() {
    let mut a = leader();
    let mut b = ActuatorController::builder(ActuatorId(2)).build().unwrap();
    let mut c = ActuatorController::builder(ActuatorId(3)).build().unwrap();
    let mut same_id = ActuatorController::builder(ActuatorId(1)).build().unwrap();

    follow(&mut b, &mut a).unwrap();
    // Re-registering with the same leader is a no-op
    follow(&mut b, &mut a).unwrap();
    assert_eq!(a.follower_ids(), vec![ActuatorId(2)]);

    // c -> b -> a: closing the loop at any distance is refused
    follow(&mut c, &mut b).unwrap();

    let cases = [
        follow(&mut b, &mut c).expect_err("already following"),
        follow(&mut a, &mut b).expect_err("cycle"),
        follow(&mut a, &mut c).expect_err("cycle through an intermediate follower"),
        follow(&mut same_id, &mut a).expect_err("self"),
    ];
    for err in cases {
        assert!(matches!(
            err.downcast_ref::<ConfigurationError>(),
            Some(ConfigurationError::InvalidConfiguration(_))
        ));
    }
    assert!(!a.is_following());
}

#[rstest]
fn leader_commands_reach_followers_without_waiting_for_sync() {
    // Long enough that only the direct push can deliver within the test
    let mut lead = ActuatorController::builder(ActuatorId(1))
        .with_follower_sync(Duration::from_millis(200))
        .build()
        .unwrap();
    let mut f = ActuatorController::builder(ActuatorId(2)).build().unwrap();
    let mut g = ActuatorController::builder(ActuatorId(3)).build().unwrap();
    follow(&mut f, &mut lead).unwrap();
    follow(&mut g, &mut f).unwrap();

    lead.set_voltage(2.0).unwrap();
    assert_eq!(f.output_voltage(), 2.0);

    // Without a law the leader's tick re-sends its held output
    assert_eq!(lead.update().unwrap(), 2.0);
    assert_eq!(f.output_voltage(), 2.0);

    // A following controller passes the mirrored value down the chain on its tick
    assert_eq!(f.update().unwrap(), 2.0);
    assert_eq!(g.output_voltage(), 2.0);

    lead.idle().unwrap();
    assert_eq!(f.output_voltage(), 0.0);
}

use actuator_config::{EncoderKind, FeedforwardKind, load_toml};
use rstest::rstest;

const BASE: &str = r#"
[actuator]
id = 1
gear_ratio = 3.0
max_output_voltage = 12.0

[encoder]
kind = "quadrature"
counts_per_revolution = 4096

[gains]
kp = 0.8
kd = 0.05

[constraints]
max_velocity = 3.0
max_acceleration = 6.0

[loop]
tick_ms = 20
follower_sync_ms = 5

[[followers]]
id = 2
gear_ratio = 3.0
"#;

#[test]
fn accepts_full_config() {
    let cfg = load_toml(BASE).expect("parse TOML");
    cfg.validate().expect("valid config");
    assert_eq!(cfg.actuator.id, 1);
    assert_eq!(cfg.encoder.kind, EncoderKind::Quadrature);
    assert_eq!(cfg.encoder.counts_per_revolution, 4096);
    assert!(!cfg.encoder.reversed);
    assert_eq!(cfg.gains.ki, 0.0);
    assert_eq!(cfg.followers.len(), 1);
    assert!(cfg.feedforward.is_none());
}

#[test]
fn empty_document_uses_defaults() {
    let cfg = load_toml("").expect("parse TOML");
    cfg.validate().expect("defaults are valid");
    assert_eq!(cfg.actuator.gear_ratio, 1.0);
    assert_eq!(cfg.actuator.max_output_voltage, 12.0);
    assert_eq!(cfg.encoder.kind, EncoderKind::None);
    assert_eq!(cfg.loop_.tick_ms, 20);
    assert_eq!(cfg.loop_.follower_sync_ms, 5);
}

#[test]
fn hall_effect_kind_parses_snake_case() {
    let cfg = load_toml(
        r#"
[encoder]
kind = "hall_effect"
counts_per_revolution = 42
reversed = true
"#,
    )
    .expect("parse TOML");
    assert_eq!(cfg.encoder.kind, EncoderKind::HallEffect);
    assert!(cfg.encoder.reversed);
}

#[test]
fn unknown_encoder_kind_fails_to_parse() {
    assert!(load_toml("[encoder]\nkind = \"optical\"\n").is_err());
}

#[rstest]
#[case("[actuator]\ngear_ratio = 0.0\n", "gear_ratio must be positive")]
#[case("[actuator]\nradius_m = -0.1\n", "radius_m must be positive")]
#[case("[actuator]\nmax_output_voltage = 0.0\n", "max_output_voltage must be positive")]
#[case("[actuator]\ncurrent_limit_a = 0\n", "current_limit_a must be >= 1")]
#[case(
    "[encoder]\nkind = \"quadrature\"\ncounts_per_revolution = 0\n",
    "counts_per_revolution must be > 0"
)]
#[case("[gains]\nkp = -1.0\n", "gains must be >= 0")]
#[case("[gains]\nkd = nan\n", "gains must be finite")]
#[case("[constraints]\nmax_velocity = 0.0\n", "max_velocity must be positive")]
#[case("[constraints]\nmax_acceleration = inf\n", "max_acceleration must be positive")]
#[case("[loop]\ntick_ms = 0\n", "tick_ms must be in 1..=1000")]
#[case("[loop]\ntick_ms = 1001\n", "tick_ms must be in 1..=1000")]
#[case(
    "[loop]\ntick_ms = 10\nfollower_sync_ms = 20\n",
    "follower_sync_ms must be in 1..=loop.tick_ms"
)]
#[case("[logging]\nrotation = \"weekly\"\n", "rotation must be one of")]
fn rejects_out_of_range(#[case] toml: &str, #[case] needle: &str) {
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should be rejected");
    assert!(
        format!("{err}").contains(needle),
        "error {err:?} should mention {needle:?}"
    );
}

#[test]
fn arm_feedforward_conflicts_with_radius() {
    let cfg = load_toml(
        r#"
[actuator]
radius_m = 0.05

[feedforward]
kind = "arm"
kg = 0.4
"#,
    )
    .expect("parse TOML");
    assert_eq!(cfg.feedforward.as_ref().map(|f| f.kind), Some(FeedforwardKind::Arm));
    let err = cfg.validate().expect_err("arm + radius");
    assert!(format!("{err}").contains("cannot be combined"));
}

#[test]
fn simple_feedforward_needs_radius() {
    let cfg = load_toml("[feedforward]\nkind = \"simple\"\nkv = 1.2\n").expect("parse TOML");
    let err = cfg.validate().expect_err("simple without radius");
    assert!(format!("{err}").contains("requires actuator.radius_m"));

    let cfg = load_toml("[actuator]\nradius_m = 0.05\n[feedforward]\nkind = \"simple\"\nkv = 1.2\n")
        .expect("parse TOML");
    cfg.validate().expect("simple with radius");
}

#[test]
fn follower_ids_must_be_unique_and_differ_from_leader() {
    let dup_leader = load_toml("[actuator]\nid = 1\n[[followers]]\nid = 1\n").expect("parse");
    assert!(format!("{}", dup_leader.validate().unwrap_err()).contains("duplicate actuator id 1"));

    let dup = load_toml("[[followers]]\nid = 4\n[[followers]]\nid = 4\n").expect("parse");
    assert!(format!("{}", dup.validate().unwrap_err()).contains("duplicate actuator id 4"));
}

#[test]
fn follower_gear_ratio_defaults_to_one() {
    let cfg = load_toml("[[followers]]\nid = 7\n").expect("parse");
    assert_eq!(cfg.followers[0].gear_ratio, 1.0);
}

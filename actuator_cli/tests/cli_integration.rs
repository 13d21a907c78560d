use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

// Leader with a quadrature encoder and one follower, tuned for the simulated plant
fn write_valid_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[actuator]
id = 1
gear_ratio = 1.0
max_output_voltage = 12.0

[encoder]
kind = "quadrature"
counts_per_revolution = 4096

[gains]
kp = 0.3
kd = 0.01

[constraints]
max_velocity = 2.0
max_acceleration = 4.0

[loop]
tick_ms = 20
follower_sync_ms = 5

[[followers]]
id = 2
gear_ratio = 1.0
"#;
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["move", "--to", "1.0"], 0, "move complete", "stdout")]
#[case(&["move", "--to", "-0.5", "--stats"], 0, "Missed deadlines", "stderr")]
#[case(&["hold", "--velocity", "0.5", "--ticks", "20"], 0, "hold complete", "stdout")]
#[case(&["self-check"], 0, "self-check ok", "stdout")]
#[case(&["move"], 2, "move needs --to", "stderr")]
#[case(&["hold", "--velocity", "1.0"], 2, "required", "stderr")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let mut cmd = Command::cargo_bin("actuator").unwrap();
    // Always include a valid config to avoid relying on the default path
    cmd.arg("--config")
        .arg(&cfg)
        .arg("--virtual-clock")
        .arg("--log-level")
        .arg("error");
    for a in args {
        cmd.arg(a);
    }

    let assert = cmd.assert().code(exit_code);
    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        "stderr" => {
            assert.stderr(predicate::str::contains(needle));
        }
        other => panic!("unknown stream: {other}"),
    }
}

#[rstest]
fn move_follows_profile_table() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let csv = dir.path().join("profile.csv");
    fs::write(&csv, "t_s,position\n0.0,0.0\n1.0,0.5\n2.0,0.5\n").unwrap();

    let mut cmd = Command::cargo_bin("actuator").unwrap();
    cmd.arg("--config")
        .arg(&cfg)
        .arg("--profile-csv")
        .arg(&csv)
        .arg("--virtual-clock")
        .arg("move");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("(target 0.5000)"));
}

#[rstest]
fn to_and_profile_table_conflict() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let csv = dir.path().join("profile.csv");
    fs::write(&csv, "t_s,position\n0.0,0.0\n1.0,0.5\n").unwrap();

    let mut cmd = Command::cargo_bin("actuator").unwrap();
    cmd.arg("--config")
        .arg(&cfg)
        .arg("--profile-csv")
        .arg(&csv)
        .arg("--virtual-clock")
        .args(["move", "--to", "1.0"]);
    cmd.assert()
        .code(2)
        .stderr(predicate::str::contains("mutually exclusive"));
}

#[rstest]
fn log_file_is_written() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("actuator.log");
    let cfg = dir.path().join("cfg.toml");
    fs::write(
        &cfg,
        format!(
            r#"
[encoder]
kind = "quadrature"
counts_per_revolution = 4096

[logging]
file = "{}"
level = "info"
rotation = "never"
"#,
            log.display().to_string().replace('\\', "/")
        ),
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("actuator").unwrap();
    cmd.env_remove("RUST_LOG")
        .arg("--config")
        .arg(&cfg)
        .arg("--virtual-clock")
        .arg("self-check");
    cmd.assert().success();

    let text = fs::read_to_string(&log).unwrap();
    assert!(text.contains("rig ready"), "log was: {text}");
}

use std::fs::File;
use std::io::Write;

use actuator_config::{ProfileRow, load_profile_csv, validate_profile_rows};
use rstest::rstest;
use tempfile::tempdir;

fn write_csv(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("profile.csv");
    let mut f = File::create(&path).expect("create csv");
    f.write_all(contents.as_bytes()).expect("write csv");
    (dir, path)
}

#[rstest]
fn loads_valid_table() {
    let (_dir, path) = write_csv("t_s,position\n0.0,0.0\n0.5,0.25\n1.0,1.0\n");
    let rows = load_profile_csv(&path).expect("valid profile");
    assert_eq!(rows.len(), 3);
    assert_eq!(
        rows[1],
        ProfileRow {
            t_s: 0.5,
            position: 0.25
        }
    );
}

#[rstest]
fn tolerates_whitespace_around_fields() {
    let (_dir, path) = write_csv("t_s, position\n0.0, 0.0\n1.0, 2.0\n");
    let rows = load_profile_csv(&path).expect("trimmed profile");
    assert_eq!(rows[1].position, 2.0);
}

#[rstest]
#[case("time,pos\n0,0\n1,1\n", "headers 't_s,position'")]
#[case("t_s,position\n0.0,0.0\n", "at least two rows")]
#[case("t_s,position\n0.0,0.0\n0.0,1.0\n", "strictly increasing")]
#[case("t_s,position\n1.0,0.0\n0.5,1.0\n", "strictly increasing")]
#[case("t_s,position\n0.0,zero\n1.0,1.0\n", "invalid CSV row 2")]
fn rejects_bad_tables(#[case] contents: &str, #[case] needle: &str) {
    let (_dir, path) = write_csv(contents);
    let err = load_profile_csv(&path).expect_err("should be rejected");
    assert!(
        format!("{err}").contains(needle),
        "error {err} should mention {needle:?}"
    );
}

#[test]
fn missing_file_reports_path() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("absent.csv");
    let err = load_profile_csv(&path).expect_err("missing file");
    assert!(format!("{err}").contains("open profile CSV"));
}

#[test]
fn non_finite_rows_are_rejected() {
    let rows = [
        ProfileRow {
            t_s: 0.0,
            position: 0.0,
        },
        ProfileRow {
            t_s: 1.0,
            position: f64::NAN,
        },
    ];
    assert!(validate_profile_rows(&rows).is_err());
}

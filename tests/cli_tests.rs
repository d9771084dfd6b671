#![cfg(feature = "cli")]

use assert_cmd::Command;
use predicates::str::contains as str_contains;
use tempfile::{NamedTempFile, TempDir};

#[allow(deprecated)]
fn run_cli(script: &str) -> assert_cmd::assert::Assert {
    let mut cmd = Command::cargo_bin("cli").expect("cli binary");
    cmd.write_stdin(script.to_string()).assert()
}

#[allow(deprecated)]
fn run_cli_with_db(db: &str, script: &str) -> assert_cmd::assert::Assert {
    let mut cmd = Command::cargo_bin("cli").expect("cli binary");
    cmd.arg(db).write_stdin(script.to_string()).assert()
}

#[test]
fn cli_records_failure_and_renders_calendar() {
    let assert = run_cli(
        "add 2020-01-01 Smoking\nfail 1 2020-01-05 stress at work\nlist\ncalendar 1 2020 1\nquit\n",
    )
    .success();
    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(output.contains("Created habit 1 'Smoking' starting 2020-01-01."));
    assert!(output.contains("Recorded failure 1 on 2020-01-05."));
    assert!(output.contains("last fail 2020-01-05"));
    assert!(output.contains("Smoking 2020-01"));
    assert!(output.contains("- not started  blank future)"));
    assert!(output.contains("  5x"), "calendar should mark the failed day:\n{output}");
    assert!(output.contains("  6."));
    assert!(output.contains("2020-01-05: stress at work [record 1]"));
}

#[test]
fn cli_second_fail_on_same_day_updates_reason() {
    run_cli("add 2020-01-01 Sugar\nfail 1 2020-01-02 cake\nfail 1 2020-01-02 more cake\nrecords 1\nquit\n")
        .success()
        .stdout(str_contains("Updated failure 1 on 2020-01-02."))
        .stdout(str_contains("[1] 2020-01-02  more cake"));
}

#[test]
fn cli_reports_tracker_errors() {
    run_cli("add 2020-01-10 Coffee\nfail 1 2020-01-09 early\nquit\n")
        .success()
        .stdout(str_contains("Error: cannot mark 2020-01-09: habit starts on 2020-01-10"));

    run_cli("add 2020-01-10 Coffee\nfail 1 2020-01-11\nquit\n")
        .success()
        .stdout(str_contains("Error: validation error: reason"));

    run_cli("show 7\nquit\n")
        .success()
        .stdout(str_contains("Error: habit 7 not found"));

    run_cli("add - \nquit\n")
        .success()
        .stdout(str_contains("Error: validation error: name"));
}

#[test]
fn cli_delete_and_unfail_commands() {
    run_cli("add 2020-01-01 Soda\nfail 1 2020-01-03 hot day\nunfail 1\nrecords 1\ndelete 1\nlist\nquit\n")
        .success()
        .stdout(str_contains("Deleted record 1."))
        .stdout(str_contains("No failures recorded."))
        .stdout(str_contains("Deleted habit 1."))
        .stdout(str_contains("No habits yet."));
}

#[test]
fn cli_export_and_import_json_round_trip() {
    let tmp = NamedTempFile::new().expect("create temp file");
    let path = tmp.path().to_string_lossy().replace('\\', "\\\\");
    let script = format!(
        "add 2020-01-01 Gaming\nfail 1 2020-01-04 new release\nexport json {path}\ndelete 1\nimport json {path}\nlist\nquit\n"
    );
    let assert = run_cli(&script).success();
    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(output.contains(&format!("Exported habits to {path}.")));
    assert!(output.contains(&format!("Imported 1 habit(s) from {path}.")));
    let after_import = output
        .split("Imported 1 habit(s)")
        .last()
        .unwrap_or_default();
    assert!(
        after_import.contains("Gaming") && after_import.contains("last fail 2020-01-04"),
        "restored habit should carry its record:\n{after_import}"
    );
}

#[test]
fn cli_sqlite_database_survives_restart() {
    let dir = TempDir::new().expect("temp dir");
    let db = dir.path().join("habits.db");
    let db = db.to_string_lossy().to_string();

    run_cli_with_db(&db, "add 2020-01-01 Nails\nfail 1 2020-01-02 exam\nquit\n")
        .success()
        .stdout(str_contains("Using database"));

    run_cli_with_db(&db, "records 1\nquit\n")
        .success()
        .stdout(str_contains("2020-01-02  exam"));
}

#![cfg(feature = "cli_api")]

use assert_cmd::Command;
use predicates::str::contains as str_contains;
use tempfile::NamedTempFile;

const FLAT: &str = "project new 2025-08-18 Flat\nadd masonry 3 Walls\nadd painting 2 Paint\n";

#[allow(deprecated)]
fn run_cli(script: &str) -> assert_cmd::assert::Assert {
    let mut cmd = Command::cargo_bin("cli").expect("cli binary");
    cmd.env_remove("WORKSITE_DATA")
        .env_remove("WORKSITE_CONFIG")
        .env_remove("WORKSITE_DAY_WIDTH")
        .write_stdin(script.to_string())
        .assert()
}

#[test]
fn cli_schedules_a_new_project() {
    run_cli(&format!("{FLAT}schedule\nshow\nquit\n"))
        .success()
        .stdout(str_contains("Created project 1 'Flat'."))
        .stdout(str_contains("Added task 2 'Paint' at position 1."))
        .stdout(str_contains("Scheduled ("))
        .stdout(str_contains("2025-08-22"));
}

#[test]
fn cli_schedule_without_start_is_skipped() {
    run_cli("project new - Someday\nadd flooring 2 Parquet\nschedule\nquit\n")
        .success()
        .stdout(str_contains("Not scheduled:"));
}

#[test]
fn cli_drag_asks_before_rescheduling() {
    run_cli(&format!("{FLAT}schedule\ndrag 1 body 0 120\ny\nquit\n"))
        .success()
        .stdout(str_contains("Preview: offset 2 days, duration 3 days"))
        .stdout(str_contains("Reschedule them? [y/n]"))
        .stdout(str_contains("Task 1 now 2025-08-20 .. 2025-08-22 (3 days); rescheduled, 2 task(s) updated."));
}

#[test]
fn cli_drag_declined_updates_one_task() {
    run_cli(&format!("{FLAT}schedule\ndrag 1 body 0 120\nn\nquit\n"))
        .success()
        .stdout(str_contains("declined cascade, 1 task(s) updated."));
}

#[test]
fn cli_status_and_delete_commands() {
    run_cli(&format!("{FLAT}status 1\ndelete 2\ndelete 9\nquit\n"))
        .success()
        .stdout(str_contains("Task 1 is now in-progress."))
        .stdout(str_contains("Deleted task 2."))
        .stdout(str_contains("Task 9 not found."));
}

#[test]
fn cli_save_and_load_json_round_trip() {
    let tmp = NamedTempFile::new().expect("create temp file");
    let path = tmp.path().to_string_lossy().replace('\\', "\\\\");
    let script = format!(
        "{FLAT}save json {path}\nadd carpentry 1 Shelves\nload json {path}\nshow\nquit\n"
    );
    let assert = run_cli(&script).success();
    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(output.contains("Projects saved to"), "missing save confirmation");
    assert!(output.contains("Projects loaded from"), "missing load confirmation");
    let after_load = output.split("Projects loaded from").nth(1).unwrap();
    assert!(after_load.contains("Walls"));
    assert!(!after_load.contains("Shelves"));
}

#[test]
fn cli_export_csv_writes_tasks() {
    let tmp = NamedTempFile::new().expect("create temp file");
    let path = tmp.path().to_string_lossy().to_string();
    run_cli(&format!("{FLAT}export csv {path}\nquit\n"))
        .success()
        .stdout(str_contains("Tasks exported to"));
    let text = std::fs::read_to_string(tmp.path()).unwrap();
    assert!(text.contains("Walls"));
}

#[test]
fn cli_reports_errors_and_unknown_commands() {
    run_cli("add masonry 3 Walls\nfrobnicate\nquit\n")
        .success()
        .stdout(str_contains("Error:"))
        .stdout(str_contains("Unknown command. Type 'help'."));
}

//! End-to-end checks of the CLI binary

use assert_cmd::Command;
use bugledger::model::Field;
use predicates::prelude::*;
use std::path::Path;

/// Build an uploadable workbook with the standard header row and one data
/// row per (id, description, owner, corrective status) tuple.
fn workbook(rows: &[(&str, &str, &str, &str)]) -> Vec<u8> {
    let mut wb = rust_xlsxwriter::Workbook::new();
    let mut ws = rust_xlsxwriter::Worksheet::new();

    for (col, field) in Field::ALL.iter().enumerate() {
        ws.write_string(0, col as u16, field.label()).unwrap();
    }
    for (row, (id, description, owner, status)) in rows.iter().enumerate() {
        let row = row as u32 + 1;
        ws.write_string(row, 2, *id).unwrap();
        ws.write_string(row, 3, *description).unwrap();
        ws.write_string(row, 11, *owner).unwrap();
        ws.write_string(row, 10, *status).unwrap();
    }
    wb.push_worksheet(ws);
    wb.save_to_buffer().unwrap()
}

fn bugledger(data_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("bugledger").unwrap();
    cmd.arg("--data-dir").arg(data_dir);
    cmd
}

#[test]
fn import_list_export_delete() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("ledger");
    let sheet = dir.path().join("bugs.xlsx");
    std::fs::write(
        &sheet,
        workbook(&[
            ("B-1", "login fails on Safari", "Navya", "Open"),
            ("B-2", "export broken", "Amogh", "Closed"),
        ]),
    )
    .unwrap();

    bugledger(&data_dir)
        .arg("import")
        .arg(&sheet)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 2 new bug(s)."));

    bugledger(&data_dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("B-1").and(predicate::str::contains("B-2")));

    bugledger(&data_dir)
        .args(["list", "--open"])
        .assert()
        .success()
        .stdout(predicate::str::contains("B-1").and(predicate::str::contains("B-2").not()));

    let summary = dir.path().join("summary.xlsx");
    bugledger(&data_dir)
        .arg("export")
        .arg("--output")
        .arg(&summary)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported"));
    assert!(summary.exists());

    bugledger(&data_dir)
        .args(["delete", "B-1", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted defect B-1"));

    bugledger(&data_dir)
        .args(["show", "B-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No record with incident id B-1"));
}

#[test]
fn duplicate_import_reports_skips() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("ledger");
    let sheet = dir.path().join("bugs.xlsx");
    std::fs::write(&sheet, workbook(&[("B-1", "a defect", "", "Open")])).unwrap();

    bugledger(&data_dir).arg("import").arg(&sheet).assert().success();

    bugledger(&data_dir)
        .arg("import")
        .arg(&sheet)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "No new bugs found. Skipped 1 already-tracked duplicate(s).",
        ));
}

#[test]
fn comment_and_show_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("ledger");
    let sheet = dir.path().join("bugs.xlsx");
    std::fs::write(&sheet, workbook(&[("B-1", "a defect", "", "Open")])).unwrap();

    bugledger(&data_dir).arg("import").arg(&sheet).assert().success();

    bugledger(&data_dir)
        .args(["comment", "B-1", "retested on UAT, still failing"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Comment posted on B-1"));

    bugledger(&data_dir)
        .args(["show", "B-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("retested on UAT, still failing"));
}

#[test]
fn garbage_upload_fails_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("ledger");
    let file = dir.path().join("notes.xlsx");
    std::fs::write(&file, b"definitely not a workbook").unwrap();

    bugledger(&data_dir)
        .arg("import")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a recognized spreadsheet format"));
}

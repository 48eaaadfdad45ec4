use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

fn custodian() -> Command {
    let mut cmd = Command::cargo_bin("custodian").expect("custodian binary");
    cmd.env_remove("CUSTODIAN_RETENTION_DAYS")
        .env_remove("CUSTODIAN_CONFIG_PATH");
    cmd
}

#[test]
fn sweep_is_a_no_op_when_quarantine_is_absent() {
    let tmp = tempdir().expect("tempdir");

    custodian()
        .current_dir(tmp.path())
        .arg("sweep")
        .assert()
        .success()
        .stdout(predicate::str::contains("deleted=0"));
}

#[test]
fn sweep_keeps_files_inside_the_retention_window() {
    let tmp = tempdir().expect("tempdir");
    let quarantined = tmp.path().join(".cleanup/blueprints/recent.xml");
    fs::create_dir_all(quarantined.parent().expect("parent")).expect("mkdir");
    fs::write(&quarantined, "<building/>").expect("write");

    custodian()
        .current_dir(tmp.path())
        .args(["sweep", "--execute"])
        .assert()
        .success()
        .stdout(predicate::str::contains("deleted=0"));

    assert!(quarantined.is_file());
}

#[test]
fn sweep_defaults_to_simulation() {
    let tmp = tempdir().expect("tempdir");
    let quarantined = tmp.path().join(".cleanup/images/old.png");
    fs::create_dir_all(quarantined.parent().expect("parent")).expect("mkdir");
    fs::write(&quarantined, "png").expect("write");

    custodian()
        .current_dir(tmp.path())
        .env("CUSTODIAN_RETENTION_DAYS", "1")
        .arg("sweep")
        .assert()
        .success()
        .stdout(predicate::str::contains("simulate=true"));

    assert!(quarantined.is_file());
}

mod common;

use anyhow::Result;
use common::{TestDir, set_file_mtime};
use predicates::prelude::*;
use std::fs;

#[test]
fn test_calc_prints_checksum_without_newline() -> Result<()> {
    let dir = TestDir::new()?;
    dir.write("digits", b"123456789", 1_000)?;

    dir.cmd()?
        .args(["calc", "digits"])
        .assert()
        .success()
        .stdout("e3069283");

    Ok(())
}

#[test]
fn test_calc_empty_file() -> Result<()> {
    let dir = TestDir::new()?;
    dir.write("empty", b"", 1_000)?;

    dir.cmd()?
        .args(["calc", "empty"])
        .assert()
        .success()
        .stdout("00000000");

    Ok(())
}

#[test]
fn test_calc_missing_file_fails() -> Result<()> {
    let dir = TestDir::new()?;

    dir.cmd()?
        .args(["calc", "missing"])
        .assert()
        .code(1)
        .stdout("")
        .stderr(predicate::str::contains("No such file or directory"));

    Ok(())
}

#[test]
fn test_update_then_check_is_clean() -> Result<()> {
    let dir = TestDir::new()?;
    dir.write("a.txt", b"alpha", 1_000)?;
    dir.write("b.txt", b"beta", 2_000)?;

    dir.cmd()?
        .arg("update")
        .assert()
        .success()
        .stdout(predicate::str::contains("a.txt").and(predicate::str::contains("b.txt")));

    let manifest = dir.manifest_text()?;
    assert_eq!(manifest.lines().count(), 2);
    assert!(manifest.contains("0000001000\ta.txt"));
    assert!(!manifest.contains("CRCS"));

    dir.cmd()?
        .arg("check")
        .assert()
        .code(0)
        .stdout(predicate::str::contains("All Files OK"));

    Ok(())
}

#[test]
fn test_second_update_reports_found() -> Result<()> {
    let dir = TestDir::new()?;
    dir.write("kept", b"unchanged", 1_000)?;

    dir.cmd()?.arg("update").assert().success();
    dir.cmd()?
        .arg("update")
        .assert()
        .success()
        .stdout(predicate::str::contains("FOUND"));

    Ok(())
}

#[test]
fn test_update_exits_0_when_manifest_cannot_be_written() -> Result<()> {
    let dir = TestDir::new()?;
    dir.write("a", b"a", 1_000)?;
    fs::create_dir(dir.file("CRCS"))?;
    dir.write("CRCS/occupied", b"x", 1_000)?;

    dir.cmd()?
        .arg("update")
        .assert()
        .code(0)
        .stderr(predicate::str::contains("Failed to write manifest"));

    assert!(dir.file("CRCS").is_dir());
    Ok(())
}

#[test]
fn test_update_exits_0_when_directory_is_missing() -> Result<()> {
    let dir = TestDir::new()?;

    assert_cmd::Command::cargo_bin("crcs")?
        .env("CRCS_CONFIG_PATH", dir.file("no-such-config.toml"))
        .env_remove("CRCS_MANIFEST")
        .arg("-C")
        .arg(dir.file("missing"))
        .arg("update")
        .assert()
        .code(0)
        .stderr(predicate::str::contains("Failed to read directory"));

    Ok(())
}

#[test]
fn test_check_without_manifest_exits_2() -> Result<()> {
    let dir = TestDir::new()?;
    dir.write("a", b"a", 1_000)?;

    dir.cmd()?
        .arg("check")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Cannot open manifest"));

    Ok(())
}

#[test]
fn test_check_reports_problems_and_exits_1() -> Result<()> {
    let dir = TestDir::new()?;
    dir.write("same-mtime", b"original", 1_000)?;
    dir.write("touched", b"original", 1_000)?;
    dir.write("deleted", b"original", 1_000)?;
    dir.cmd()?.arg("update").assert().success();

    fs::write(dir.file("same-mtime"), b"tampered")?;
    set_file_mtime(&dir.file("same-mtime"), 1_000)?;
    dir.write("touched", b"new content", 5_000)?;
    fs::remove_file(dir.file("deleted"))?;

    dir.cmd()?
        .arg("check")
        .assert()
        .code(1)
        .stdout(
            predicate::str::contains("BROKEN same-mtime")
                .and(predicate::str::contains("MODIFIED touched"))
                .and(predicate::str::contains("NFOUND deleted"))
                .and(predicate::str::contains("1 Files not found"))
                .and(predicate::str::contains("1 Files changed"))
                .and(predicate::str::contains("1 Files broken"))
                .and(predicate::str::contains("0 Other Errors")),
        );

    Ok(())
}

#[test]
fn test_quiet_check_prints_only_summary_when_clean() -> Result<()> {
    let dir = TestDir::new()?;
    dir.write("a", b"a", 1_000)?;
    dir.cmd()?.arg("update").assert().success();

    dir.cmd()?
        .args(["--quiet", "check"])
        .assert()
        .success()
        .stdout("All Files OK\n");

    Ok(())
}

#[test]
fn test_manifest_name_from_environment() -> Result<()> {
    let dir = TestDir::new()?;
    dir.write("a", b"a", 1_000)?;

    dir.cmd()?
        .env("CRCS_MANIFEST", "SUMS")
        .arg("update")
        .assert()
        .success();

    assert!(dir.file("SUMS").exists());
    assert!(!dir.file("CRCS").exists());

    Ok(())
}

#[test]
fn test_completion_generates_script() -> Result<()> {
    let dir = TestDir::new()?;

    dir.cmd()?
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("crcs"));

    Ok(())
}

//! CLI end-to-end tests that invoke the compiled `nvram-tweak` binary.
//!
//! Commands run with stdin closed, so every prompt takes the
//! non-interactive path.

use assert_cmd::Command;
use nvram_test_utils::{dump::TempDump, fixtures};
use predicates::prelude::*;

/// Get a Command for the nvram-tweak binary, isolated from the user config.
fn nvram_cmd(dump: &TempDump) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_nvram-tweak"));
    cmd.env("XDG_CONFIG_HOME", dump.dir().join("xdg"))
        .env("NO_COLOR", "1")
        .env_remove("NVRAM_TWEAK_CONFIG");
    cmd
}

fn path_arg(dump: &TempDump) -> String {
    dump.path().display().to_string()
}

// ============================================================================
// Help
// ============================================================================

#[test]
fn test_help_lists_commands() {
    let dump = TempDump::new("");
    nvram_cmd(&dump)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("edit"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("restore"));
}

// ============================================================================
// edit
// ============================================================================

#[test]
fn test_edit_option_writes_file_and_backup() {
    let dump = TempDump::new(fixtures::BASIC);
    nvram_cmd(&dump)
        .args(["edit", &path_arg(&dump), "Fast Boot", "Disabled", "--mode", "option", "--exact"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Enabled -> Disabled"))
        .stdout(predicate::str::contains("Backup written to"));

    dump.assert_contains("         *[01]Disabled\n");
    dump.assert_backup_exists(".bak");
    assert_eq!(
        std::fs::read(dump.backup_path(".bak")).unwrap(),
        fixtures::BASIC.as_bytes()
    );
}

#[test]
fn test_edit_hex_value_reports_conversion() {
    let dump = TempDump::new(fixtures::BASIC);
    nvram_cmd(&dump)
        .args(["edit", &path_arg(&dump), "Power Limit", "0x7d", "--mode", "value"])
        .assert()
        .success()
        .stdout(predicate::str::contains("125 (0x7D)"))
        .stdout(predicate::str::contains("converted to decimal 125"));

    dump.assert_contains("Value\t=<125>\n");
}

#[test]
fn test_edit_out_of_range_fails_without_writing() {
    let dump = TempDump::new(fixtures::BASIC);
    nvram_cmd(&dump)
        .args(["edit", &path_arg(&dump), "Power Limit", "300", "--mode", "value"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("outside [0, 200]"))
        .stderr(predicate::str::contains("error:"));

    assert_eq!(dump.read(), fixtures::BASIC.as_bytes());
    assert!(!dump.backup_path(".bak").exists());
}

#[test]
fn test_edit_dry_run_with_diff() {
    let dump = TempDump::new(fixtures::BASIC);
    nvram_cmd(&dump)
        .args([
            "edit",
            &path_arg(&dump),
            "Fast Boot",
            "01",
            "--mode",
            "option",
            "--dry-run",
            "--diff",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("+         *[01]Disabled"))
        .stdout(predicate::str::contains("Dry run"));

    assert_eq!(dump.read(), fixtures::BASIC.as_bytes());
}

#[test]
fn test_edit_ambiguous_lists_candidates() {
    let dump = TempDump::new(fixtures::DUPLICATE_NAMES);
    nvram_cmd(&dump)
        .args(["edit", &path_arg(&dump), "PCIe Port", "Gen1", "--mode", "option", "--exact"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("matches 2 blocks"))
        .stderr(predicate::str::contains("token 0x1"))
        .stderr(predicate::str::contains("token 0x2"));

    assert_eq!(dump.read(), fixtures::DUPLICATE_NAMES.as_bytes());
}

#[test]
fn test_edit_token_disambiguates() {
    let dump = TempDump::new(fixtures::DUPLICATE_NAMES);
    nvram_cmd(&dump)
        .args([
            "edit",
            &path_arg(&dump),
            "PCIe Port",
            "Gen1",
            "--mode",
            "option",
            "--exact",
            "--token",
            "2",
        ])
        .assert()
        .success();

    let written = dump.read_to_string();
    assert_eq!(written.matches("*[01]Gen1").count(), 1);
    assert_eq!(written.matches("*[00]Auto").count(), 2);
}

#[test]
fn test_edit_risky_block_needs_yes() {
    let dump = TempDump::new(fixtures::GUARDED_CRLF);
    nvram_cmd(&dump)
        .args(["edit", &path_arg(&dump), "Secure Boot", "Enabled", "--mode", "option"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes"));
    assert_eq!(dump.read(), fixtures::GUARDED_CRLF.as_bytes());

    nvram_cmd(&dump)
        .args(["edit", &path_arg(&dump), "Secure Boot", "Enabled", "--mode", "option", "--yes"])
        .assert()
        .success();
    dump.assert_contains("*[01]Enabled\r\n");
    dump.assert_contains("HIICrc32=AABBCCDD,ver=02\r\n");
}

#[test]
fn test_edit_crc_remove_requires_force() {
    let dump = TempDump::new(fixtures::GUARDED_CRLF);
    nvram_cmd(&dump)
        .args(["edit", &path_arg(&dump), "Boot Delay", "5", "--mode", "value", "--crc", "remove"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Unsafe CRC remove blocked"));
    assert_eq!(dump.read(), fixtures::GUARDED_CRLF.as_bytes());

    nvram_cmd(&dump)
        .args([
            "edit",
            &path_arg(&dump),
            "Boot Delay",
            "5",
            "--mode",
            "value",
            "--crc",
            "remove",
            "--force-unsafe-crc",
            "--yes",
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("CRC markers were bypassed"));

    let written = dump.read_to_string();
    assert!(!written.starts_with("HIICrc32"));
    assert!(written.contains("Value\t=<0x5>\r\n"));
}

#[test]
fn test_edit_uses_backup_suffix_from_config() {
    let dump = TempDump::new(fixtures::BASIC);
    let config = dump.write_config("backup_suffix = \".orig\"\n");
    nvram_cmd(&dump)
        .args([
            "--config",
            &config.display().to_string(),
            "edit",
            &path_arg(&dump),
            "Power Limit",
            "10",
            "--mode",
            "value",
        ])
        .assert()
        .success();

    dump.assert_backup_exists(".orig");
    assert!(!dump.backup_path(".bak").exists());
}

#[test]
fn test_malformed_dump_is_reported() {
    let dump = TempDump::new("Setup Question = Broken\nHelp String = no kind\n");
    nvram_cmd(&dump)
        .args(["edit", &path_arg(&dump), "Broken", "1", "--mode", "value"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Malformed block 'Broken' at lines 1-2"));
}

// ============================================================================
// list
// ============================================================================

#[test]
fn test_list_describes_blocks() {
    let dump = TempDump::new(fixtures::BASIC);
    nvram_cmd(&dump)
        .args(["list", &path_arg(&dump)])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Name: Fast Boot | Token: 12 | Selected option: Enabled",
        ))
        .stdout(predicate::str::contains(
            "Name: Power Limit | Token: 2A | Value: 100 (0x64) [0..200]",
        ))
        .stdout(predicate::str::contains("Help: Package power limit in watts."))
        .stdout(predicate::str::contains("3 of 3 blocks"));
}

#[test]
fn test_list_json_filters_by_query() {
    let dump = TempDump::new(fixtures::DUPLICATE_NAMES);
    let output = nvram_cmd(&dump)
        .args(["list", &path_arg(&dump), "pcie port", "--ignore-case", "--json", "--token", "0x3"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let blocks: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let blocks = blocks.as_array().unwrap();
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0]["name"], "PCIe Port Link Speed");
    assert_eq!(blocks[0]["kind"], "option");
    assert_eq!(blocks[0]["selected"], 0);
}

// ============================================================================
// restore
// ============================================================================

#[test]
fn test_restore_after_edit() {
    let dump = TempDump::new(fixtures::BASIC);
    nvram_cmd(&dump)
        .args(["edit", &path_arg(&dump), "Fast Boot", "Disabled", "--mode", "option"])
        .assert()
        .success();
    assert_ne!(dump.read(), fixtures::BASIC.as_bytes());

    nvram_cmd(&dump)
        .args(["restore", &path_arg(&dump)])
        .assert()
        .success()
        .stdout(predicate::str::contains("Restored"));
    assert_eq!(dump.read(), fixtures::BASIC.as_bytes());
}

#[test]
fn test_restore_without_backup_fails() {
    let dump = TempDump::new(fixtures::BASIC);
    nvram_cmd(&dump)
        .args(["restore", &path_arg(&dump)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No backup found"));
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tests for the "antab" subcommand.

mod arg_files;

use tempfile::TempDir;

use crate::{
    absolute_test_files, antabfs, get_cmd_output, read_antab, EXPECTED_ANTAB, LOG_FILE, RXG_DIR,
};

#[test]
fn test_antab_test_files() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let output = tmp_dir.path().join("out.antabfs");

    #[rustfmt::skip]
    let cmd = antabfs()
        .args([
            "antab",
            LOG_FILE,
            "--rxg-dir", RXG_DIR,
            "-o", &format!("{}", output.display()),
        ])
        .ok();
    let is_ok = cmd.is_ok();
    let (stdout, stderr) = get_cmd_output(cmd);
    assert!(is_ok, "{stderr}");
    assert_eq!(read_antab(&output), EXPECTED_ANTAB);

    // Another station's RXG file and a broken one are in the same directory.
    assert!(!stdout.contains("calWzX.rxg"));
    assert!(stdout.contains("calYsBroken.rxg"));
    assert!(stdout.contains("1 RXG file(s)"));
}

#[test]
fn test_default_output_is_in_current_dir() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let (log, rxg) = absolute_test_files();

    let cmd = antabfs()
        .current_dir(tmp_dir.path())
        .args(["antab", &log, "--rxg-dir", &rxg])
        .ok();
    assert!(cmd.is_ok(), "{}", get_cmd_output(cmd).1);
    assert_eq!(
        read_antab(&tmp_dir.path().join("r1234ys.antabfs")),
        EXPECTED_ANTAB
    );
}

#[test]
fn test_dry_run_writes_nothing() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let output = tmp_dir.path().join("out.antabfs");

    #[rustfmt::skip]
    let cmd = antabfs()
        .args([
            "antab",
            LOG_FILE,
            "--rxg-dir", RXG_DIR,
            "-o", &format!("{}", output.display()),
            "--dry-run",
        ])
        .ok();
    let is_ok = cmd.is_ok();
    let (stdout, stderr) = get_cmd_output(cmd);
    assert!(is_ok, "{stderr}");
    assert!(!output.exists());
    assert!(stdout.contains("Dry run"));
}

#[test]
fn test_explicit_rxg_files_ignore_the_station() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let output = tmp_dir.path().join("out.antabfs");

    #[rustfmt::skip]
    let cmd = antabfs()
        .args([
            "antab",
            LOG_FILE,
            "--rxg-files", "test_files/rxg/calWzX.rxg",
            "-o", &format!("{}", output.display()),
        ])
        .ok();
    assert!(cmd.is_ok(), "{}", get_cmd_output(cmd).1);
    let written = read_antab(&output);
    assert!(written.contains("!     LO=7600.00 MHz lcp calWzX.rxg 2019 06 01"));
    assert!(written.contains("GAIN YS ELEV DPFU=0.2,0.2 FREQ=7976.00,8024.00 POLY=1.0 /"));
    assert!(written.contains("bbc09, 8008.00 MHz , USB, BW= 16.00 MHz, Tcal=30.00 K"));
}

#[test]
fn test_station_override() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let output = tmp_dir.path().join("out.antabfs");

    #[rustfmt::skip]
    let cmd = antabfs()
        .args([
            "antab",
            LOG_FILE,
            "--rxg-dir", RXG_DIR,
            "--station", "wz",
            "-o", &format!("{}", output.display()),
        ])
        .ok();
    let is_ok = cmd.is_ok();
    let (stdout, stderr) = get_cmd_output(cmd);
    assert!(is_ok, "{stderr}");
    assert!(stdout.contains("Using station WZ rather than YS from the log file name"));
    let written = read_antab(&output);
    assert!(written.starts_with("! Amplitude calibration data for WZ in r1234."));
    assert!(written.contains("calWzX.rxg"));
    assert!(written.contains("TSYS WZ FT = 1.0 TIMEOFF=0"));
}

#[test]
fn test_bad_arguments() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");

    let cmd = antabfs()
        .args(["antab", "test_files/doesnt_exist.log"])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("The log file test_files/doesnt_exist.log doesn't exist"));

    let cmd = antabfs()
        .args(["antab", LOG_FILE, "--station", "XYZ"])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("'XYZ' isn't a two-letter station code"));

    let cmd = antabfs()
        .args(["antab", LOG_FILE, "--rxg-dir", RXG_DIR, "--integration-time", "0"])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("The integration time must be a positive number of seconds"));

    // An empty RXG directory is fatal.
    #[rustfmt::skip]
    let cmd = antabfs()
        .args([
            "antab",
            LOG_FILE,
            "--rxg-dir", &format!("{}", tmp_dir.path().display()),
        ])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("No RXG files were found in"));
}

#[test]
fn test_max_tsys_replaces_values() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let output = tmp_dir.path().join("out.antabfs");

    // 31.4 and 31.6 K are too high, and there are no other samples to
    // replace them with.
    #[rustfmt::skip]
    let cmd = antabfs()
        .args([
            "antab",
            LOG_FILE,
            "--rxg-dir", RXG_DIR,
            "--max-tsys", "20",
            "-o", &format!("{}", output.display()),
        ])
        .ok();
    let is_ok = cmd.is_ok();
    let (stdout, stderr) = get_cmd_output(cmd);
    assert!(is_ok, "{stderr}");
    assert!(stdout.contains("Replaced 2 Tsys value(s) outside (0, 20] K"));
    assert!(read_antab(&output).contains("\n100 10:00.08 16.4 16.6\n"));
}

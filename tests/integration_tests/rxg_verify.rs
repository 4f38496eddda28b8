// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tests for the "rxg-verify" subcommand.

use crate::{antabfs, get_cmd_output};

#[test]
fn test_rxg_verify_summary() {
    let cmd = antabfs()
        .args(["rxg-verify", "test_files/rxg/calYsX.rxg"])
        .ok();
    let is_ok = cmd.is_ok();
    let (stdout, stderr) = get_cmd_output(cmd);
    assert!(is_ok, "{stderr}");
    assert!(stdout.contains("LO range: 7000.00 to 9000.00 MHz"));
    assert!(stdout.contains("Dated 2020 01 01"));
    assert!(stdout.contains("DPFU 0.1, 0.11 (lcp, rcp)"));
    assert!(stdout.contains("Gain: ELEV POLY 0.95 2.3e-3"));
    assert!(stdout.contains("2 lcp Tcal row(s)"));
    assert!(stdout.contains("Tcal table spans 7900.00 to 8100.00 MHz"));
    assert!(stdout.contains("1 spillover row(s)"));
}

#[test]
fn test_rxg_verify_reports_bad_files() {
    let cmd = antabfs()
        .args([
            "rxg-verify",
            "test_files/rxg/calYsBroken.rxg",
            "test_files/rxg/calYsX.rxg",
        ])
        .ok();
    assert!(cmd.is_err());
    let (stdout, stderr) = get_cmd_output(cmd);
    // The good file is still summarised.
    assert!(stdout.contains("LO range: 7000.00 to 9000.00 MHz"));
    assert!(stderr.contains("1 of 2 RXG file(s) couldn't be read"));
}

#[test]
fn test_rxg_verify_is_described_in_help() {
    let cmd = antabfs().arg("--help").ok();
    let is_ok = cmd.is_ok();
    let (stdout, stderr) = get_cmd_output(cmd);
    assert!(is_ok, "{stderr}");
    assert!(stdout.contains("rxg-verify"));
    assert!(stdout.contains("Verify that RXG calibration files"));
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tests to ensure there is no stderr output for successful commands.

use tempfile::TempDir;

use crate::{antabfs, get_cmd_output, LOG_FILE, RXG_DIR};

#[test]
fn test_antab_no_stderr() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let output = tmp_dir.path().join("out.antabfs");

    #[rustfmt::skip]
    let cmd = antabfs()
        .args([
            "antab",
            LOG_FILE,
            "--rxg-dir", RXG_DIR,
            "-o", &format!("{}", output.display()),
            "-vv",
        ])
        .ok();
    assert!(
        cmd.is_ok(),
        "antab failed on simple test data: {}",
        cmd.err().unwrap()
    );
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.is_empty(), "stderr wasn't empty: {stderr}");
}

#[test]
fn test_rxg_verify_no_stderr() {
    #[rustfmt::skip]
    let cmd = antabfs()
        .args([
            "rxg-verify",
            "test_files/rxg/calYsX.rxg",
            "test_files/rxg/calWzX.rxg",
        ])
        .ok();
    assert!(
        cmd.is_ok(),
        "rxg-verify failed on simple test data: {}",
        cmd.err().unwrap()
    );
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.is_empty(), "stderr wasn't empty: {stderr}");
}

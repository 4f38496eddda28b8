// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Integration tests.
//!
//! Some help for laying out these tests was taken from:
//! https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html

mod antab;
mod no_stderr;
mod rxg_verify;

use std::{
    fs::File,
    path::{Path, PathBuf},
    process::Output,
    str::from_utf8,
};

use assert_cmd::{output::OutputError, Command};

const LOG_FILE: &str = "test_files/r1234ys.log";
const RXG_DIR: &str = "test_files/rxg";

/// The ANTAB file made from [`LOG_FILE`] and the YS files in [`RXG_DIR`],
/// without its "Produced on" line.
const EXPECTED_ANTAB: &str = "! Amplitude calibration data for YS in r1234.
! For use with AIPS task ANTAB.
! Waveband(s) = 3.9cm.
! RXG files used for each LO:
!   Setup 01
!     LO=7600.00 MHz lcp calYsX.rxg 2020 01 01
!     LO=7600.00 MHz rcp calYsX.rxg 2020 01 01
! DBBC used in mode DDC
GAIN YS ELEV DPFU=0.1,0.11 FREQ=7976.00,8024.00 POLY=0.95,2.3e-3 /
TSYS YS FT = 1.0 TIMEOFF=0
INDEX= 'R1','R2','L1','L2'
/
!
! Setup 01
! Calibration mode: CONT
!
!Column 1 = R1: ifA, bbc01, 7992.00 MHz , LSB, BW= 16.00 MHz, Tcal=10.92 K
!Column 2 = R2: ifA, bbc01, 8008.00 MHz , USB, BW= 16.00 MHz, Tcal=11.08 K
!Column 3 = L1: ifB, bbc09, 7992.00 MHz , LSB, BW= 16.00 MHz, Tcal=20.92 K
!Column 4 = L2: ifB, bbc09, 8008.00 MHz , USB, BW= 16.00 MHz, Tcal=21.08 K
! 100 10:00.05: scanNum=0001 scanName=100-1000 source=0059+581
100 10:00.08 16.4 16.6 31.4 31.6
! 100 10:00.09 55.0 60.0
/
";

fn antabfs() -> Command {
    Command::cargo_bin("antabfs").unwrap()
}

fn get_cmd_output(result: Result<Output, OutputError>) -> (String, String) {
    let output = match result {
        Ok(o) => o,
        Err(o) => o.as_output().unwrap().clone(),
    };
    (
        from_utf8(&output.stdout).unwrap().to_string(),
        from_utf8(&output.stderr).unwrap().to_string(),
    )
}

/// Absolute versions of [`LOG_FILE`] and [`RXG_DIR`].
fn absolute_test_files() -> (String, String) {
    let log = PathBuf::from(LOG_FILE).canonicalize().unwrap();
    let rxg = PathBuf::from(RXG_DIR).canonicalize().unwrap();
    assert!(
        log.exists(),
        "Could not find {}, which is required for this test",
        log.display()
    );
    (log.display().to_string(), rxg.display().to_string())
}

/// Read an ANTAB file, dropping the line that carries the date it was made.
fn read_antab(path: &Path) -> String {
    let contents = std::fs::read_to_string(path).unwrap();
    let mut kept = String::new();
    for line in contents.lines() {
        if line.starts_with("! Produced on") {
            assert!(line.ends_with(&format!(
                "using antabfs version {}",
                env!("CARGO_PKG_VERSION")
            )));
            continue;
        }
        kept.push_str(line);
        kept.push('\n');
    }
    kept
}

fn make_file_in_dir<T: AsRef<Path>, U: AsRef<Path>>(filename: T, dir: U) -> (PathBuf, File) {
    let path = dir.as_ref().join(filename);
    let f = File::create(&path).expect("couldn't make file");
    (path, f)
}

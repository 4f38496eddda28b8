// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Code to verify RXG files.

use std::path::{Path, PathBuf};

use clap::Parser;
use itertools::Itertools;
use log::info;

use crate::{
    catalog::{read_rxg_file, LoApplicability, Polarisation},
    AntabfsError,
};

/// Verify that RXG files can be read by antabfs.
#[derive(Parser, Debug)]
pub struct RxgVerifyArgs {
    /// Path to the RXG file(s) to be verified.
    #[clap(name = "RXG_FILES", parse(from_os_str))]
    rxg_files: Vec<PathBuf>,
}

impl RxgVerifyArgs {
    /// Run [verify] with these arguments.
    pub fn run(&self) -> Result<(), AntabfsError> {
        let num_bad = verify(&self.rxg_files);
        if num_bad > 0 {
            return Err(AntabfsError::Rxg(format!(
                "{num_bad} of {} RXG file(s) couldn't be read",
                self.rxg_files.len()
            )));
        }
        Ok(())
    }
}

/// Read and print stats out for each RXG file. If a file couldn't be read,
/// print the error, and continue trying to read the other files. Returns the
/// number of files that couldn't be read.
fn verify<P: AsRef<Path>>(rxg_files: &[P]) -> usize {
    if rxg_files.is_empty() {
        info!("No RXG files were supplied!");
    }

    let mut num_bad = 0;
    for rxg_file in rxg_files {
        info!("{}:", rxg_file.as_ref().display());
        let curve = match read_rxg_file(rxg_file) {
            Ok(c) => c,
            Err(e) => {
                info!("{}", e);
                info!("");
                num_bad += 1;
                continue;
            }
        };

        match &curve.lo {
            LoApplicability::Fixed(los) => info!(
                "    Fixed LO(s): {} MHz",
                los.iter().map(|lo| format!("{lo:.2}")).join(", ")
            ),
            LoApplicability::Range { min, max } => {
                info!("    LO range: {min:.2} to {max:.2} MHz")
            }
        }
        info!("    Dated {}", curve.date);
        info!(
            "    DPFU {} ({})",
            curve.dpfu.join(", "),
            curve.pols.iter().join(", ")
        );
        info!(
            "    Gain: {} {} {}",
            curve.gain.variable,
            curve.gain.kind,
            curve.gain.coeffs.join(" ")
        );
        for pol in [Polarisation::Lcp, Polarisation::Rcp] {
            let num_rows = curve.tcal.iter().filter(|e| e.pol == pol).count();
            if num_rows > 0 {
                info!("    {num_rows} {pol} Tcal row(s)");
            }
        }
        if let Some((lo, hi)) = curve.tcal_span() {
            info!("    Tcal table spans {lo:.2} to {hi:.2} MHz");
        }
        info!("    {} spillover row(s)", curve.spillover.len());
        info!("");
    }

    num_bad
}

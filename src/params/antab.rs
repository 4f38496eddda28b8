// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use log::{info, warn};

use crate::{
    antab::{prefilter, write_antab_file, AntabMeta, AntabSummary, WriteAntabError},
    catalog::Catalog,
    fslog::{read_log_file, ReadLogError},
};

pub(crate) struct AntabParams {
    pub(crate) log_file: PathBuf,
    pub(crate) catalog: Catalog,
    pub(crate) meta: AntabMeta,

    /// The length of each Tsys integration window [seconds].
    pub(crate) integration_time_s: f64,

    /// If set, Tsys values outside (0, max_tsys] are replaced before writing.
    pub(crate) max_tsys: Option<f64>,

    pub(crate) output: PathBuf,
}

impl AntabParams {
    pub(crate) fn run(&self) -> Result<AntabSummary, AntabError> {
        let Self {
            log_file,
            catalog,
            meta,
            integration_time_s,
            max_tsys,
            output,
        } = self;

        info!("Reading {}", log_file.display());
        let mut data = read_log_file(log_file, catalog, *integration_time_s)?;
        info!(
            "Found {} setup(s), {} scan(s) and {} Tsys sample(s)",
            data.setups.len(),
            data.scans.len(),
            data.samples.len()
        );
        if data.num_skipped_lines > 0 {
            warn!(
                "{} log line(s) couldn't be understood and were skipped",
                data.num_skipped_lines
            );
        }

        if let Some(max_tsys) = max_tsys {
            let num_replaced = prefilter(&mut data.samples, *max_tsys);
            info!("Replaced {num_replaced} Tsys value(s) outside (0, {max_tsys}] K");
        }

        let summary = write_antab_file(output, &data, catalog, meta)?;
        info!(
            "Wrote {} ({} TSYS block(s), {} scan(s), {} Tsys line(s))",
            output.display(),
            summary.num_blocks,
            summary.num_scans,
            summary.num_samples
        );
        Ok(summary)
    }
}

#[derive(thiserror::Error, Debug)]
pub(crate) enum AntabError {
    #[error(transparent)]
    Log(#[from] ReadLogError),

    #[error(transparent)]
    Write(#[from] WriteAntabError),
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Writing the body of an ANTAB file.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use itertools::Itertools;
use log::{debug, trace, warn};

use super::{gain_lines, header_block, index_line, preamble, AntabMeta, WriteAntabError};
use crate::{
    catalog::Catalog,
    fslog::{LogData, LoggedTsys, Scan, SetupActivation, Tsys, TsysSample},
    time::LogTime,
};

/// Something that appears in the body of an ANTAB file. The variants are in
/// the order used to break ties between items at the same instant.
#[derive(Debug, Clone, Copy)]
enum BodyItem<'a> {
    Activation(&'a SetupActivation),
    Scan(&'a Scan),
    Logged(&'a LoggedTsys),
    Sample(&'a TsysSample),
}

impl BodyItem<'_> {
    fn key(&self) -> (LogTime, u8) {
        match self {
            BodyItem::Activation(a) => (a.time, 0),
            BodyItem::Scan(s) => (s.time, 1),
            BodyItem::Logged(l) => (l.time, 2),
            BodyItem::Sample(s) => (s.time, 3),
        }
    }
}

/// `%.1f` values separated by spaces. Unavailable values are left out.
fn format_values(values: &[Tsys]) -> String {
    values
        .iter()
        .filter_map(|t| t.value())
        .map(|v| format!(" {v:.1}"))
        .collect()
}

/// What was written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AntabSummary {
    /// The number of `TSYS` blocks.
    pub num_blocks: usize,
    pub num_samples: usize,
    pub num_scans: usize,
}

/// Write a complete ANTAB file.
pub fn write_antab<T: Write>(
    buf: &mut T,
    data: &LogData,
    catalog: &Catalog,
    meta: &AntabMeta,
) -> Result<AntabSummary, WriteAntabError> {
    for line in preamble(meta, data, catalog) {
        writeln!(buf, "{line}")?;
    }

    let items = data
        .activations
        .iter()
        .map(BodyItem::Activation)
        .merge_by(data.scans.iter().map(BodyItem::Scan), |a, b| {
            a.key() <= b.key()
        })
        .merge_by(data.logged_tsys.iter().map(BodyItem::Logged), |a, b| {
            a.key() <= b.key()
        })
        .merge_by(data.samples.iter().map(BodyItem::Sample), |a, b| {
            a.key() <= b.key()
        });

    let mut summary = AntabSummary::default();
    // The setup of the open TSYS block.
    let mut open: Option<&str> = None;
    let mut warned_setups = HashSet::new();
    for item in items {
        match item {
            BodyItem::Activation(a) => {
                let setup = match data.setups.get(&a.setup) {
                    Some(s) if s.channel_list().next().is_some() => s,
                    _ => {
                        if warned_setups.insert(a.setup.as_str()) {
                            warn!(
                                "Setup {} has no usable channels; its data won't be written",
                                a.setup
                            );
                        }
                        continue;
                    }
                };

                if open.is_some() {
                    writeln!(buf, "/")?;
                }
                for line in gain_lines(setup, catalog, &meta.station) {
                    writeln!(buf, "{line}")?;
                }
                writeln!(buf, "TSYS {} FT = 1.0 TIMEOFF=0", meta.station)?;
                writeln!(buf, "{}", index_line(setup))?;
                writeln!(buf, "/")?;
                for line in header_block(setup) {
                    writeln!(buf, "{line}")?;
                }
                open = Some(setup.id.as_str());
                summary.num_blocks += 1;
            }

            BodyItem::Scan(s) => {
                if open.is_none() {
                    continue;
                }
                writeln!(
                    buf,
                    "! {}: scanNum={:04} scanName={} source={}",
                    s.time.antab_format(),
                    s.number,
                    s.name,
                    s.source
                )?;
                summary.num_scans += 1;
            }

            BodyItem::Logged(l) => {
                if open != Some(l.setup.as_str()) {
                    continue;
                }
                writeln!(
                    buf,
                    "! {}{}",
                    l.time.antab_format(),
                    format_values(&l.values)
                )?;
            }

            BodyItem::Sample(s) => {
                if open != Some(s.setup.as_str()) {
                    trace!("{}: Sample of setup {} is outside its block", s.time, s.setup);
                    continue;
                }
                let values = format_values(&s.values);
                if values.is_empty() {
                    continue;
                }
                writeln!(buf, "{}{values}", s.time.antab_format())?;
                summary.num_samples += 1;
            }
        }
    }

    if open.is_some() {
        writeln!(buf, "/")?;
    } else {
        warn!("No setup had any channels; the ANTAB file has no Tsys data");
    }
    debug!("{summary:?}");
    Ok(summary)
}

/// Write a complete ANTAB file to `path`.
pub fn write_antab_file<P: AsRef<Path>>(
    path: P,
    data: &LogData,
    catalog: &Catalog,
    meta: &AntabMeta,
) -> Result<AntabSummary, WriteAntabError> {
    let path = path.as_ref();
    let f = File::create(path).map_err(|err| WriteAntabError::Create {
        file: path.display().to_string(),
        err,
    })?;
    let mut buf = BufWriter::new(f);
    let summary = write_antab(&mut buf, data, catalog, meta)?;
    buf.flush()?;
    Ok(summary)
}

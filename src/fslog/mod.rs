// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Reading Field System logs.
//!
//! A log is read in a single pass. Configuration directives build up
//! [`Setup`]s, and power measurements taken while data is valid are gathered
//! into integration windows; each finished window gives a [`TsysSample`].

mod buffers;
mod classify;
mod error;
mod parser;
mod setup;
mod tsys;

pub use buffers::{window_complete, BufferSet, Samples, SingleRole};
pub use classify::{classify, ClassifiedLine, LineKind};
pub use error::ReadLogError;
pub(crate) use error::LineError;
pub use parser::LogParser;
pub use setup::{
    sky_frequency, BbcDefinition, CalMode, Channel, DbbcMode, LoSetting, Setup, Sideband,
};
pub use tsys::{channel_tsys, window_tsys, Tsys};

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use indexmap::IndexMap;

use crate::{catalog::Catalog, time::LogTime};

/// The Tsys values of one integration window.
#[derive(Debug, Clone, PartialEq)]
pub struct TsysSample {
    pub time: LogTime,
    pub setup: String,
    pub scan: u32,
    /// One value per channel of the setup, in channel-code order.
    pub values: Vec<Tsys>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scan {
    pub number: u32,
    pub name: String,
    pub source: String,
    pub time: LogTime,
}

/// Tsys values calculated by the Field System itself.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggedTsys {
    pub time: LogTime,
    pub setup: String,
    /// One value per channel of the setup, in channel-code order.
    pub values: Vec<Tsys>,
}

/// The moment that a setup became active.
#[derive(Debug, Clone, PartialEq)]
pub struct SetupActivation {
    pub time: LogTime,
    pub setup: String,
}

/// Everything learned from a log.
#[derive(Debug, Clone, Default)]
pub struct LogData {
    pub dbbc_mode: Option<DbbcMode>,
    pub form: Option<String>,
    pub setups: IndexMap<String, Setup>,
    pub activations: Vec<SetupActivation>,
    pub scans: Vec<Scan>,
    pub samples: Vec<TsysSample>,
    pub logged_tsys: Vec<LoggedTsys>,
    /// Lines that were skipped because they couldn't be understood.
    pub num_skipped_lines: usize,
}

/// The experiment and station encoded in a log's file name, e.g.
/// `r1234ys.log` is experiment "r1234" at station "YS".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogName {
    pub experiment: String,
    pub station: String,
}

impl LogName {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<LogName, ReadLogError> {
        let path = path.as_ref();
        let bad = || ReadLogError::BadLogName {
            file: path.display().to_string(),
        };
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(bad)?;
        let stem = name.split('.').next().unwrap_or_default();
        let num_chars = stem.chars().count();
        if num_chars < 3 {
            return Err(bad());
        }
        let experiment = stem.chars().take(num_chars - 2).collect::<String>();
        let station = stem.chars().skip(num_chars - 2).collect::<String>();
        Ok(LogName {
            experiment: experiment.to_lowercase(),
            station: station.to_uppercase(),
        })
    }
}

/// Read a whole log file.
pub fn read_log_file<P: AsRef<Path>>(
    path: P,
    catalog: &Catalog,
    integration_time_s: f64,
) -> Result<LogData, ReadLogError> {
    let path = path.as_ref();
    let f = File::open(path).map_err(|err| ReadLogError::Open {
        file: path.display().to_string(),
        err,
    })?;
    let parser = LogParser::new(catalog, integration_time_s);
    parser.parse(&mut BufReader::new(f))
}

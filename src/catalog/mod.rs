// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A catalog of receiver calibration curves (RXG files).
//!
//! The catalog is read once, before a log is parsed, and is read-only
//! afterwards. Lookups go by LO frequency; the first RXG file (in listing
//! order) whose LO declaration contains the frequency is used.

mod error;
mod rxg;
#[cfg(test)]
mod tests;

pub use error::{CatalogError, RxgError};
pub use rxg::{
    parse_rxg, read_rxg_file, CalibrationCurve, GainCurve, LoApplicability, Polarisation,
    RxgField, TcalEntry,
};

use std::path::PathBuf;

use log::{debug, warn};
use vec1::Vec1;

use crate::{constants::RXG_EXTENSION, glob::get_files_with_extension};

/// Where to find RXG files.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogConfig {
    /// Use all RXG files in this directory whose names contain the station
    /// code.
    Directory(PathBuf),

    /// Use exactly these files, in this order. Station codes in the file names
    /// are not checked.
    Files(Vec<PathBuf>),
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    curves: Vec<CalibrationCurve>,
}

impl Catalog {
    /// Read all of the RXG files available to a station. It is an error for
    /// the configured location to have no RXG files at all; files that can't be
    /// read are reported and skipped.
    pub fn load(config: &CatalogConfig, station: &str) -> Result<Catalog, CatalogError> {
        let (files, location, check_station) = match config {
            CatalogConfig::Directory(dir) => (
                get_files_with_extension(dir, RXG_EXTENSION)?,
                dir.display().to_string(),
                true,
            ),
            CatalogConfig::Files(files) => (files.clone(), "the supplied file list".to_string(), false),
        };
        let files = Vec1::try_from_vec(files).map_err(|_| CatalogError::NoFiles { location })?;

        let code = station_file_code(station);
        let mut curves = vec![];
        for file in files {
            if check_station {
                let name = file
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                if !name.contains(&code) {
                    debug!("Skipping {}; it doesn't belong to station {code}", file.display());
                    continue;
                }
            }

            match read_rxg_file(&file) {
                Ok(c) => {
                    debug!("Read {}", file.display());
                    curves.push(c);
                }
                Err(e) => warn!("Ignoring RXG file: {e}"),
            }
        }

        if curves.is_empty() {
            warn!("No usable RXG files for station {station}; Tcal values will be unavailable");
        }
        Ok(Catalog { curves })
    }

    pub fn from_curves(curves: Vec<CalibrationCurve>) -> Catalog {
        Catalog { curves }
    }

    pub fn curves(&self) -> &[CalibrationCurve] {
        &self.curves
    }

    /// Find the calibration curve for an LO frequency.
    pub fn find(&self, lo_mhz: f64) -> Option<&CalibrationCurve> {
        self.curves.iter().find(|c| c.lo.contains(lo_mhz))
    }

    /// Get the Tcal for a sky frequency observed through an LO. `None` if no
    /// RXG file applies to the LO, or the frequency isn't covered by the Tcal
    /// table.
    pub fn tcal(&self, lo_mhz: f64, pol: Polarisation, freq_mhz: f64) -> Option<f64> {
        self.find(lo_mhz).and_then(|c| c.tcal_at(pol, freq_mhz))
    }
}

/// RXG files are named after the station with its code in "title case", e.g.
/// station YS uses files like "calYsQ.rxg".
pub(crate) fn station_file_code(station: &str) -> String {
    let mut chars = station.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(|c| c.to_lowercase()))
            .collect(),
        None => String::new(),
    }
}

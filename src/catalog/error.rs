// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

use super::RxgField;
use crate::glob::GlobError;

/// Errors associated with reading a single RXG file.
#[derive(Error, Debug)]
pub enum RxgError {
    #[error("RXG file {file}: Expected a {field} line, but the file ended")]
    MissingField { file: String, field: RxgField },

    #[error("RXG file {file} line {line_num}: The {field} line has {got} values; expected {expected}")]
    Arity {
        file: String,
        line_num: u32,
        field: RxgField,
        got: usize,
        expected: String,
    },

    #[error("RXG file {file}: The {field} has no '{terminator}' line")]
    MissingTerminator {
        file: String,
        field: RxgField,
        terminator: &'static str,
    },

    #[error("RXG file {file} line {line_num}: Couldn't parse '{string}' as a number")]
    ParseFloat {
        file: String,
        line_num: u32,
        string: String,
    },

    #[error("RXG file {file} line {line_num}: The LO type must be 'range' or 'fixed', not '{string}'")]
    UnknownLoType {
        file: String,
        line_num: u32,
        string: String,
    },

    #[error("RXG file {file} line {line_num}: Unknown polarisation '{string}' (expected lcp or rcp)")]
    UnknownPol {
        file: String,
        line_num: u32,
        string: String,
    },

    #[error(transparent)]
    IO(#[from] std::io::Error),
}

/// Errors associated with assembling a calibration catalog.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("No RXG files were found in {location}")]
    NoFiles { location: String },

    #[error(transparent)]
    Glob(#[from] GlobError),
}

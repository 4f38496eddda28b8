// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error type for all antabfs-related errors. This should be the *only* error
//! enum that is publicly visible.

use thiserror::Error;

use super::antab::AntabArgsError;
use crate::{
    antab::WriteAntabError,
    catalog::{CatalogError, RxgError},
    fslog::ReadLogError,
    glob::GlobError,
    params::AntabError,
};

const RXG_HELP: &str = "RXG files are normally found in /usr2/control/rxg_files on a Field System computer";

/// The *only* publicly visible error from antabfs. Each error message should
/// include some help, unless it's "generic".
#[derive(Error, Debug)]
pub enum AntabfsError {
    /// An error related to the antab subcommand.
    #[error("{0}")]
    Antab(String),

    /// An error related to reading a Field System log.
    #[error("{0}\n\nLog files are expected to be named like <experiment><station>.log, e.g. r1234ys.log")]
    Log(String),

    /// An error related to a single RXG file.
    #[error("{0}\n\n{RXG_HELP}")]
    Rxg(String),

    /// An error related to finding RXG files.
    #[error("{0}\n\n{RXG_HELP}; use --rxg-dir or --rxg-files to look elsewhere")]
    Catalog(String),

    /// An error related to argument files.
    #[error("{0}\n\nArgument files are TOML or JSON files with the same keys as the long command-line arguments")]
    ArgFile(String),

    /// A generic error that can't be clarified further with documentation, e.g.
    /// IO errors.
    #[error("{0}")]
    Generic(String),
}

// When changing the error propagation below, ensure `Self::from(e)` uses the
// correct `e`!

// Binary sub-command errors.

impl From<AntabArgsError> for AntabfsError {
    fn from(e: AntabArgsError) -> Self {
        match e {
            AntabArgsError::NoLogFile
            | AntabArgsError::BadIntegrationTime(_)
            | AntabArgsError::BadMaxTsys(_)
            | AntabArgsError::BadStation(_) => Self::Antab(e.to_string()),
            AntabArgsError::LogDoesntExist(_) => Self::Log(e.to_string()),
            AntabArgsError::Log(e) => Self::from(e),
        }
    }
}

impl From<AntabError> for AntabfsError {
    fn from(e: AntabError) -> Self {
        match e {
            AntabError::Log(e) => Self::from(e),
            AntabError::Write(e) => Self::from(e),
        }
    }
}

// Library code errors.

impl From<ReadLogError> for AntabfsError {
    fn from(e: ReadLogError) -> Self {
        let s = e.to_string();
        match e {
            ReadLogError::Open { .. } | ReadLogError::BadLogName { .. } => Self::Log(s),
            ReadLogError::IO(_) => Self::Generic(s),
        }
    }
}

impl From<RxgError> for AntabfsError {
    fn from(e: RxgError) -> Self {
        let s = e.to_string();
        match e {
            RxgError::IO(_) => Self::Generic(s),
            _ => Self::Rxg(s),
        }
    }
}

impl From<CatalogError> for AntabfsError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::NoFiles { .. } => Self::Catalog(e.to_string()),
            CatalogError::Glob(e) => Self::from(e),
        }
    }
}

impl From<WriteAntabError> for AntabfsError {
    fn from(e: WriteAntabError) -> Self {
        let s = e.to_string();
        match e {
            WriteAntabError::Create { .. } => Self::Antab(s),
            WriteAntabError::IO(_) => Self::Generic(s),
        }
    }
}

impl From<GlobError> for AntabfsError {
    fn from(e: GlobError) -> Self {
        Self::Generic(e.to_string())
    }
}

impl From<std::io::Error> for AntabfsError {
    fn from(e: std::io::Error) -> Self {
        Self::Generic(e.to_string())
    }
}

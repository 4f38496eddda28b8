// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Errors that stop a log from being read at all.
#[derive(Error, Debug)]
pub enum ReadLogError {
    #[error("Couldn't open log file {file}: {err}")]
    Open { file: String, err: std::io::Error },

    #[error("Couldn't determine the station and experiment from the log file name {file}; expected something like 'r1234ys.log'")]
    BadLogName { file: String },

    #[error(transparent)]
    IO(#[from] std::io::Error),
}

/// Problems with a single log line. These are reported, the line is skipped,
/// and reading continues.
#[derive(Error, Debug, PartialEq)]
pub(crate) enum LineError {
    #[error("{directive} directive is missing its {field}")]
    MissingField {
        directive: &'static str,
        field: &'static str,
    },

    #[error("Couldn't parse '{string}' as a number")]
    ParseFloat { string: String },

    #[error("Couldn't parse '{string}' as a hexadecimal mask")]
    ParseHex { string: String },

    #[error("Unrecognised {what} '{string}'")]
    Unrecognised { what: &'static str, string: String },

    #[error("{directive} directive appears before any setup")]
    NoSetup { directive: &'static str },
}

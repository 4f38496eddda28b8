// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! ANTAB files: system temperatures and gain curves in the form read by the
//! AIPS task ANTAB.

mod error;
mod filter;
mod header;
mod write;

pub use error::WriteAntabError;
pub use filter::prefilter;
pub use header::{gain_lines, header_block, index_line, preamble, wavebands};
pub use write::{write_antab, write_antab_file, AntabSummary};

use chrono::NaiveDate;

/// Details written into the preamble of an ANTAB file.
#[derive(Debug, Clone, PartialEq)]
pub struct AntabMeta {
    /// Two-letter station code, e.g. "YS".
    pub station: String,
    pub experiment: String,
    pub produced: NaiveDate,
    pub version: String,
}

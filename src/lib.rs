// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Amplitude-calibration (ANTAB) files from Field System logs.

A Field System log records the configuration of a VLBI station's backend and
the total powers it measured with the noise diode on and off. Together with
the receiver calibration (RXG) files of the station, these give the system
temperature of every channel, which is written out in the form expected by the
AIPS task ANTAB.
 */

pub mod antab;
pub mod catalog;
mod cli;
pub mod constants;
pub mod fslog;
pub mod glob;
mod params;
pub mod time;

// Re-exports.
pub use antab::{write_antab, write_antab_file, AntabMeta};
pub use catalog::{Catalog, CatalogConfig};
pub use cli::{Antabfs, AntabfsError};
pub use fslog::{read_log_file, LogData, LogParser};

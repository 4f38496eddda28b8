// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Useful constants.

All frequencies are in MHz, all temperatures are in K.
 */

/// The default length of a Tsys integration window [seconds].
pub const DEFAULT_INTEGRATION_TIME_S: f64 = 1.0;

/// A window may only close if the next line of the log is at least this far
/// away [milliseconds].
pub const MIN_WINDOW_GAP_MS: i64 = 100;

/// The gap assumed after the last line of a log (or before a line without a
/// readable timestamp) [milliseconds].
pub const END_OF_LOG_GAP_MS: i64 = 200;

/// The value used when a Tsys cannot be determined.
pub const TSYS_SENTINEL: f64 = -1.0;

/// An RXG file declared with a `fixed` LO applies to LO frequencies within
/// this distance of the declared value [MHz].
pub const FIXED_LO_TOLERANCE_MHZ: f64 = 10.0;

/// The default directory for RXG files on a Field System computer.
pub const DEFAULT_RXG_DIR: &str = "/usr2/control/rxg_files";

/// The file extension of RXG files.
pub const RXG_EXTENSION: &str = "rxg";

/// The file extension given to ANTAB files.
pub const ANTAB_EXTENSION: &str = "antabfs";

/// Every PFB channel has this bandwidth [MHz].
pub const PFB_BANDWIDTH_MHZ: f64 = 32.0;

/// The BBC frequencies of the 16 PFB sub-bands [MHz], indexed by the two
/// digits of a PFB channel code (e.g. `a05` -> 880 MHz).
pub const PFB_BBC_FREQS_MHZ: [f64; 16] = [
    1040.0, 1008.0, 976.0, 944.0, 912.0, 880.0, 848.0, 816.0, 784.0, 752.0, 720.0, 688.0, 656.0,
    624.0, 592.0, 560.0,
];

/// From this day onwards (UTC), the first value of each `tpcont` triple is the
/// noise-diode-on power. Before it, the order was swapped.
pub const CONT_CAL_SWAP_DATE: (i32, u32, u32) = (2015, 9, 17);

/// Speed of light, rounded as it is for waveband annotations [m/s].
pub const VEL_C: f64 = 3e8;

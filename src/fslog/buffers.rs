// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Accumulation of raw power measurements into integration windows.

use std::collections::BTreeMap;

use chrono::Duration;

use super::CalMode;
use crate::{
    constants::{END_OF_LOG_GAP_MS, MIN_WINDOW_GAP_MS},
    time::LogTime,
};

/// Samples keyed by channel code.
pub type Samples = BTreeMap<String, Vec<f64>>;

/// The roles a SINGLE-mode measurement can play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SingleRole {
    /// `#tpicd#tpi/`, measured continuously while recording.
    Reference,
    /// `/tpi/`, noise diode off.
    Prime,
    /// `/tpical/`, noise diode on.
    Cal,
    /// `/tpdiff/`, on minus off.
    Diff,
}

/// The buffers of the active setup. The variant always matches the setup's
/// calibration mode; switching modes means starting from scratch.
#[derive(Debug, Clone, PartialEq)]
pub enum BufferSet {
    Single {
        reference: Samples,
        prime: Samples,
        cal: Samples,
        diff: Samples,
    },
    Cont {
        /// The first value of each `tpcont` triple.
        first: Samples,
        /// The second value of each `tpcont` triple.
        second: Samples,
    },
}

impl BufferSet {
    pub fn new(mode: CalMode) -> BufferSet {
        match mode {
            CalMode::Single => BufferSet::Single {
                reference: Samples::new(),
                prime: Samples::new(),
                cal: Samples::new(),
                diff: Samples::new(),
            },
            CalMode::Cont => BufferSet::Cont {
                first: Samples::new(),
                second: Samples::new(),
            },
        }
    }

    pub fn mode(&self) -> CalMode {
        match self {
            BufferSet::Single { .. } => CalMode::Single,
            BufferSet::Cont { .. } => CalMode::Cont,
        }
    }

    /// Add a SINGLE-mode sample. Returns `false` (and does nothing) if these
    /// are CONT buffers.
    pub fn push_single(&mut self, role: SingleRole, code: &str, value: f64) -> bool {
        match self {
            BufferSet::Single {
                reference,
                prime,
                cal,
                diff,
            } => {
                let samples = match role {
                    SingleRole::Reference => reference,
                    SingleRole::Prime => prime,
                    SingleRole::Cal => cal,
                    SingleRole::Diff => diff,
                };
                samples.entry(code.to_string()).or_default().push(value);
                true
            }
            BufferSet::Cont { .. } => false,
        }
    }

    /// Add a CONT-mode sample pair. Returns `false` (and does nothing) if these
    /// are SINGLE buffers.
    pub fn push_cont(&mut self, code: &str, first_value: f64, second_value: f64) -> bool {
        match self {
            BufferSet::Cont { first, second } => {
                first.entry(code.to_string()).or_default().push(first_value);
                second.entry(code.to_string()).or_default().push(second_value);
                true
            }
            BufferSet::Single { .. } => false,
        }
    }

    /// Forget the samples of a finished window. Off-source calibration
    /// measurements (prime, cal and diff) are kept for later windows.
    pub fn clear_window(&mut self) {
        match self {
            BufferSet::Single { reference, .. } => reference.clear(),
            BufferSet::Cont { first, second } => {
                first.clear();
                second.clear();
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            BufferSet::Single {
                reference,
                prime,
                cal,
                diff,
            } => reference.is_empty() && prime.is_empty() && cal.is_empty() && diff.is_empty(),
            BufferSet::Cont { first, second } => first.is_empty() && second.is_empty(),
        }
    }
}

/// Has the window that started at `start` finished at `now`? It must be at
/// least `integration` long, and the next line of the log (if any) must not
/// follow closely.
pub fn window_complete(
    start: LogTime,
    now: LogTime,
    next: Option<LogTime>,
    integration: Duration,
) -> bool {
    let gap = match next {
        Some(next) => next.since(now),
        None => Duration::milliseconds(END_OF_LOG_GAP_MS),
    };
    now.since(start) >= integration && gap > Duration::milliseconds(MIN_WINDOW_GAP_MS)
}

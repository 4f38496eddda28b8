// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! System-temperature calculations.

use std::collections::BTreeMap;

use super::BufferSet;
use crate::{constants::TSYS_SENTINEL, time::LogTime};

/// A system temperature, or the lack of one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tsys {
    Value(f64),
    Unavailable,
}

impl Tsys {
    /// The value as written in ANTAB-style tables; unavailable values are
    /// [`TSYS_SENTINEL`].
    pub fn as_f64(self) -> f64 {
        match self {
            Tsys::Value(v) => v,
            Tsys::Unavailable => TSYS_SENTINEL,
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            Tsys::Value(v) => Some(v),
            Tsys::Unavailable => None,
        }
    }

    pub fn is_value(self) -> bool {
        matches!(self, Tsys::Value(_))
    }
}

fn mean(samples: Option<&Vec<f64>>) -> Option<f64> {
    match samples {
        Some(s) if !s.is_empty() => Some(s.iter().sum::<f64>() / s.len() as f64),
        _ => None,
    }
}

/// The Tsys of one channel from the buffers of a window ending at `at`.
/// `None` means that the channel wasn't measured at all (SINGLE mode without
/// any calibration measurements).
pub fn channel_tsys(
    buffers: &BufferSet,
    code: &str,
    tcal: Option<f64>,
    at: LogTime,
) -> Option<Tsys> {
    let tcal = match tcal {
        Some(t) if t != 0.0 => t,
        _ => return Some(Tsys::Unavailable),
    };

    match buffers {
        BufferSet::Cont { first, second } => {
            let (on, off) = if at.before_cont_cal_swap() {
                (second, first)
            } else {
                (first, second)
            };
            let tsys = match (mean(on.get(code)), mean(off.get(code))) {
                (Some(on), Some(off)) if on > off => {
                    Tsys::Value(0.5 * tcal * (on + off) / (on - off))
                }
                _ => Tsys::Unavailable,
            };
            Some(tsys)
        }

        BufferSet::Single {
            reference,
            prime,
            cal,
            diff,
        } => {
            let prime = mean(prime.get(code));
            let vsys = mean(reference.get(code)).or(prime);
            if let Some(diff) = mean(diff.get(code)) {
                return Some(match vsys {
                    Some(vsys) if diff > 0.0 => Tsys::Value(tcal * vsys / diff),
                    _ => Tsys::Unavailable,
                });
            }

            let (prime, cal, vsys) = (prime?, mean(cal.get(code))?, vsys?);
            if cal <= prime {
                Some(Tsys::Unavailable)
            } else {
                Some(Tsys::Value(tcal * vsys / (cal - prime)))
            }
        }
    }
}

/// The Tsys of each of the given channels. Unmeasured channels are
/// unavailable, so the result lines up with `codes`.
pub fn window_tsys<'a, I>(
    buffers: &BufferSet,
    codes: I,
    tcal: &BTreeMap<String, Option<f64>>,
    at: LogTime,
) -> Vec<Tsys>
where
    I: IntoIterator<Item = &'a String>,
{
    codes
        .into_iter()
        .map(|code| {
            let t = tcal.get(code).copied().flatten();
            channel_tsys(buffers, code, t, at).unwrap_or(Tsys::Unavailable)
        })
        .collect()
}

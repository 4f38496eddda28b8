// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Replacing implausible Tsys values before they're written.

use std::collections::HashMap;

use log::debug;

use crate::fslog::{Tsys, TsysSample};

fn geometric_mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some((values.iter().map(|v| v.ln()).sum::<f64>() / values.len() as f64).exp())
    }
}

/// Replace each Tsys that is not in (0, `max_tsys`] with the geometric mean of
/// the good values of the same setup and column in the same scan, or failing
/// that, in the whole setup. If there are no good values at all, the value
/// becomes unavailable. Returns the number of values replaced.
pub fn prefilter(samples: &mut [TsysSample], max_tsys: f64) -> usize {
    let good = |v: f64| v > 0.0 && v <= max_tsys;

    let mut per_scan: HashMap<(String, usize, u32), Vec<f64>> = HashMap::new();
    let mut per_setup: HashMap<(String, usize), Vec<f64>> = HashMap::new();
    for s in samples.iter() {
        for (col, v) in s.values.iter().enumerate() {
            if let Some(v) = v.value().filter(|v| good(*v)) {
                per_scan
                    .entry((s.setup.clone(), col, s.scan))
                    .or_default()
                    .push(v);
                per_setup.entry((s.setup.clone(), col)).or_default().push(v);
            }
        }
    }

    let mut num_replaced = 0;
    for s in samples.iter_mut() {
        for (col, v) in s.values.iter_mut().enumerate() {
            let bad = match v {
                Tsys::Value(v) => !good(*v),
                Tsys::Unavailable => false,
            };
            if !bad {
                continue;
            }

            let replacement = per_scan
                .get(&(s.setup.clone(), col, s.scan))
                .and_then(|g| geometric_mean(g))
                .or_else(|| {
                    per_setup
                        .get(&(s.setup.clone(), col))
                        .and_then(|g| geometric_mean(g))
                })
                .map(Tsys::Value)
                .unwrap_or(Tsys::Unavailable);
            debug!(
                "{}: Replacing Tsys {:?} of column {} with {replacement:?}",
                s.time,
                v,
                col + 1
            );
            *v = replacement;
            num_replaced += 1;
        }
    }
    num_replaced
}

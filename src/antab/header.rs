// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The descriptive parts of an ANTAB file: the preamble, and the GAIN,
//! INDEX and column lines of each setup.

use std::collections::BTreeMap;

use itertools::Itertools;

use super::AntabMeta;
use crate::{
    catalog::{CalibrationCurve, Catalog},
    constants::{TSYS_SENTINEL, VEL_C},
    fslog::{CalMode, Channel, LogData, Setup},
};

/// The polarisation label of each channel of a setup, e.g. "R1", "R2", "L1".
/// Channels are numbered separately for each polarisation.
fn channel_labels(setup: &Setup) -> Vec<String> {
    let mut counts: BTreeMap<char, usize> = BTreeMap::new();
    setup
        .channel_list()
        .map(|c| {
            let letter = c.lo.pol.letter();
            let count = counts.entry(letter).or_default();
            *count += 1;
            format!("{letter}{count}")
        })
        .collect()
}

/// `INDEX= 'R1','R2','L1','L2'`
pub fn index_line(setup: &Setup) -> String {
    format!(
        "INDEX= {}",
        channel_labels(setup)
            .into_iter()
            .map(|l| format!("'{l}'"))
            .join(",")
    )
}

/// The comment block describing each column of a setup's Tsys lines.
pub fn header_block(setup: &Setup) -> Vec<String> {
    let mut lines = vec![
        "!".to_string(),
        format!("! Setup {}", setup.id),
        format!(
            "! Calibration mode: {}",
            setup.cal_mode.unwrap_or(CalMode::Single)
        ),
        "!".to_string(),
    ];
    for (i, (channel, label)) in setup
        .channel_list()
        .zip(channel_labels(setup))
        .enumerate()
    {
        let tcal = setup
            .tcal_of(&channel.code)
            .filter(|t| *t != 0.0)
            .unwrap_or(TSYS_SENTINEL);
        lines.push(format!(
            "!Column {} = {label}: if{}, bbc{:02}, {:.2} MHz , {}SB, BW= {:04.2} MHz, Tcal={tcal:.2} K",
            i + 1,
            channel.if_name.to_uppercase(),
            channel.bbc,
            channel.sky_freq_mhz,
            channel.sideband.letter(),
            channel.bandwidth_mhz,
        ));
    }
    lines
}

/// The frequency span covered by a calibration curve. Channels within the
/// Tcal table (widened by their bandwidths) set the span; without any, the
/// table itself does.
fn gain_span(curve: &CalibrationCurve, channels: &[&Channel]) -> Option<(f64, f64)> {
    let (tmin, tmax) = curve.tcal_span()?;
    let covered = channels
        .iter()
        .filter(|c| {
            c.sky_freq_mhz >= tmin - c.bandwidth_mhz && c.sky_freq_mhz <= tmax + c.bandwidth_mhz
        })
        .collect::<Vec<_>>();
    let lowest = covered
        .iter()
        .min_by(|a, b| a.sky_freq_mhz.total_cmp(&b.sky_freq_mhz));
    let highest = covered
        .iter()
        .max_by(|a, b| a.sky_freq_mhz.total_cmp(&b.sky_freq_mhz));
    match (lowest, highest) {
        (Some(lo), Some(hi)) => Some((
            lo.sky_freq_mhz - lo.bandwidth_mhz,
            hi.sky_freq_mhz + hi.bandwidth_mhz,
        )),
        _ => Some((tmin, tmax)),
    }
}

/// One `GAIN` line for each RXG file used by the setup's channels, sorted by
/// file name.
pub fn gain_lines(setup: &Setup, catalog: &Catalog, station: &str) -> Vec<String> {
    let channels = setup.channel_list().collect::<Vec<_>>();
    let curves: BTreeMap<String, &CalibrationCurve> = channels
        .iter()
        .filter_map(|c| catalog.find(c.lo.freq_mhz))
        .map(|curve| (curve.file_name(), curve))
        .collect();

    curves
        .values()
        .map(|curve| {
            let mut line = format!("GAIN {station} ELEV DPFU={}", curve.dpfu.join(","));
            if let Some((lo, hi)) = gain_span(curve, &channels) {
                line.push_str(&format!(" FREQ={lo:.2},{hi:.2}"));
            }
            line.push_str(&format!(" POLY={} /", curve.gain.coeffs.join(",")));
            line
        })
        .collect()
}

/// Wavebands in cm, largest first, e.g. "3.6".
pub fn wavebands(data: &LogData) -> Vec<String> {
    data.setups
        .values()
        .flat_map(|s| s.los.values().flatten())
        .map(|lo| VEL_C / (lo.freq_mhz * 1e4))
        .sorted_by(|a, b| b.total_cmp(a))
        .map(|w| format!("{w:.1}"))
        .dedup()
        .collect()
}

/// The comment lines at the top of an ANTAB file.
pub fn preamble(meta: &AntabMeta, data: &LogData, catalog: &Catalog) -> Vec<String> {
    let mut lines = vec![
        format!(
            "! Amplitude calibration data for {} in {}.",
            meta.station, meta.experiment
        ),
        "! For use with AIPS task ANTAB.".to_string(),
        format!(
            "! Waveband(s) = {}.",
            wavebands(data).into_iter().map(|w| format!("{w}cm")).join(" ")
        ),
        "! RXG files used for each LO:".to_string(),
    ];

    for setup in data
        .setups
        .values()
        .filter(|s| !s.los.is_empty())
        .sorted_by(|a, b| a.id.cmp(&b.id))
    {
        lines.push(format!("!   Setup {}", setup.id));
        let los = setup
            .los
            .values()
            .flatten()
            .map(|lo| (lo.freq_mhz, lo.pol))
            .sorted_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
            .dedup();
        for (freq, pol) in los {
            let mut line = format!("!     LO={freq:.2} MHz {pol}");
            if let Some(curve) = catalog.find(freq) {
                line.push_str(&format!(" {} {}", curve.file_name(), curve.date));
            }
            lines.push(line);
        }
    }

    lines.push(format!(
        "! DBBC used in mode {}",
        data.dbbc_mode
            .map(|m| m.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    ));
    lines.push(format!(
        "! Produced on {} using antabfs version {}",
        meta.produced.format("%Y-%m-%d"),
        meta.version
    ));
    lines
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Setups (configuration epochs of a log) and their channels.

use std::collections::BTreeMap;

use log::{debug, warn};
use strum_macros::{Display, EnumString};

use crate::{
    catalog::{Catalog, Polarisation},
    constants::{PFB_BANDWIDTH_MHZ, PFB_BBC_FREQS_MHZ},
};

/// The channel tables used by the DDC firmware for each `form=` type. With a
/// channel mask, table entry `i` is recorded if bits `2i` or `2i+1` are set.
const FORM_CHANNEL_TABLES: [(&str, [&str; 16]); 5] = [
    (
        "geo",
        [
            "1u", "2u", "3u", "4u", "5u", "6u", "7u", "8u", "1l", "8l", "9u", "au", "bu", "cu",
            "du", "eu",
        ],
    ),
    (
        "astro",
        [
            "1u", "2u", "3u", "4u", "5u", "6u", "7u", "8u", "1l", "2l", "3l", "4l", "5l", "6l",
            "7l", "8l",
        ],
    ),
    (
        "astro2",
        [
            "1u", "2u", "3u", "4u", "9u", "au", "bu", "cu", "1l", "2l", "3l", "4l", "9l", "al",
            "bl", "cl",
        ],
    ),
    (
        "astro3",
        [
            "1u", "3u", "5u", "7u", "9u", "bu", "du", "fu", "1l", "3l", "5l", "7l", "9l", "bl",
            "dl", "fl",
        ],
    ),
    (
        "lba",
        [
            "1u", "2u", "5u", "6u", "3u", "4u", "7u", "8u", "1l", "2l", "5l", "6l", "3l", "4l",
            "7l", "8l",
        ],
    ),
];

/// The DBBC firmware used for an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum DbbcMode {
    /// Polyphase filter bank; channels like `a05`.
    #[strum(serialize = "PFB")]
    Pfb,

    /// Digital down-converter; channels like `1u`.
    #[strum(serialize = "DDC")]
    Ddc,
}

impl DbbcMode {
    /// Does a telemetry token name a channel in this mode? PFB channels are
    /// identified by their leading IF letter, DDC channels by their trailing
    /// sideband letter. IF totals like `ia` are not channels in either mode.
    pub fn is_channel_code(self, code: &str) -> bool {
        match self {
            DbbcMode::Pfb => code.len() > 1 && matches!(code.chars().next(), Some('a'..='d')),
            DbbcMode::Ddc => matches!(code.chars().last(), Some('u' | 'l')),
        }
    }
}

/// How a setup calibrates its power measurements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum CalMode {
    /// Noise diode fired occasionally (`/tpi/`, `/tpical/` etc.).
    #[strum(serialize = "SINGLE")]
    Single,

    /// Continuous noise-diode switching (`tpcont`).
    #[strum(serialize = "CONT")]
    Cont,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Sideband {
    #[strum(serialize = "lsb")]
    Lower,

    #[strum(serialize = "usb")]
    Upper,
}

impl Sideband {
    pub fn letter(self) -> char {
        match self {
            Sideband::Lower => 'L',
            Sideband::Upper => 'U',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoSetting {
    pub freq_mhz: f64,
    pub sideband: Sideband,
    pub pol: Polarisation,
}

/// A DDC BBC declaration, e.g. `bbc01=638.49,a,16.00`.
#[derive(Debug, Clone, PartialEq)]
pub struct BbcDefinition {
    pub number: u32,
    pub freq_mhz: f64,
    pub if_name: String,
    pub bandwidth_mhz: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub code: String,
    /// The BBC number shown in ANTAB headers.
    pub bbc: u32,
    pub if_name: String,
    pub bbc_freq_mhz: f64,
    pub bandwidth_mhz: f64,
    pub lo: LoSetting,
    /// The channel's own sideband.
    pub sideband: Sideband,
    pub sky_freq_mhz: f64,
}

/// The sky frequency of a channel: the LO, offset by the BBC frequency on the
/// LO's sideband, offset by half the bandwidth on the channel's sideband.
pub fn sky_frequency(
    lo: &LoSetting,
    bbc_freq_mhz: f64,
    bandwidth_mhz: f64,
    sideband: Sideband,
) -> f64 {
    let bbc = match lo.sideband {
        Sideband::Lower => -bbc_freq_mhz,
        Sideband::Upper => bbc_freq_mhz,
    };
    let half_bw = match sideband {
        Sideband::Lower => -bandwidth_mhz / 2.0,
        Sideband::Upper => bandwidth_mhz / 2.0,
    };
    lo.freq_mhz + bbc + half_bw
}

/// A configuration epoch of a log.
#[derive(Debug, Clone, PartialEq)]
pub struct Setup {
    pub id: String,
    pub cal_mode: Option<CalMode>,
    /// e.g. "ifdsx"; LO directives for other IF descriptors are ignored.
    pub if_descriptor: Option<String>,
    /// LO settings keyed by IF selector ("a" to "d"). The last setting is the
    /// one in use.
    pub los: BTreeMap<String, Vec<LoSetting>>,
    pub bbcs: BTreeMap<u32, BbcDefinition>,
    pub vsi: [Vec<String>; 2],
    pub fila10g_mask: Option<u64>,
    pub recorder_mask: Option<u64>,
    /// `None` until the setup is first used for data.
    pub channels: Option<BTreeMap<String, Channel>>,
    pub tcal: BTreeMap<String, Option<f64>>,
    /// Did the log supply Tcal values itself (`/caltemp/`)?
    pub tcal_from_log: bool,
}

impl Setup {
    pub fn new(id: &str) -> Setup {
        Setup {
            id: id.to_string(),
            cal_mode: None,
            if_descriptor: None,
            los: BTreeMap::new(),
            bbcs: BTreeMap::new(),
            vsi: [vec![], vec![]],
            fila10g_mask: None,
            recorder_mask: None,
            channels: None,
            tcal: BTreeMap::new(),
            tcal_from_log: false,
        }
    }

    pub fn current_lo(&self, if_name: &str) -> Option<&LoSetting> {
        self.los.get(if_name).and_then(|l| l.last())
    }

    /// Record an LO setting, unless it's already known.
    pub fn add_lo(&mut self, if_name: &str, lo: LoSetting) {
        let los = self.los.entry(if_name.to_string()).or_default();
        if !los.contains(&lo) {
            los.push(lo);
        }
    }

    /// The channel mask reported by the FiLa10G takes precedence over other
    /// recorders.
    pub fn channel_mask(&self) -> Option<u64> {
        self.fila10g_mask.or(self.recorder_mask)
    }

    /// The channels of this setup, in code order.
    pub fn channel_list(&self) -> impl Iterator<Item = &Channel> {
        self.channels.iter().flat_map(|c| c.values())
    }

    pub fn tcal_of(&self, code: &str) -> Option<f64> {
        self.tcal.get(code).copied().flatten()
    }

    /// Work out which channels this setup records, their frequencies, and (if
    /// the log didn't provide them) their Tcals.
    pub(crate) fn resolve_channels(
        &mut self,
        mode: Option<DbbcMode>,
        form: Option<&str>,
        catalog: &Catalog,
    ) {
        let declared = match mode {
            Some(DbbcMode::Pfb) => pfb_channels(&self.vsi),
            Some(DbbcMode::Ddc) => ddc_channels(&self.bbcs, form, self.channel_mask()),
            None => {
                warn!(
                    "Setup {}: The DBBC mode is unknown, so no channels can be determined",
                    self.id
                );
                vec![]
            }
        };

        let mut channels = BTreeMap::new();
        for d in declared {
            let lo = match self.current_lo(&d.if_name) {
                Some(lo) => *lo,
                None => {
                    warn!(
                        "Setup {}: No LO is known for IF {}; ignoring channel {}",
                        self.id, d.if_name, d.code
                    );
                    continue;
                }
            };
            let sky_freq_mhz = sky_frequency(&lo, d.bbc_freq_mhz, d.bandwidth_mhz, d.sideband);
            channels.insert(
                d.code.clone(),
                Channel {
                    code: d.code,
                    bbc: d.bbc,
                    if_name: d.if_name,
                    bbc_freq_mhz: d.bbc_freq_mhz,
                    bandwidth_mhz: d.bandwidth_mhz,
                    lo,
                    sideband: d.sideband,
                    sky_freq_mhz,
                },
            );
        }

        if !self.tcal_from_log {
            for c in channels.values() {
                let tcal = catalog.tcal(c.lo.freq_mhz, c.lo.pol, c.sky_freq_mhz);
                if tcal.is_none() {
                    debug!(
                        "Setup {}: No Tcal for channel {} ({:.2} MHz, LO {:.2} MHz)",
                        self.id, c.code, c.sky_freq_mhz, c.lo.freq_mhz
                    );
                }
                self.tcal.insert(c.code.clone(), tcal);
            }
        }

        debug!(
            "Setup {}: channels {}",
            self.id,
            channels.keys().cloned().collect::<Vec<_>>().join(",")
        );
        self.channels = Some(channels);
    }
}

/// A channel as declared by the log, before its LO is known.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DeclaredChannel {
    pub(crate) code: String,
    pub(crate) bbc: u32,
    pub(crate) if_name: String,
    pub(crate) bbc_freq_mhz: f64,
    pub(crate) bandwidth_mhz: f64,
    pub(crate) sideband: Sideband,
}

/// PFB channels come straight from the `vsi1=` and `vsi2=` lists.
pub(crate) fn pfb_channels(vsi: &[Vec<String>; 2]) -> Vec<DeclaredChannel> {
    let mut channels = vec![];
    for code in vsi.iter().flatten() {
        let mut chars = code.chars();
        let if_name = match chars.next() {
            Some(c) => c.to_string(),
            None => continue,
        };
        let index = chars.as_str();
        match index
            .parse::<usize>()
            .ok()
            .and_then(|i| PFB_BBC_FREQS_MHZ.get(i).map(|f| (i, *f)))
        {
            Some((i, bbc_freq_mhz)) => channels.push(DeclaredChannel {
                code: code.clone(),
                bbc: i as u32,
                if_name,
                bbc_freq_mhz,
                bandwidth_mhz: PFB_BANDWIDTH_MHZ,
                sideband: Sideband::Lower,
            }),
            None => warn!("Ignoring unknown PFB channel '{code}'"),
        }
    }
    channels
}

/// DDC channels are derived from the BBC declarations. With a channel mask
/// and a known `form=` type, the firmware's channel table says which
/// sidebands are recorded; otherwise both sidebands of each BBC are, except
/// for the geodetic modes.
pub(crate) fn ddc_channels(
    bbcs: &BTreeMap<u32, BbcDefinition>,
    form: Option<&str>,
    mask: Option<u64>,
) -> Vec<DeclaredChannel> {
    let table = form.and_then(|f| {
        FORM_CHANNEL_TABLES
            .iter()
            .find(|(name, _)| *name == f)
            .map(|(_, t)| t)
    });

    let mut channels = vec![];
    for bbc in bbcs.values() {
        let hex = format!("{:x}", bbc.number);
        let digit = match hex.chars().last() {
            Some(d) => d,
            None => continue,
        };
        let mut codes = vec![];
        match (mask, table) {
            (Some(mask), Some(table)) => {
                for (i, entry) in table.iter().enumerate() {
                    let bits = 0b11u64 << (2 * i);
                    if entry.starts_with(digit) && bits & mask != 0 {
                        codes.push(entry.to_string());
                    }
                }
            }
            _ => {
                if form != Some("geo2") && (form != Some("geo") || [1, 8].contains(&bbc.number)) {
                    codes.push(format!("{digit}l"));
                }
                codes.push(format!("{digit}u"));
            }
        }

        for code in codes {
            let sideband = if code.ends_with('l') {
                Sideband::Lower
            } else {
                Sideband::Upper
            };
            channels.push(DeclaredChannel {
                code,
                bbc: digit.to_digit(16).unwrap_or(0),
                if_name: bbc.if_name.clone(),
                bbc_freq_mhz: bbc.freq_mhz,
                bandwidth_mhz: bbc.bandwidth_mhz,
                sideband,
            });
        }
    }
    channels
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tagging log lines by the directive they carry.

use crate::time::{LogTime, LogTimeError, TIMESTAMP_LEN};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// `Rack=DBBC...` (DBBC mode).
    Rack,
    /// `equip,dbbc_...` (DBBC mode).
    Equip,
    Form,
    Vsi1,
    Vsi2,
    BbcDefinition,
    ScanName,
    Source,
    SetupSelect,
    SetupIfd,
    Fila10gMode,
    RecorderMode,
    CalMode,
    Lo,
    TpiPrime,
    TpiCal,
    TpiDiff,
    CalTemp,
    LoggedTsysCont,
    LoggedTsys,
    DataValidOn,
    DataValidOff,
    TpiCont,
    TpiSingle,
    Other,
}

struct Marker {
    kind: LineKind,
    /// At least one of these must be present.
    any: &'static [&'static str],
    /// This must also be present.
    with: Option<&'static str>,
    /// This must not be present.
    without: Option<&'static str>,
}

impl Marker {
    const fn new(kind: LineKind, any: &'static [&'static str]) -> Marker {
        Marker {
            kind,
            any,
            with: None,
            without: None,
        }
    }

    fn matches(&self, body: &str) -> bool {
        self.any.iter().any(|m| body.contains(m))
            && self.with.map(|w| body.contains(w)).unwrap_or(true)
            && self.without.map(|w| !body.contains(w)).unwrap_or(true)
    }
}

/// Markers in order of precedence; the first match wins.
const MARKERS: &[Marker] = &[
    Marker::new(LineKind::Rack, &["Rack=DBBC"]),
    Marker::new(LineKind::Equip, &["equip,dbbc_"]),
    Marker::new(LineKind::Form, &["/form="]),
    Marker::new(LineKind::Vsi1, &["/vsi1="]),
    Marker::new(LineKind::Vsi2, &["/vsi2="]),
    Marker {
        kind: LineKind::BbcDefinition,
        any: &["&dbbc"],
        with: None,
        without: Some("/if=bbc"),
    },
    Marker::new(LineKind::ScanName, &[":scan_name="]),
    Marker::new(LineKind::Source, &[":source="]),
    Marker::new(LineKind::SetupSelect, &[":setup", ";setup", "/setup"]),
    Marker {
        kind: LineKind::SetupIfd,
        any: &["&setup"],
        with: Some("ifd"),
        without: None,
    },
    Marker::new(LineKind::Fila10gMode, &["/fila10g_mode="]),
    Marker::new(LineKind::RecorderMode, &["_mode="]),
    Marker {
        kind: LineKind::CalMode,
        any: &["/cont_cal="],
        with: Some("&setup"),
        without: None,
    },
    Marker::new(LineKind::Lo, &["/lo=loa", "/lo=lob", "/lo=loc", "/lo=lod"]),
    Marker::new(LineKind::TpiPrime, &["/tpi/"]),
    Marker::new(LineKind::TpiCal, &["/tpical"]),
    Marker::new(LineKind::TpiDiff, &["/tpdiff/"]),
    Marker::new(LineKind::CalTemp, &["/caltemp/"]),
    Marker::new(LineKind::LoggedTsysCont, &["#tpicd#tsys/"]),
    Marker::new(LineKind::LoggedTsys, &["/tsys/"]),
    Marker::new(LineKind::DataValidOn, &["data_valid=on"]),
    Marker::new(LineKind::DataValidOff, &["data_valid=off"]),
    Marker::new(LineKind::TpiCont, &["#tpicd#tpcont/"]),
    Marker::new(LineKind::TpiSingle, &["#tpicd#tpi/"]),
];

/// A non-blank log line with its timestamp decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedLine<'a> {
    pub time: LogTime,
    pub kind: LineKind,
    /// Everything after the timestamp.
    pub body: &'a str,
}

impl ClassifiedLine<'_> {
    /// The text following `marker`, if `marker` is present.
    pub(crate) fn after(&self, marker: &str) -> Option<&str> {
        self.body
            .find(marker)
            .map(|i| self.body[i + marker.len()..].trim())
    }
}

/// Tag a line. Blank lines give `None`.
pub fn classify(line: &str) -> Option<Result<ClassifiedLine, LogTimeError>> {
    let line = line.trim_end();
    if line.trim().is_empty() {
        return None;
    }

    let time = match LogTime::parse_line_start(line) {
        Ok(t) => t,
        Err(e) => return Some(Err(e)),
    };
    // The timestamp is ASCII, so this can't split a character.
    let body = line.get(TIMESTAMP_LEN..).unwrap_or("");
    let kind = MARKERS
        .iter()
        .find(|m| m.matches(body))
        .map(|m| m.kind)
        .unwrap_or(LineKind::Other);
    Some(Ok(ClassifiedLine { time, kind, body }))
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The log state machine.

use std::collections::BTreeMap;

use chrono::Duration;
use indexmap::IndexMap;
use log::{debug, info, trace, warn};

use super::{
    classify, window_complete, window_tsys, BbcDefinition, BufferSet, CalMode, ClassifiedLine,
    DbbcMode, LineError, LineKind, LoSetting, LogData, LoggedTsys, ReadLogError, Scan, Setup,
    SetupActivation, Sideband, SingleRole, Tsys, TsysSample,
};
use crate::{
    catalog::{Catalog, Polarisation},
    time::LogTime,
};

/// Reads a log, one line at a time. All state lives here; a parser is used
/// for a single log.
pub struct LogParser<'a> {
    catalog: &'a Catalog,
    integration: Duration,

    dbbc_mode: Option<DbbcMode>,
    form: Option<String>,
    setups: IndexMap<String, Setup>,
    current: Option<String>,
    /// Has the current setup been selected since data was last valid?
    new_setup: bool,
    last_cal_mode: Option<CalMode>,
    buffers: BufferSet,
    data_valid: bool,
    window_start: Option<LogTime>,
    scan_num: u32,
    scan_name: String,

    activations: Vec<SetupActivation>,
    scans: Vec<Scan>,
    samples: Vec<TsysSample>,
    /// Tsys reported by the Field System, keyed by time, along with the setup
    /// that was active.
    logged: BTreeMap<LogTime, (String, BTreeMap<String, Vec<f64>>)>,
    num_skipped_lines: usize,
}

impl<'a> LogParser<'a> {
    pub fn new(catalog: &'a Catalog, integration_time_s: f64) -> LogParser<'a> {
        LogParser {
            catalog,
            integration: Duration::microseconds((integration_time_s * 1e6).round() as i64),
            dbbc_mode: None,
            form: None,
            setups: IndexMap::new(),
            current: None,
            new_setup: false,
            last_cal_mode: None,
            buffers: BufferSet::new(CalMode::Single),
            data_valid: false,
            window_start: None,
            scan_num: 0,
            scan_name: String::new(),
            activations: vec![],
            scans: vec![],
            samples: vec![],
            logged: BTreeMap::new(),
            num_skipped_lines: 0,
        }
    }

    /// Read all of the lines in `buf`.
    pub fn parse<T: std::io::BufRead>(mut self, buf: &mut T) -> Result<LogData, ReadLogError> {
        let mut lines = vec![];
        let mut bytes = vec![];
        while buf.read_until(b'\n', &mut bytes)? > 0 {
            lines.push(String::from_utf8_lossy(&bytes).into_owned());
            bytes.clear();
        }
        debug!("Read {} log lines", lines.len());

        self.process_lines(&lines);
        Ok(self.finish())
    }

    /// Process lines in order. Whether a window can close depends on the
    /// timestamp of the following line, so all lines are needed up front.
    pub fn process_lines<S: AsRef<str>>(&mut self, lines: &[S]) {
        for (i, line) in lines.iter().enumerate() {
            let line_num = i + 1;
            let line = match classify(line.as_ref()) {
                None => continue,
                Some(Ok(l)) => l,
                Some(Err(e)) => {
                    debug!("Log line {line_num}: {e}; skipping");
                    self.num_skipped_lines += 1;
                    continue;
                }
            };
            let next = lines[i + 1..]
                .iter()
                .find(|l| !l.as_ref().trim().is_empty())
                .and_then(|l| LogTime::parse_line_start(l.as_ref()).ok());

            match self.process_line(&line) {
                Ok(true) => (),
                Ok(false) => {
                    if self.data_valid {
                        self.telemetry(&line, next);
                    }
                }
                Err(e) => {
                    debug!("Log line {line_num}: {e}; skipping");
                    self.num_skipped_lines += 1;
                }
            }
        }
    }

    /// Act on a directive. Returns `false` if the line should go on to be
    /// treated as telemetry.
    fn process_line(&mut self, line: &ClassifiedLine) -> Result<bool, LineError> {
        match line.kind {
            LineKind::Rack | LineKind::Equip => {
                if self.dbbc_mode.is_some() {
                    return Ok(false);
                }
                let mode = if line.kind == LineKind::Rack {
                    parse_rack(line)
                } else {
                    parse_equip(line)
                };
                if let Some(mode) = mode {
                    info!("DBBC mode: {mode}");
                    self.dbbc_mode = Some(mode);
                }
                Ok(true)
            }

            LineKind::Form => {
                let form = line
                    .after("/form=")
                    .and_then(|f| f.split(',').next())
                    .map(|f| f.trim().to_string())
                    .filter(|f| !f.is_empty())
                    .ok_or(LineError::MissingField {
                        directive: "form",
                        field: "type",
                    })?;
                trace!("{}: form={form}", line.time);
                self.form = Some(form);
                Ok(true)
            }

            LineKind::Vsi1 | LineKind::Vsi2 => {
                if self.dbbc_mode != Some(DbbcMode::Pfb) {
                    return Ok(false);
                }
                let (marker, index) = if line.kind == LineKind::Vsi1 {
                    ("/vsi1=", 0)
                } else {
                    ("/vsi2=", 1)
                };
                let channels = line
                    .after(marker)
                    .unwrap_or_default()
                    .split(',')
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty())
                    .collect();
                self.current_setup_mut("vsi")?.vsi[index] = channels;
                Ok(true)
            }

            LineKind::BbcDefinition => {
                if self.dbbc_mode != Some(DbbcMode::Ddc) {
                    return Ok(false);
                }
                if let Some(bbc) = parse_bbc(line)? {
                    let setup = self.current_setup_mut("bbc")?;
                    setup.bbcs.insert(bbc.number, bbc);
                }
                Ok(true)
            }

            LineKind::ScanName => {
                self.scan_num += 1;
                self.scan_name = first_field(line, ":scan_name=").unwrap_or_default();
                Ok(true)
            }

            LineKind::Source => {
                self.scans.push(Scan {
                    number: self.scan_num,
                    name: self.scan_name.clone(),
                    source: first_field(line, ":source=").unwrap_or_default(),
                    time: line.time,
                });
                Ok(true)
            }

            LineKind::SetupSelect => {
                let id = line.body.rsplit('p').next().unwrap_or_default().trim();
                if id.is_empty() {
                    return Err(LineError::MissingField {
                        directive: "setup",
                        field: "name",
                    });
                }
                Ok(self.select_setup(id, line.time))
            }

            LineKind::SetupIfd => {
                let (setup, descriptor) = line
                    .body
                    .split('&')
                    .nth(1)
                    .and_then(|s| s.split_once('/'))
                    .ok_or(LineError::MissingField {
                        directive: "setup",
                        field: "IF descriptor",
                    })?;
                let id = setup.rsplit('p').next().unwrap_or_default().trim();
                let descriptor = descriptor.trim();
                let setup = self
                    .setups
                    .entry(id.to_string())
                    .or_insert_with(|| Setup::new(id));
                // Only the first declaration counts.
                let kept = setup.if_descriptor.get_or_insert_with(|| descriptor.to_string());
                if kept.as_str() != descriptor {
                    debug!(
                        "{}: Setup {id} already uses {kept}; ignoring {descriptor}",
                        line.time
                    );
                }
                Ok(false)
            }

            LineKind::Fila10gMode | LineKind::RecorderMode => {
                let field = line
                    .body
                    .split(',')
                    .nth(1)
                    .map(|f| f.trim())
                    .ok_or(LineError::MissingField {
                        directive: "mode",
                        field: "channel mask",
                    })?;
                let hex = field.trim_start_matches("0x").trim_start_matches("0X");
                let mask = u64::from_str_radix(hex, 16).map_err(|_| LineError::ParseHex {
                    string: field.to_string(),
                })?;
                let is_fila10g = line.kind == LineKind::Fila10gMode;
                let setup = self.current_setup_mut("mode")?;
                if is_fila10g {
                    setup.fila10g_mask = Some(mask);
                } else {
                    setup.recorder_mask = Some(mask);
                }
                Ok(false)
            }

            LineKind::CalMode => {
                self.set_cal_mode(line)?;
                Ok(true)
            }

            LineKind::Lo => {
                self.add_lo(line)?;
                Ok(true)
            }

            LineKind::TpiPrime
            | LineKind::TpiCal
            | LineKind::TpiDiff
            | LineKind::CalTemp
            | LineKind::LoggedTsys
            | LineKind::LoggedTsysCont => self.general_telemetry(line),

            LineKind::DataValidOn => {
                if let Some(id) = self.current.clone() {
                    self.data_valid = true;
                    self.window_start = Some(line.time);
                    if self.new_setup {
                        self.resolve_setup(&id);
                        self.new_setup = false;
                    }
                }
                Ok(true)
            }

            LineKind::DataValidOff => {
                if self.current.is_some() && self.data_valid {
                    self.close_window(line.time);
                }
                self.data_valid = false;
                Ok(true)
            }

            LineKind::TpiCont | LineKind::TpiSingle | LineKind::Other => Ok(false),
        }
    }

    fn current_setup_mut(&mut self, directive: &'static str) -> Result<&mut Setup, LineError> {
        let id = self
            .current
            .as_ref()
            .ok_or(LineError::NoSetup { directive })?;
        self.setups
            .get_mut(id)
            .ok_or(LineError::NoSetup { directive })
    }

    fn reset_buffers(&mut self, mode: CalMode) {
        trace!("Resetting buffers for {mode}");
        self.buffers = BufferSet::new(mode);
        self.last_cal_mode = Some(mode);
    }

    /// Make a setup the current one. Returns `false` if it already was.
    fn select_setup(&mut self, id: &str, time: LogTime) -> bool {
        if self.current.as_deref() == Some(id) {
            return false;
        }

        let cal_mode = self
            .setups
            .entry(id.to_string())
            .or_insert_with(|| Setup::new(id))
            .cal_mode;
        if let Some(mode) = cal_mode {
            self.reset_buffers(mode);
        }
        debug!("{time}: Setup {id} is now active");
        self.current = Some(id.to_string());
        self.new_setup = true;
        self.activations.push(SetupActivation {
            time,
            setup: id.to_string(),
        });
        true
    }

    fn set_cal_mode(&mut self, line: &ClassifiedLine) -> Result<(), LineError> {
        let value = line
            .after("/cont_cal=")
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim())
            .ok_or(LineError::MissingField {
                directive: "cont_cal",
                field: "state",
            })?;
        let mode = match value.to_lowercase().as_str() {
            "on" => CalMode::Cont,
            "off" => CalMode::Single,
            _ => {
                return Err(LineError::Unrecognised {
                    what: "cont_cal state",
                    string: value.to_string(),
                })
            }
        };

        let setup = self.current_setup_mut("cont_cal")?;
        let effective = match setup.cal_mode {
            None => {
                setup.cal_mode = Some(mode);
                mode
            }
            Some(m) => {
                if m != mode {
                    warn!(
                        "Setup {}: Ignoring a change of calibration mode from {m} to {mode}",
                        setup.id
                    );
                }
                m
            }
        };
        if self.last_cal_mode != Some(effective) {
            self.reset_buffers(effective);
        }
        Ok(())
    }

    fn add_lo(&mut self, line: &ClassifiedLine) -> Result<(), LineError> {
        let descriptor = line
            .body
            .split('&')
            .nth(1)
            .and_then(|s| s.split('/').next())
            .map(|s| s.trim().to_string());
        let setup = self.current_setup_mut("lo")?;
        if let (Some(declared), Some(descriptor)) = (setup.if_descriptor.as_ref(), descriptor) {
            if *declared != descriptor {
                trace!("Ignoring LO for {descriptor}; setup {} uses {declared}", setup.id);
                return Ok(());
            }
        }

        let fields = line
            .after("/lo=")
            .unwrap_or_default()
            .split(',')
            .map(|f| f.trim())
            .collect::<Vec<_>>();
        let [selector, freq, sideband, pol, ..] = fields.as_slice() else {
            return Err(LineError::MissingField {
                directive: "lo",
                field: "frequency, sideband or polarisation",
            });
        };
        let if_name = selector
            .chars()
            .last()
            .map(|c| c.to_string())
            .unwrap_or_default();
        let freq_mhz = freq.parse::<f64>().map_err(|_| LineError::ParseFloat {
            string: freq.to_string(),
        })?;
        let sideband = sideband
            .parse::<Sideband>()
            .map_err(|_| LineError::Unrecognised {
                what: "sideband",
                string: sideband.to_string(),
            })?;
        let pol = pol
            .parse::<Polarisation>()
            .map_err(|_| LineError::Unrecognised {
                what: "polarisation",
                string: pol.to_string(),
            })?;

        setup.add_lo(
            &if_name,
            LoSetting {
                freq_mhz,
                sideband,
                pol,
            },
        );
        Ok(())
    }

    /// Calibration measurements and logged Tsys values, which may appear
    /// whether or not data is valid.
    fn general_telemetry(&mut self, line: &ClassifiedLine) -> Result<bool, LineError> {
        let mode = match self.dbbc_mode {
            Some(m) => m,
            None => return Ok(false),
        };
        let setup_mode = self
            .current
            .as_ref()
            .and_then(|id| self.setups.get(id))
            .and_then(|s| s.cal_mode);

        match (line.kind, setup_mode) {
            (LineKind::TpiPrime | LineKind::TpiCal | LineKind::TpiDiff, Some(CalMode::Single))
            | (LineKind::TpiPrime | LineKind::TpiCal, None) => {
                // Without a declared mode, the setup will be SINGLE.
                if self.buffers.mode() != CalMode::Single {
                    self.reset_buffers(CalMode::Single);
                }
                let role = match line.kind {
                    LineKind::TpiPrime => SingleRole::Prime,
                    LineKind::TpiCal => SingleRole::Cal,
                    _ => SingleRole::Diff,
                };
                for (code, values) in channel_values(payload(line), mode, 1) {
                    if let Some(v) = values[0] {
                        self.buffers.push_single(role, code, v);
                    }
                }
                Ok(true)
            }

            (LineKind::CalTemp, _) => {
                let setup = self.current_setup_mut("caltemp")?;
                for (code, values) in channel_values(payload(line), mode, 1) {
                    setup.tcal.insert(code.to_string(), values[0]);
                }
                setup.tcal_from_log = true;
                Ok(true)
            }

            (LineKind::LoggedTsys, Some(CalMode::Single))
            | (LineKind::LoggedTsysCont, Some(CalMode::Cont)) => {
                let id = self
                    .current
                    .clone()
                    .ok_or(LineError::NoSetup { directive: "tsys" })?;
                let (_, logged) = self
                    .logged
                    .entry(line.time)
                    .or_insert_with(|| (id, BTreeMap::new()));
                for (code, values) in channel_values(payload(line), mode, 1) {
                    if let Some(v) = values[0] {
                        logged.entry(code.to_string()).or_default().push(v);
                    }
                }
                Ok(true)
            }

            _ => Ok(false),
        }
    }

    /// The first time that data is valid for a setup, its channels are
    /// determined.
    fn resolve_setup(&mut self, id: &str) {
        let mut defaulted = false;
        if let Some(setup) = self.setups.get_mut(id) {
            if setup.cal_mode.is_none() {
                warn!("Setup {id}: No calibration mode (cont_cal) was found; assuming SINGLE");
                setup.cal_mode = Some(CalMode::Single);
                defaulted = true;
            }
            if setup.channels.is_none() {
                setup.resolve_channels(self.dbbc_mode, self.form.as_deref(), self.catalog);
            }
        }
        // Calibration measurements of a setup without a declared mode are
        // already in SINGLE buffers.
        if defaulted {
            if self.buffers.mode() == CalMode::Single {
                self.last_cal_mode = Some(CalMode::Single);
            } else {
                self.reset_buffers(CalMode::Single);
            }
        }
    }

    /// Power measurements while data is valid.
    fn telemetry(&mut self, line: &ClassifiedLine, next: Option<LogTime>) {
        let start = match self.window_start {
            Some(s) => s,
            None => return,
        };
        let complete = window_complete(start, line.time, next, self.integration);
        if complete {
            self.window_start = Some(line.time);
        }

        if let Some(mode) = self.dbbc_mode {
            match line.kind {
                LineKind::TpiSingle => {
                    for (code, values) in channel_values(payload(line), mode, 1) {
                        if let Some(v) = values[0] {
                            if !self.buffers.push_single(SingleRole::Reference, code, v) {
                                trace!("{}: Ignoring tpi for CONT setup", line.time);
                            }
                        }
                    }
                }
                LineKind::TpiCont => {
                    for (code, values) in channel_values(payload(line), mode, 2) {
                        if let (Some(a), Some(b)) = (values[0], values[1]) {
                            if !self.buffers.push_cont(code, a, b) {
                                trace!("{}: Ignoring tpcont for SINGLE setup", line.time);
                            }
                        }
                    }
                }
                _ => (),
            }
        }

        if complete {
            self.close_window(line.time);
        }
    }

    fn close_window(&mut self, time: LogTime) {
        if let Some(id) = self.current.as_ref() {
            let setup = self.setups.get(id);
            if let Some((setup, channels)) = setup.and_then(|s| Some((s, s.channels.as_ref()?))) {
                let values = window_tsys(&self.buffers, channels.keys(), &setup.tcal, time);
                if values.iter().any(|v| v.is_value()) {
                    trace!("{time}: Tsys {values:?}");
                    self.samples.push(TsysSample {
                        time,
                        setup: id.clone(),
                        scan: self.scan_num,
                        values,
                    });
                }
            }
        }
        self.buffers.clear_window();
    }

    /// Finish reading and hand over everything that was learned.
    pub fn finish(self) -> LogData {
        let LogParser {
            dbbc_mode,
            form,
            setups,
            mut activations,
            mut scans,
            mut samples,
            logged,
            num_skipped_lines,
            ..
        } = self;

        let logged_tsys = logged
            .into_iter()
            .filter_map(|(time, (setup_id, values))| {
                let channels = setups.get(&setup_id)?.channels.as_ref()?;
                let values = channels
                    .keys()
                    .map(|code| match values.get(code) {
                        Some(v) if !v.is_empty() => {
                            Tsys::Value(v.iter().sum::<f64>() / v.len() as f64)
                        }
                        _ => Tsys::Unavailable,
                    })
                    .collect::<Vec<_>>();
                values.iter().any(|v| v.is_value()).then(|| LoggedTsys {
                    time,
                    setup: setup_id,
                    values,
                })
            })
            .collect();

        activations.sort_by_key(|a| a.time);
        scans.sort_by_key(|s| s.time);
        samples.sort_by_key(|s| s.time);

        LogData {
            dbbc_mode,
            form,
            setups,
            activations,
            scans,
            samples,
            logged_tsys,
            num_skipped_lines,
        }
    }
}

/// The text following a telemetry marker.
fn payload<'l>(line: &'l ClassifiedLine) -> &'l str {
    let marker = match line.kind {
        LineKind::TpiPrime => "/tpi/",
        LineKind::TpiCal => "/tpical",
        LineKind::TpiDiff => "/tpdiff/",
        LineKind::CalTemp => "/caltemp/",
        LineKind::LoggedTsysCont => "#tpicd#tsys/",
        LineKind::LoggedTsys => "/tsys/",
        LineKind::TpiCont => "#tpicd#tpcont/",
        LineKind::TpiSingle => "#tpicd#tpi/",
        _ => return "",
    };
    line.after(marker)
        .map(|p| p.trim_start_matches('/'))
        .unwrap_or_default()
}

/// Split telemetry like `1u,123,1l,456` into channels and their values.
/// Tokens that aren't channel codes (e.g. `ia`) are dropped, as are trailing
/// incomplete groups. Values that aren't numbers are `None`.
fn channel_values(
    payload: &str,
    mode: DbbcMode,
    values_per_channel: usize,
) -> Vec<(&str, Vec<Option<f64>>)> {
    let tokens = payload.split(',').map(|t| t.trim()).collect::<Vec<_>>();
    tokens
        .chunks_exact(1 + values_per_channel)
        .filter(|chunk| mode.is_channel_code(chunk[0]))
        .map(|chunk| {
            let values = chunk[1..]
                .iter()
                .map(|v| {
                    let parsed = v.parse::<f64>().ok();
                    if parsed.is_none() {
                        trace!("Couldn't parse '{v}' as a number for channel {}", chunk[0]);
                    }
                    parsed
                })
                .collect();
            (chunk[0], values)
        })
        .collect()
}

/// The first comma-separated field after `marker`.
fn first_field(line: &ClassifiedLine, marker: &str) -> Option<String> {
    line.after(marker)
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
}

/// `Rack=DBBC_PFB/FILA10G` is PFB, and a bare `Rack=DBBC` is DDC.
fn parse_rack(line: &ClassifiedLine) -> Option<DbbcMode> {
    let rack = line.after("Rack=")?.split_whitespace().next()?;
    let rack = rack.split('/').next()?;
    match rack.split('_').nth(1) {
        Some(suffix) => suffix.parse().ok(),
        None => Some(DbbcMode::Ddc),
    }
}

/// e.g. `equip,dbbc_ddc/fila10g,...`
fn parse_equip(line: &ClassifiedLine) -> Option<DbbcMode> {
    line.after("equip,dbbc_")?
        .split(|c| c == ',' || c == '/')
        .next()?
        .trim()
        .parse()
        .ok()
}

/// e.g. `&dbbc01d/bbc01=638.49,a,16.00`. DBBC commands other than BBC
/// definitions give `None`.
fn parse_bbc(line: &ClassifiedLine) -> Result<Option<BbcDefinition>, LineError> {
    let definition = match line.body.split('/').nth(1) {
        Some(d) => d,
        None => return Ok(None),
    };
    let (name, values) = match definition.split_once('=') {
        Some(s) => s,
        None => return Ok(None),
    };
    let number = match name
        .trim()
        .strip_prefix("bbc")
        .and_then(|n| n.parse::<u32>().ok())
    {
        Some(n) => n,
        None => return Ok(None),
    };

    let fields = values.split(',').map(|f| f.trim()).collect::<Vec<_>>();
    let [freq, if_name, bw, ..] = fields.as_slice() else {
        return Err(LineError::MissingField {
            directive: "bbc",
            field: "frequency, IF or bandwidth",
        });
    };
    let parse_float = |s: &str| {
        s.parse::<f64>().map_err(|_| LineError::ParseFloat {
            string: s.to_string(),
        })
    };
    Ok(Some(BbcDefinition {
        number,
        freq_mhz: parse_float(*freq)?,
        if_name: if_name.to_string(),
        bandwidth_mhz: parse_float(*bw)?,
    }))
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Parsing of Field System receiver calibration ("RXG") files.
//!
//! Lines starting with `*` are comments. Every other line is a field, and
//! fields come in a fixed order; this order is described by [`RXG_SCHEMA`]
//! rather than by counting lines.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use itertools::Itertools;
use strum_macros::{Display, EnumString};

use super::RxgError;
use crate::constants::FIXED_LO_TOLERANCE_MHZ;

/// A receiver polarisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Polarisation {
    #[strum(serialize = "lcp")]
    Lcp,

    #[strum(serialize = "rcp")]
    Rcp,
}

impl Polarisation {
    /// The single letter used in ANTAB INDEX entries.
    pub fn letter(self) -> char {
        match self {
            Polarisation::Lcp => 'L',
            Polarisation::Rcp => 'R',
        }
    }
}

/// The fields of an RXG file, in the order that they appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum RxgField {
    #[strum(serialize = "LO")]
    Lo,
    #[strum(serialize = "creation date")]
    Date,
    #[strum(serialize = "FWHM")]
    Fwhm,
    #[strum(serialize = "polarisations")]
    Pols,
    #[strum(serialize = "DPFU")]
    Dpfu,
    #[strum(serialize = "gain curve")]
    Gain,
    #[strum(serialize = "Tcal table")]
    Tcal,
    #[strum(serialize = "Trec")]
    Trec,
    #[strum(serialize = "spillover table")]
    Spillover,
}

#[derive(Debug, Clone, Copy)]
enum FieldShape {
    /// A single line with a bounded number of tokens.
    Line { min: usize, max: Option<usize> },

    /// Rows of exactly `row_len` tokens, finished by a `terminator` line.
    Table {
        row_len: usize,
        terminator: &'static str,
    },
}

#[derive(Debug, Clone, Copy)]
struct FieldSpec {
    field: RxgField,
    shape: FieldShape,
    /// Older files sometimes stop after the Tcal table.
    required: bool,
}

const RXG_SCHEMA: [FieldSpec; 9] = [
    FieldSpec {
        field: RxgField::Lo,
        shape: FieldShape::Line { min: 2, max: None },
        required: true,
    },
    FieldSpec {
        field: RxgField::Date,
        shape: FieldShape::Line {
            min: 1,
            max: Some(3),
        },
        required: true,
    },
    FieldSpec {
        field: RxgField::Fwhm,
        // e.g. "constant 0.0047 0.0049", with a value for each polarisation.
        shape: FieldShape::Line {
            min: 1,
            max: Some(3),
        },
        required: true,
    },
    FieldSpec {
        field: RxgField::Pols,
        shape: FieldShape::Line {
            min: 1,
            max: Some(2),
        },
        required: true,
    },
    FieldSpec {
        field: RxgField::Dpfu,
        shape: FieldShape::Line {
            min: 1,
            max: Some(2),
        },
        required: true,
    },
    FieldSpec {
        field: RxgField::Gain,
        shape: FieldShape::Line { min: 3, max: None },
        required: true,
    },
    FieldSpec {
        field: RxgField::Tcal,
        shape: FieldShape::Table {
            row_len: 3,
            terminator: "end_tcal_table",
        },
        required: true,
    },
    FieldSpec {
        field: RxgField::Trec,
        shape: FieldShape::Line {
            min: 1,
            max: Some(2),
        },
        required: false,
    },
    FieldSpec {
        field: RxgField::Spillover,
        shape: FieldShape::Table {
            row_len: 2,
            terminator: "end_spillover_table",
        },
        required: false,
    },
];

/// The LO frequencies that an RXG file applies to.
#[derive(Debug, Clone, PartialEq)]
pub enum LoApplicability {
    /// Any LO within [`FIXED_LO_TOLERANCE_MHZ`] of one of these values.
    Fixed(Vec<f64>),

    /// Any LO in this inclusive range.
    Range { min: f64, max: f64 },
}

impl LoApplicability {
    pub fn contains(&self, lo_mhz: f64) -> bool {
        match self {
            LoApplicability::Fixed(values) => values
                .iter()
                .any(|v| (lo_mhz - v).abs() <= FIXED_LO_TOLERANCE_MHZ),
            LoApplicability::Range { min, max } => (*min..=*max).contains(&lo_mhz),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TcalEntry {
    pub pol: Polarisation,
    pub freq_mhz: f64,
    pub tcal_k: f64,
}

/// An elevation-dependent gain polynomial, e.g. `ELEV POLY 0.9 1e-3 -1e-5`.
#[derive(Debug, Clone, PartialEq)]
pub struct GainCurve {
    /// The independent variable (usually "ELEV").
    pub variable: String,
    /// The curve type (usually "POLY").
    pub kind: String,
    /// The tokens following the variable and type, verbatim.
    pub coeffs: Vec<String>,
}

/// The contents of one RXG file.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationCurve {
    pub file: PathBuf,
    pub lo: LoApplicability,
    pub date: String,
    pub fwhm: Vec<String>,
    pub pols: Vec<Polarisation>,
    pub dpfu: Vec<String>,
    pub gain: GainCurve,
    pub tcal: Vec<TcalEntry>,
    pub trec: Vec<f64>,
    /// (elevation, spillover temperature) pairs.
    pub spillover: Vec<(f64, f64)>,
}

impl CalibrationCurve {
    /// The file name without its directory.
    pub fn file_name(&self) -> String {
        self.file
            .file_name()
            .map(|f| f.to_string_lossy().to_string())
            .unwrap_or_else(|| self.file.display().to_string())
    }

    /// Interpolate the Tcal table of a polarisation at the given frequency.
    /// Frequencies outside of the table's span give `None`, as does a Tcal of
    /// 0.
    pub fn tcal_at(&self, pol: Polarisation, freq_mhz: f64) -> Option<f64> {
        let rows = self.tcal.iter().filter(|e| e.pol == pol).collect::<Vec<_>>();
        let tcal = match rows.as_slice() {
            [] => None,
            [only] => (only.freq_mhz == freq_mhz).then_some(only.tcal_k),
            _ => rows.iter().tuple_windows().find_map(|(a, b)| {
                if a.freq_mhz <= freq_mhz && freq_mhz <= b.freq_mhz {
                    let df = b.freq_mhz - a.freq_mhz;
                    if df == 0.0 {
                        Some(a.tcal_k)
                    } else {
                        Some(a.tcal_k + (freq_mhz - a.freq_mhz) * (b.tcal_k - a.tcal_k) / df)
                    }
                } else {
                    None
                }
            }),
        };
        tcal.filter(|t| *t != 0.0)
    }

    /// The lowest and highest frequencies of the Tcal table.
    pub fn tcal_span(&self) -> Option<(f64, f64)> {
        self.tcal
            .iter()
            .map(|e| e.freq_mhz)
            .minmax_by(|a, b| a.total_cmp(b))
            .into_option()
    }
}

/// Read an RXG file.
pub fn read_rxg_file<P: AsRef<Path>>(path: P) -> Result<CalibrationCurve, RxgError> {
    let path = path.as_ref();
    let mut buf = BufReader::new(File::open(path)?);
    parse_rxg(&mut buf, path)
}

/// Parse a buffer containing an RXG file. `file` is used for error messages
/// and is recorded in the returned curve.
pub fn parse_rxg<T: std::io::BufRead>(
    buf: &mut T,
    file: &Path,
) -> Result<CalibrationCurve, RxgError> {
    let file_str = || file.display().to_string();

    // Collect all non-comment lines along with their line numbers.
    let mut lines = vec![];
    let mut line = String::new();
    let mut line_num: u32 = 0;
    while buf.read_line(&mut line)? > 0 {
        line_num += 1;
        let trimmed = line.trim();
        if !trimmed.is_empty() && !trimmed.starts_with('*') {
            lines.push((
                line_num,
                trimmed
                    .split_ascii_whitespace()
                    .map(|s| s.to_string())
                    .collect::<Vec<_>>(),
            ));
        }
        line.clear();
    }

    // Walk the schema, handing out lines to each field.
    let mut lines = lines.into_iter().peekable();
    let mut raw: Vec<(RxgField, Vec<(u32, Vec<String>)>)> = Vec::with_capacity(RXG_SCHEMA.len());
    for entry in RXG_SCHEMA {
        if lines.peek().is_none() {
            if entry.required {
                return Err(RxgError::MissingField {
                    file: file_str(),
                    field: entry.field,
                });
            }
            raw.push((entry.field, vec![]));
            continue;
        }

        match entry.shape {
            FieldShape::Line { min, max } => {
                let (line_num, tokens) = lines.next().unwrap_or_default();
                if tokens.len() < min || max.map(|m| tokens.len() > m).unwrap_or(false) {
                    return Err(RxgError::Arity {
                        file: file_str(),
                        line_num,
                        field: entry.field,
                        got: tokens.len(),
                        expected: match max {
                            Some(max) if max == min => format!("{min}"),
                            Some(max) => format!("{min} to {max}"),
                            None => format!("at least {min}"),
                        },
                    });
                }
                raw.push((entry.field, vec![(line_num, tokens)]));
            }

            FieldShape::Table {
                row_len,
                terminator,
            } => {
                let mut rows = vec![];
                let mut terminated = false;
                for (line_num, tokens) in lines.by_ref() {
                    if tokens.first().map(|t| t.as_str()) == Some(terminator) {
                        terminated = true;
                        break;
                    }
                    if tokens.len() != row_len {
                        return Err(RxgError::Arity {
                            file: file_str(),
                            line_num,
                            field: entry.field,
                            got: tokens.len(),
                            expected: format!("{row_len}"),
                        });
                    }
                    rows.push((line_num, tokens));
                }
                if !terminated {
                    return Err(RxgError::MissingTerminator {
                        file: file_str(),
                        field: entry.field,
                        terminator,
                    });
                }
                raw.push((entry.field, rows));
            }
        }
    }

    // Now interpret the tokens.
    let parse_float = |string: &str, line_num: u32| -> Result<f64, RxgError> {
        string.parse().map_err(|_| RxgError::ParseFloat {
            file: file_str(),
            line_num,
            string: string.to_string(),
        })
    };
    let parse_pol = |string: &str, line_num: u32| -> Result<Polarisation, RxgError> {
        string.parse().map_err(|_| RxgError::UnknownPol {
            file: file_str(),
            line_num,
            string: string.to_string(),
        })
    };
    let single = |field: RxgField| -> Option<&(u32, Vec<String>)> {
        raw.iter()
            .find(|(f, _)| *f == field)
            .and_then(|(_, rows)| rows.first())
    };
    let table = |field: RxgField| -> &[(u32, Vec<String>)] {
        raw.iter()
            .find(|(f, _)| *f == field)
            .map(|(_, rows)| rows.as_slice())
            .unwrap_or(&[])
    };
    let missing = |field: RxgField| RxgError::MissingField {
        file: file_str(),
        field,
    };

    let lo = {
        let (line_num, tokens) = single(RxgField::Lo).ok_or_else(|| missing(RxgField::Lo))?;
        let values = tokens[1..]
            .iter()
            .map(|s| parse_float(s, *line_num))
            .collect::<Result<Vec<_>, _>>()?;
        match (tokens[0].as_str(), values.as_slice()) {
            ("fixed", _) => LoApplicability::Fixed(values),
            ("range", [min, max]) => LoApplicability::Range {
                min: *min,
                max: *max,
            },
            ("range", _) => {
                return Err(RxgError::Arity {
                    file: file_str(),
                    line_num: *line_num,
                    field: RxgField::Lo,
                    got: tokens.len(),
                    expected: "3".to_string(),
                })
            }
            (other, _) => {
                return Err(RxgError::UnknownLoType {
                    file: file_str(),
                    line_num: *line_num,
                    string: other.to_string(),
                })
            }
        }
    };

    let date = single(RxgField::Date)
        .map(|(_, t)| t.join(" "))
        .ok_or_else(|| missing(RxgField::Date))?;
    let fwhm = single(RxgField::Fwhm)
        .map(|(_, t)| t.clone())
        .ok_or_else(|| missing(RxgField::Fwhm))?;
    let pols = {
        let (line_num, tokens) =
            single(RxgField::Pols).ok_or_else(|| missing(RxgField::Pols))?;
        tokens
            .iter()
            .map(|s| parse_pol(s, *line_num))
            .collect::<Result<Vec<_>, _>>()?
    };
    let dpfu = {
        let (line_num, tokens) =
            single(RxgField::Dpfu).ok_or_else(|| missing(RxgField::Dpfu))?;
        for t in tokens {
            parse_float(t, *line_num)?;
        }
        tokens.clone()
    };
    let gain = {
        let (_, tokens) = single(RxgField::Gain).ok_or_else(|| missing(RxgField::Gain))?;
        GainCurve {
            variable: tokens[0].clone(),
            kind: tokens[1].clone(),
            coeffs: tokens[2..].to_vec(),
        }
    };
    let tcal = table(RxgField::Tcal)
        .iter()
        .map(|(line_num, tokens)| {
            Ok(TcalEntry {
                pol: parse_pol(&tokens[0], *line_num)?,
                freq_mhz: parse_float(&tokens[1], *line_num)?,
                tcal_k: parse_float(&tokens[2], *line_num)?,
            })
        })
        .collect::<Result<Vec<_>, RxgError>>()?;
    let trec = match single(RxgField::Trec) {
        Some((line_num, tokens)) => tokens
            .iter()
            .map(|s| parse_float(s, *line_num))
            .collect::<Result<Vec<_>, _>>()?,
        None => vec![],
    };
    let spillover = table(RxgField::Spillover)
        .iter()
        .map(|(line_num, tokens)| {
            Ok((
                parse_float(&tokens[0], *line_num)?,
                parse_float(&tokens[1], *line_num)?,
            ))
        })
        .collect::<Result<Vec<_>, RxgError>>()?;

    Ok(CalibrationCurve {
        file: file.to_path_buf(),
        lo,
        date,
        fwhm,
        pols,
        dpfu,
        gain,
        tcal,
        trec,
        spillover,
    })
}

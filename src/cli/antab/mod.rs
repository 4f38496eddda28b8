// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.


use std::{
    path::{Path, PathBuf},
    str::FromStr,
};

use chrono::Utc;
use clap::Parser;
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};

use super::common::{display_warnings, ArgFileTypes, InfoPrinter, Warn, ARG_FILE_HELP};
use crate::{
    antab::AntabMeta,
    catalog::{Catalog, CatalogConfig},
    constants::{ANTAB_EXTENSION, DEFAULT_INTEGRATION_TIME_S, DEFAULT_RXG_DIR},
    fslog::{LogName, ReadLogError},
    params::AntabParams,
    AntabfsError,
};

lazy_static::lazy_static! {
    static ref RXG_DIR_HELP: String =
        format!("The directory containing RXG files. Only files whose names contain the station code (e.g. calYsX.rxg for station YS) are used. Default: {DEFAULT_RXG_DIR}");

    static ref INTEGRATION_TIME_HELP: String =
        format!("The length of each Tsys integration window [seconds]. Default: {DEFAULT_INTEGRATION_TIME_S}");

    static ref OUTPUT_HELP: String =
        format!("The path to the output ANTAB file. Default: <log file stem>.{ANTAB_EXTENSION} in the current directory");
}

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct AntabArgs {
    /// The Field System log to read, e.g. r1234ys.log. Unless --station is
    /// given, the experiment and station are taken from the file name.
    #[clap(name = "LOG_FILE", parse(from_os_str))]
    pub(super) log_file: Option<PathBuf>,

    #[clap(name = "ARGUMENTS_FILE", help = ARG_FILE_HELP.as_str(), parse(from_os_str))]
    pub(super) args_file: Option<PathBuf>,

    #[clap(long, help = RXG_DIR_HELP.as_str(), help_heading = "CALIBRATION")]
    pub(super) rxg_dir: Option<PathBuf>,

    /// Use exactly these RXG files (in this order) rather than searching a
    /// directory. When more than one file applies to an LO, the first is used.
    #[clap(long, multiple_values(true), help_heading = "CALIBRATION")]
    pub(super) rxg_files: Option<Vec<PathBuf>>,

    /// The two-letter station code, e.g. YS. Overrides the station in the log
    /// file name.
    #[clap(short, long)]
    pub(super) station: Option<String>,

    #[clap(long, help = INTEGRATION_TIME_HELP.as_str(), help_heading = "CALIBRATION")]
    pub(super) integration_time: Option<f64>,

    /// Replace Tsys values that aren't within (0, MAX_TSYS] K with the
    /// geometric mean of the good values of the same channel in the same scan,
    /// or failing that, the same setup. The default is to write all values.
    #[clap(long, help_heading = "OUTPUT FILES")]
    pub(super) max_tsys: Option<f64>,

    #[clap(short, long, help = OUTPUT_HELP.as_str(), help_heading = "OUTPUT FILES")]
    pub(super) output: Option<PathBuf>,
}

/// Does this path look like an argument file?
fn is_arg_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| ArgFileTypes::from_str(&e.to_lowercase()).is_ok())
        .unwrap_or(false)
}

/// Station codes are two letters, and are written in upper case.
fn parse_station(s: &str) -> Result<String, AntabArgsError> {
    let s = s.trim();
    if s.chars().count() == 2 && s.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(s.to_uppercase())
    } else {
        Err(AntabArgsError::BadStation(s.to_string()))
    }
}

/// The part of a log's file name before the first '.', e.g. "r1234ys".
fn log_stem(log_file: &Path) -> String {
    log_file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .and_then(|n| n.split('.').next().map(|s| s.to_string()))
        .unwrap_or_default()
}

impl AntabArgs {
    /// Both command-line and file arguments overlap in terms of what is
    /// available; this function consolidates everything that was specified into
    /// a single struct. Where applicable, it will prefer CLI parameters over
    /// those in the file.
    ///
    /// If the only positional argument is an argument file, then it is treated
    /// as one rather than as the log file.
    ///
    /// This function should only ever merge arguments, and not try to make
    /// sense of them.
    pub(super) fn merge(self) -> Result<AntabArgs, AntabfsError> {
        debug!("Merging command-line arguments with the argument file");

        let mut cli_args = self;
        if cli_args.args_file.is_none() && cli_args.log_file.as_deref().map_or(false, is_arg_file)
        {
            cli_args.args_file = cli_args.log_file.take();
        }

        if let Some(arg_file) = cli_args.args_file {
            // Read in the file arguments. Ensure all of the file args are
            // accounted for by pattern matching.
            let AntabArgs {
                log_file,
                args_file: _,
                rxg_dir,
                rxg_files,
                station,
                integration_time,
                max_tsys,
                output,
            } = unpack_arg_file!(arg_file);

            // Merge all the arguments, preferring the CLI args when available.
            Ok(AntabArgs {
                log_file: cli_args.log_file.or(log_file),
                args_file: None,
                rxg_dir: cli_args.rxg_dir.or(rxg_dir),
                rxg_files: cli_args.rxg_files.or(rxg_files),
                station: cli_args.station.or(station),
                integration_time: cli_args.integration_time.or(integration_time),
                max_tsys: cli_args.max_tsys.or(max_tsys),
                output: cli_args.output.or(output),
            })
        } else {
            Ok(cli_args)
        }
    }

    pub(super) fn parse(self) -> Result<AntabParams, AntabfsError> {
        debug!("{:#?}", self);

        let Self {
            log_file,
            args_file: _,
            rxg_dir,
            rxg_files,
            station,
            integration_time,
            max_tsys,
            output,
        } = self;

        let log_file = log_file.ok_or(AntabArgsError::NoLogFile)?;
        if !log_file.is_file() {
            return Err(AntabArgsError::LogDoesntExist(log_file.display().to_string()).into());
        }

        let (experiment, station) = match (LogName::from_path(&log_file), station) {
            (Ok(name), None) => (name.experiment, name.station),
            (Ok(name), Some(s)) => {
                let s = parse_station(&s)?;
                if s != name.station {
                    format!(
                        "Using station {s} rather than {} from the log file name",
                        name.station
                    )
                    .warn();
                }
                (name.experiment, s)
            }
            // Without a usable file name, the whole stem is the experiment.
            (Err(_), Some(s)) => (log_stem(&log_file).to_lowercase(), parse_station(&s)?),
            (Err(e), None) => return Err(AntabArgsError::Log(e).into()),
        };

        let integration_time_s = integration_time.unwrap_or(DEFAULT_INTEGRATION_TIME_S);
        if !(integration_time_s.is_finite() && integration_time_s > 0.0) {
            return Err(AntabArgsError::BadIntegrationTime(integration_time_s).into());
        }
        if let Some(m) = max_tsys {
            if !(m.is_finite() && m > 0.0) {
                return Err(AntabArgsError::BadMaxTsys(m).into());
            }
        }

        let catalog_config = match rxg_files {
            Some(files) => {
                if rxg_dir.is_some() {
                    "--rxg-dir is ignored because RXG files were given explicitly".warn();
                }
                CatalogConfig::Files(files)
            }
            None => CatalogConfig::Directory(
                rxg_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_RXG_DIR)),
            ),
        };
        let catalog = Catalog::load(&catalog_config, &station)?;

        let output = output.unwrap_or_else(|| {
            PathBuf::from(format!("{}.{ANTAB_EXTENSION}", log_stem(&log_file)))
        });

        let mut printer = InfoPrinter::new("ANTAB details".into());
        printer.push_block(vec![
            format!("Log file: {}", log_file.display()).into(),
            format!("Experiment {experiment}, station {station}").into(),
        ]);
        let mut block = vec![format!("{} RXG file(s)", catalog.curves().len()).into()];
        for curve in catalog.curves() {
            block.push(format!("  {} ({})", curve.file_name(), curve.date).into());
        }
        printer.push_block(block);
        printer.push_line(format!("Tsys integration time: {integration_time_s} s").into());
        if let Some(m) = max_tsys {
            printer.push_line(format!("Replacing Tsys values outside (0, {m}] K").into());
        }
        printer.push_line(format!("Output: {}", output.display()).into());
        printer.display();

        display_warnings();

        Ok(AntabParams {
            log_file,
            catalog,
            meta: AntabMeta {
                station,
                experiment,
                produced: Utc::now().date_naive(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            integration_time_s,
            max_tsys,
            output,
        })
    }

    pub(super) fn run(self, dry_run: bool) -> Result<(), AntabfsError> {
        debug!("Converting arguments into parameters");
        trace!("{:#?}", self);
        let params = self.parse()?;

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        params.run()?;
        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub(super) enum AntabArgsError {
    #[error("No log file was specified")]
    NoLogFile,

    #[error("The log file {0} doesn't exist")]
    LogDoesntExist(String),

    #[error("'{0}' isn't a two-letter station code")]
    BadStation(String),

    #[error("The integration time must be a positive number of seconds, not {0}")]
    BadIntegrationTime(f64),

    #[error("The maximum Tsys must be a positive number of Kelvin, not {0}")]
    BadMaxTsys(f64),

    #[error(transparent)]
    Log(#[from] ReadLogError),
}

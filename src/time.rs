// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Field System timestamps.
//!
//! Every line of a Field System log starts with a timestamp like
//! `2017.067.01:06:11.50`: the year, the day of the year, the time of day and
//! hundredths of a second.

use std::fmt::Display;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};
use regex::Regex;
use thiserror::Error;

use crate::constants::CONT_CAL_SWAP_DATE;

lazy_static::lazy_static! {
    static ref TIMESTAMP_REGEX: Regex =
        Regex::new(r"^(\d{4})\.(\d{3})\.(\d{2}):(\d{2}):(\d{2})\.(\d{2})").unwrap();
}

/// The number of characters in a Field System timestamp.
pub(crate) const TIMESTAMP_LEN: usize = 20;

/// An instant in a Field System log (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LogTime(NaiveDateTime);

impl LogTime {
    /// Parse the timestamp at the start of a log line. Anything following the
    /// timestamp is ignored.
    pub fn parse_line_start(line: &str) -> Result<LogTime, LogTimeError> {
        let caps = TIMESTAMP_REGEX
            .captures(line)
            .ok_or_else(|| LogTimeError::Malformed(truncate(line)))?;
        // The regex guarantees that each group is made of digits, so the
        // conversions can only fail through overflow, which they can't.
        let num = |i: usize| -> u32 { caps[i].parse().unwrap_or(u32::MAX) };
        let year = caps[1].parse::<i32>().unwrap_or(i32::MAX);
        let (doy, hour, min, sec, hundredths) = (num(2), num(3), num(4), num(5), num(6));

        NaiveDate::from_yo_opt(year, doy)
            .and_then(|d| d.and_hms_micro_opt(hour, min, sec, hundredths * 10_000))
            .map(LogTime)
            .ok_or_else(|| LogTimeError::OutOfRange(caps[0].to_string()))
    }

    pub fn from_naive(dt: NaiveDateTime) -> LogTime {
        LogTime(dt)
    }

    pub fn naive(self) -> NaiveDateTime {
        self.0
    }

    pub fn day_of_year(self) -> u32 {
        self.0.ordinal()
    }

    pub fn hour(self) -> u32 {
        self.0.hour()
    }

    /// The minutes of the hour, including the seconds as a fraction.
    pub fn fractional_minute(self) -> f64 {
        self.0.minute() as f64
            + self.0.second() as f64 / 60.0
            + self.0.nanosecond() as f64 / 60e9
    }

    /// Is this instant before the date on which the `tpcont` noise-diode order
    /// was swapped?
    pub fn before_cont_cal_swap(self) -> bool {
        let (y, m, d) = CONT_CAL_SWAP_DATE;
        match NaiveDate::from_ymd_opt(y, m, d) {
            Some(swap) => self.0.date() < swap,
            None => false,
        }
    }

    /// The time between `earlier` and this instant.
    pub fn since(self, earlier: LogTime) -> Duration {
        self.0 - earlier.0
    }

    pub fn add(self, d: Duration) -> LogTime {
        LogTime(self.0 + d)
    }

    /// The format used in ANTAB files, e.g. `067 01:06.19`.
    pub fn antab_format(self) -> String {
        format!(
            "{:03} {:02}:{:05.2}",
            self.day_of_year(),
            self.hour(),
            self.fractional_minute()
        )
    }
}

impl Display for LogTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:04}.{:03}.{:02}:{:02}:{:02}.{:02}",
            self.0.year(),
            self.0.ordinal(),
            self.0.hour(),
            self.0.minute(),
            self.0.second(),
            self.0.nanosecond() / 10_000_000
        )
    }
}

fn truncate(line: &str) -> String {
    line.chars().take(TIMESTAMP_LEN).collect()
}

#[derive(Error, Debug, PartialEq)]
pub enum LogTimeError {
    #[error("'{0}' does not start with a timestamp (YYYY.DDD.HH:MM:SS.ff)")]
    Malformed(String),

    #[error("Timestamp '{0}' is not a valid date")]
    OutOfRange(String),
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_parse_timestamp() {
        let t = LogTime::parse_line_start("2017.067.01:06:11.50#tpicd#tpi/a05,1234").unwrap();
        assert_eq!(t.day_of_year(), 67);
        assert_eq!(t.hour(), 1);
        assert_abs_diff_eq!(t.fractional_minute(), 6.0 + 11.5 / 60.0, epsilon = 1e-9);
        assert_eq!(t.naive().year(), 2017);
        assert_eq!(t.naive().month(), 3);
        assert_eq!(t.naive().day(), 8);
        assert_eq!(t.to_string(), "2017.067.01:06:11.50");
    }

    #[test]
    fn test_hundredths_are_microseconds() {
        let a = LogTime::parse_line_start("2020.001.00:00:00.01").unwrap();
        let b = LogTime::parse_line_start("2020.001.00:00:00.00").unwrap();
        assert_eq!(a.since(b), Duration::microseconds(10_000));
    }

    #[test]
    fn test_malformed_timestamps() {
        assert!(matches!(
            LogTime::parse_line_start("hello there"),
            Err(LogTimeError::Malformed(_))
        ));
        assert!(matches!(
            LogTime::parse_line_start("2017.67.01:06:11.50"),
            Err(LogTimeError::Malformed(_))
        ));
        // Day 400 doesn't exist.
        assert!(matches!(
            LogTime::parse_line_start("2017.400.01:06:11.50"),
            Err(LogTimeError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_antab_format() {
        let t = LogTime::parse_line_start("2017.067.01:06:11.50").unwrap();
        assert_eq!(t.antab_format(), "067 01:06.19");
        let t = LogTime::parse_line_start("2017.005.23:00:03.00").unwrap();
        assert_eq!(t.antab_format(), "005 23:00.05");
    }

    #[test]
    fn test_cont_cal_swap() {
        let before = LogTime::parse_line_start("2015.259.23:59:59.99").unwrap();
        let after = LogTime::parse_line_start("2015.260.00:00:00.00").unwrap();
        // 2015-09-17 is day 260.
        assert!(before.before_cont_cal_swap());
        assert!(!after.before_cont_cal_swap());
    }
}

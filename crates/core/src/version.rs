//! File version stamps
//!
//! The first four bytes of every index file hold a version expressed as a
//! calendar date. On disk it is the proleptic Gregorian ordinal of that date
//! (0001-01-01 is day 1) as a big-endian `u32`; for humans it is the compact
//! `YYYYMMDD` form.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Local, NaiveDate};

use crate::codec::{decode_u32, encode_u32, U32_WIDTH};
use crate::error::{Error, Result};

/// A calendar date used as a file format version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionDate(NaiveDate);

impl VersionDate {
    /// Wrap a calendar date.
    pub fn new(date: NaiveDate) -> Self {
        VersionDate(date)
    }

    /// Today's date in the local time zone.
    pub fn today() -> Self {
        VersionDate(Local::now().date_naive())
    }

    /// Build from a proleptic Gregorian ordinal (0001-01-01 is 1).
    pub fn from_ordinal(ordinal: u32) -> Result<Self> {
        i32::try_from(ordinal)
            .ok()
            .filter(|&days| days >= 1)
            .and_then(NaiveDate::from_num_days_from_ce_opt)
            .map(VersionDate)
            .ok_or_else(|| Error::corrupt(format!("version ordinal {} is not a date", ordinal)))
    }

    /// Proleptic Gregorian ordinal of this date.
    pub fn ordinal(&self) -> u32 {
        // Dates are only ever built from ordinals >= 1 or from real calendar
        // days after year 1, so the value is positive.
        self.0.num_days_from_ce().max(1) as u32
    }

    /// Parse the compact `YYYYMMDD` form.
    pub fn parse_compact(s: &str) -> Result<Self> {
        if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::corrupt(format!("version '{}' is not YYYYMMDD", s)));
        }
        NaiveDate::parse_from_str(s, "%Y%m%d")
            .ok()
            .filter(|d| d.year() >= 1)
            .map(VersionDate)
            .ok_or_else(|| Error::corrupt(format!("version '{}' is not a valid date", s)))
    }

    /// Render as `YYYYMMDD`.
    pub fn to_compact(&self) -> String {
        self.0.format("%Y%m%d").to_string()
    }

    /// The underlying calendar date.
    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Encode as a big-endian ordinal.
    pub fn encode(&self) -> [u8; U32_WIDTH] {
        encode_u32(self.ordinal())
    }

    /// Decode a big-endian ordinal.
    pub fn decode(data: &[u8]) -> Result<Self> {
        Self::from_ordinal(decode_u32(data)?)
    }
}

impl fmt::Display for VersionDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_compact())
    }
}

impl FromStr for VersionDate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_compact(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_ordinal_epoch() {
        let v = VersionDate::parse_compact("00010101").unwrap();
        assert_eq!(v.ordinal(), 1);
    }

    #[test]
    fn test_known_ordinal() {
        // 2006-07-08 is day 732500 counting 0001-01-01 as day 1
        let v = VersionDate::parse_compact("20060708").unwrap();
        assert_eq!(v.ordinal(), 732_500);
        assert_eq!(VersionDate::from_ordinal(732_500).unwrap(), v);
    }

    #[test]
    fn test_encode_is_big_endian_ordinal() {
        let v = VersionDate::parse_compact("20040723").unwrap();
        assert_eq!(v.encode(), v.ordinal().to_be_bytes());
        assert_eq!(VersionDate::decode(&v.encode()).unwrap(), v);
    }

    #[test]
    fn test_display_and_parse() {
        let v: VersionDate = "19991231".parse().unwrap();
        assert_eq!(v.to_string(), "19991231");
    }

    #[test]
    fn test_rejects_bad_dates() {
        assert!(VersionDate::parse_compact("20230230").is_err());
        assert!(VersionDate::parse_compact("2023-01-01").is_err());
        assert!(VersionDate::parse_compact("00000101").is_err());
        assert!(VersionDate::from_ordinal(0).is_err());
        assert!(VersionDate::from_ordinal(u32::MAX).is_err());
    }

    #[test]
    fn test_month_ends_and_leap_days() {
        for s in ["20000229", "20240229", "19000228", "20230430", "20231231", "99991231"] {
            let v = VersionDate::parse_compact(s).unwrap();
            assert_eq!(v.to_compact(), s);
            assert_eq!(VersionDate::from_ordinal(v.ordinal()).unwrap(), v);
        }
        // 1900 and 2100 are not leap years, 2000 is
        assert!(VersionDate::parse_compact("19000229").is_err());
        assert!(VersionDate::parse_compact("21000229").is_err());
        assert!(VersionDate::parse_compact("20230431").is_err());
    }

    #[test]
    fn test_today_roundtrips() {
        let today = VersionDate::today();
        assert_eq!(VersionDate::decode(&today.encode()).unwrap(), today);
    }

    proptest! {
        /// Every calendar date from 0001-01-01 to 9999-12-31.
        #[test]
        fn prop_compact_roundtrip(ordinal in 1i32..=3_652_059) {
            let date = NaiveDate::from_num_days_from_ce_opt(ordinal).unwrap();
            let s = format!("{:04}{:02}{:02}", date.year(), date.month(), date.day());
            let v = VersionDate::parse_compact(&s).unwrap();
            prop_assert_eq!(v.date(), date);
            prop_assert_eq!(v.ordinal(), ordinal as u32);
            prop_assert_eq!(v.to_compact(), s);
            prop_assert_eq!(VersionDate::from_ordinal(v.ordinal()).unwrap(), v);
        }
    }
}

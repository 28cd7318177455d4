//! Archive capture timestamps.
//!
//! Web archives identify captures by a fixed-width, zero-padded
//! `YYYYMMDDHHMMSS` string in UTC. Because the format is fixed-width,
//! lexicographic order on the raw string is chronological order, and
//! [`Timestamp`] orders itself that way.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::{PalimpsestError, Result};

const FORMAT: &str = "%Y%m%d%H%M%S";

/// A validated 14-digit capture timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timestamp {
    raw: String,
    at: NaiveDateTime,
}

impl Timestamp {
    /// Parses a `YYYYMMDDHHMMSS` string.
    ///
    /// # Errors
    ///
    /// Returns [`PalimpsestError::InvalidTimestamp`] unless the input is exactly
    /// 14 ASCII digits forming a real calendar date and time.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.len() != 14 || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PalimpsestError::InvalidTimestamp(raw.to_string()));
        }
        let at = NaiveDateTime::parse_from_str(raw, FORMAT)
            .map_err(|_| PalimpsestError::InvalidTimestamp(raw.to_string()))?;
        Ok(Self { raw: raw.to_string(), at })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The capture instant as a naive (UTC) date-time.
    pub fn naive(&self) -> NaiveDateTime {
        self.at
    }

    pub fn year(&self) -> i32 {
        self.at.year()
    }

    pub fn month(&self) -> u32 {
        self.at.month()
    }

    /// Calendar quarter, 1 through 4.
    pub fn quarter(&self) -> u32 {
        (self.at.month() - 1) / 3 + 1
    }

    /// `YYYY-MM` label of the capture month.
    pub fn year_month(&self) -> String {
        format!("{:04}-{:02}", self.year(), self.month())
    }

    pub fn to_utc(&self) -> DateTime<Utc> {
        self.at.and_utc()
    }

    /// Converts the capture instant into the named IANA zone.
    ///
    /// An unknown zone name is not fatal: the UTC value is returned instead and
    /// a warning is logged.
    pub fn to_local(&self, zone: &str) -> DateTime<FixedOffset> {
        let utc = self.to_utc();
        match zone.parse::<Tz>() {
            Ok(tz) => utc.with_timezone(&tz).fixed_offset(),
            Err(_) => {
                tracing::warn!(zone, timestamp = %self.raw, "unknown timezone, falling back to UTC");
                utc.fixed_offset()
            }
        }
    }
}

impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for Timestamp {}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl std::hash::Hash for Timestamp {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for Timestamp {
    type Err = PalimpsestError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Timestamp {
    type Error = PalimpsestError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Timestamp> for String {
    fn from(value: Timestamp) -> Self {
        value.raw
    }
}

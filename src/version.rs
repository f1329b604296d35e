// src/version.rs

//! Four-part package version numbers
//!
//! Installed packages live in folders named `major.minor.build.revision`.
//! [`Version`] is the value type used for those folder names and for the
//! version a package declares about itself.

use crate::error::{Error, Result};
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Date and date-time layouts accepted by [`Version::coerce`]
const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%b %d %Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%b %d %Y", "%B %d, %Y", "%b %d, %Y"];

/// A `(major, minor, build, revision)` version number
///
/// Ordering is lexicographic over the four components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub build: u32,
    pub revision: u32,
}

impl Version {
    pub const fn new(major: u32, minor: u32, build: u32, revision: u32) -> Self {
        Self {
            major,
            minor,
            build,
            revision,
        }
    }

    /// Parse a folder name as a version, returning `None` for anything that
    /// is not exactly four dot-separated non-negative integers
    pub fn from_folder_name(name: &str) -> Option<Self> {
        name.parse().ok()
    }

    /// Coerce a free-form version string reported by a plug-in into a Version
    ///
    /// Native plug-ins frequently report a build date instead of a version,
    /// and introspection tools copy that string into the manifest verbatim.
    /// Accepted inputs, in order:
    /// - a strict `a.b.c.d` version
    /// - a date or date-time, mapped to `(year, month, day, minute-of-day)`
    /// - any string containing an `a.b.c.d` run of digits
    pub fn coerce(raw: &str) -> Result<Self> {
        let raw = raw.trim();

        if let Ok(version) = raw.parse() {
            return Ok(version);
        }

        if let Some(version) = parse_date_stamp(raw).and_then(from_date_stamp) {
            return Ok(version);
        }

        if let Some(version) = find_embedded_version(raw) {
            return Ok(version);
        }

        Err(Error::InvalidVersion(format!(
            "Version number not recognized: {}",
            raw
        )))
    }
}

fn parse_date_stamp(raw: &str) -> Option<NaiveDateTime> {
    for format in DATE_TIME_FORMATS {
        if let Ok(stamp) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(stamp);
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    None
}

/// `(year, month, day, minute-of-day)`; years before 0 have no version
fn from_date_stamp(stamp: NaiveDateTime) -> Option<Version> {
    Some(Version::new(
        u32::try_from(stamp.year()).ok()?,
        stamp.month(),
        stamp.day(),
        stamp.hour() * 60 + stamp.minute(),
    ))
}

/// Find the first run of `digits.digits.digits.digits` inside a longer string
fn find_embedded_version(raw: &str) -> Option<Version> {
    raw.split(|c: char| !(c.is_ascii_digit() || c == '.'))
        .flat_map(|run| {
            let parts: Vec<&str> = run.split('.').collect();
            (0..parts.len().saturating_sub(3))
                .map(move |start| parts[start..start + 4].join("."))
                .collect::<Vec<_>>()
        })
        .find_map(|candidate| candidate.parse().ok())
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidVersion(s.to_string());

        let mut components = [0u32; 4];
        let mut parts = s.split('.');

        for slot in components.iter_mut() {
            let part = parts.next().ok_or_else(invalid)?;
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            *slot = part.parse().map_err(|_| invalid())?;
        }

        if parts.next().is_some() {
            return Err(invalid());
        }

        let [major, minor, build, revision] = components;
        Ok(Self::new(major, minor, build, revision))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.build, self.revision
        )
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

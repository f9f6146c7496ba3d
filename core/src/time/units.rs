use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

use super::{elapsed_seconds, parse_utc_timestamp};

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum UnitsError {
    #[error("time units must read '<unit> since <reference>', got '{0}'")]
    Malformed(String),
    #[error("unsupported time unit '{0}'")]
    UnknownUnit(String),
    #[error("unparsable reference time '{0}'")]
    Reference(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    pub fn seconds(self) -> f64 {
        match self {
            TimeUnit::Seconds => 1.0,
            TimeUnit::Minutes => 60.0,
            TimeUnit::Hours => 3_600.0,
            TimeUnit::Days => 86_400.0,
        }
    }
}

impl FromStr for TimeUnit {
    type Err = UnitsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "seconds" | "second" | "secs" | "sec" | "s" => Ok(TimeUnit::Seconds),
            "minutes" | "minute" | "mins" | "min" => Ok(TimeUnit::Minutes),
            "hours" | "hour" | "hrs" | "hr" | "h" => Ok(TimeUnit::Hours),
            "days" | "day" | "d" => Ok(TimeUnit::Days),
            other => Err(UnitsError::UnknownUnit(other.to_string())),
        }
    }
}

/// CF-convention time axis description such as `seconds since 1970-01-01 00:00:00`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeUnits {
    pub unit: TimeUnit,
    pub reference: DateTime<Utc>,
}

impl TimeUnits {
    pub fn parse(units: &str) -> Result<Self, UnitsError> {
        let (unit, reference) = units
            .trim()
            .split_once(" since ")
            .ok_or_else(|| UnitsError::Malformed(units.to_string()))?;
        let unit = unit.trim().parse::<TimeUnit>()?;

        let reference = reference.trim();
        let stripped = reference
            .strip_suffix(" UTC")
            .or_else(|| reference.strip_suffix(" utc"))
            .unwrap_or(reference);
        let reference = parse_utc_timestamp(stripped)
            .ok_or_else(|| UnitsError::Reference(reference.to_string()))?;

        Ok(Self { unit, reference })
    }

    /// Numeric value of `instant` on this axis.
    pub fn encode(&self, instant: DateTime<Utc>) -> f64 {
        elapsed_seconds(self.reference, instant) / self.unit.seconds()
    }

    pub fn encode_all(&self, instants: &[DateTime<Utc>]) -> Vec<f64> {
        instants.iter().map(|ts| self.encode(*ts)).collect()
    }
}

impl fmt::Display for TimeUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = match self.unit {
            TimeUnit::Seconds => "seconds",
            TimeUnit::Minutes => "minutes",
            TimeUnit::Hours => "hours",
            TimeUnit::Days => "days",
        };
        write!(f, "{} since {}", unit, self.reference.format("%Y-%m-%d %H:%M:%S"))
    }
}

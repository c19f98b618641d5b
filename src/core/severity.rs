//! Severity definitions
//!
//! Severities are plain integers so that any threshold, including values
//! between the named levels, can be compared against a record.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Severity(pub i32);

impl Severity {
    pub const DEBUG: Severity = Severity(-4);
    pub const INFO: Severity = Severity(0);
    pub const WARN: Severity = Severity(4);
    pub const ERROR: Severity = Severity(8);

    #[inline]
    pub const fn value(self) -> i32 {
        self.0
    }

    /// Name of the nearest named level at or below this severity
    fn base(self) -> (&'static str, i32) {
        if self < Self::INFO {
            ("DEBUG", Self::DEBUG.0)
        } else if self < Self::WARN {
            ("INFO", Self::INFO.0)
        } else if self < Self::ERROR {
            ("WARN", Self::WARN.0)
        } else {
            ("ERROR", Self::ERROR.0)
        }
    }

    /// Display color for the four named levels; other values stay uncolored
    pub fn color_code(&self) -> Option<colored::Color> {
        use colored::Color::*;
        match *self {
            Self::DEBUG => Some(Magenta),
            Self::INFO => Some(Blue),
            Self::WARN => Some(Yellow),
            Self::ERROR => Some(Red),
            _ => None,
        }
    }
}

impl Default for Severity {
    fn default() -> Self {
        Self::INFO
    }
}

impl From<i32> for Severity {
    fn from(value: i32) -> Self {
        Severity(value)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (name, base) = self.base();
        let delta = i64::from(self.0) - i64::from(base);
        if delta == 0 {
            write!(f, "{}", name)
        } else {
            write!(f, "{}{:+}", name, delta)
        }
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(value) = trimmed.parse::<i32>() {
            return Ok(Severity(value));
        }

        let upper = trimmed.to_uppercase();
        let (name, delta) = match upper.find(['+', '-']) {
            Some(idx) => {
                let delta = upper[idx..]
                    .parse::<i32>()
                    .map_err(|_| format!("Invalid severity: '{}'", s))?;
                (&upper[..idx], delta)
            }
            None => (upper.as_str(), 0),
        };

        let base = match name {
            "DEBUG" => Severity::DEBUG,
            "INFO" => Severity::INFO,
            "WARN" | "WARNING" => Severity::WARN,
            "ERROR" => Severity::ERROR,
            _ => return Err(format!("Invalid severity: '{}'", s)),
        };

        base.0
            .checked_add(delta)
            .map(Severity)
            .ok_or_else(|| format!("Invalid severity: '{}'", s))
    }
}

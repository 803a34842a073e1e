use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_DISPLAYABLE: u32 = 99;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Hour,
    Minute,
    Second,
}

impl FieldKind {
    pub const ALL: [FieldKind; 3] = [FieldKind::Hour, FieldKind::Minute, FieldKind::Second];

    pub fn next(self) -> Self {
        match self {
            FieldKind::Hour => FieldKind::Minute,
            FieldKind::Minute => FieldKind::Second,
            FieldKind::Second => FieldKind::Hour,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            FieldKind::Hour => FieldKind::Second,
            FieldKind::Minute => FieldKind::Hour,
            FieldKind::Second => FieldKind::Minute,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FieldKind::Hour => "hour",
            FieldKind::Minute => "minute",
            FieldKind::Second => "second",
        }
    }

    pub fn seconds_per_unit(self) -> i64 {
        match self {
            FieldKind::Hour => 3_600,
            FieldKind::Minute => 60,
            FieldKind::Second => 1,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FieldKind {
    type Err = UnknownFieldKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hour" | "h" => Ok(FieldKind::Hour),
            "minute" | "m" => Ok(FieldKind::Minute),
            "second" | "s" => Ok(FieldKind::Second),
            _ => Err(UnknownFieldKind(s.to_string())),
        }
    }
}

#[derive(Debug, Error, Eq, PartialEq)]
#[error("unknown field kind '{0}', expected hour, minute or second")]
pub struct UnknownFieldKind(pub String);

#[derive(Debug, Error, Eq, PartialEq)]
pub enum BoundsError {
    #[error("lower bound {lower} is greater than upper bound {upper}")]
    Inverted { lower: u32, upper: u32 },
    #[error("upper bound {0} cannot be shown in two digits")]
    TooWide(u32),
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub struct FieldBounds {
    lower: u32,
    upper: u32,
}

impl FieldBounds {
    pub fn new(lower: u32, upper: u32) -> Result<Self, BoundsError> {
        if lower > upper {
            return Err(BoundsError::Inverted { lower, upper });
        }
        if upper > MAX_DISPLAYABLE {
            return Err(BoundsError::TooWide(upper));
        }
        Ok(Self { lower, upper })
    }

    pub fn lower(&self) -> u32 {
        self.lower
    }

    pub fn upper(&self) -> u32 {
        self.upper
    }

    pub fn contains(&self, value: u32) -> bool {
        (self.lower..=self.upper).contains(&value)
    }
}

impl Default for FieldBounds {
    fn default() -> Self {
        Self { lower: 0, upper: 60 }
    }
}

use std::fmt::{self, Display};
use std::str::FromStr;

use anyhow::Error;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

///
/// How several values landing in the same bin are combined.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum AggregationMethod {
    #[default]
    Sum,
    Average,
    Maximum,
}

impl FromStr for AggregationMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sum" => Ok(AggregationMethod::Sum),
            "average" | "avg" | "mean" => Ok(AggregationMethod::Average),
            "maximum" | "max" => Ok(AggregationMethod::Maximum),
            _ => Err(Error::msg(format!("Invalid aggregation method: {}", s))),
        }
    }
}

impl Display for AggregationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AggregationMethod::Sum => "sum",
            AggregationMethod::Average => "average",
            AggregationMethod::Maximum => "maximum",
        };
        write!(f, "{}", name)
    }
}

///
/// Storage width of the per-chromosome bin arrays.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Precision {
    /// 16-bit IEEE 754 floating point
    Half,
    /// 32-bit IEEE 754 floating point
    #[default]
    Single,
}

impl Precision {
    pub fn bytes_per_value(&self) -> usize {
        match self {
            Precision::Half => 2,
            Precision::Single => 4,
        }
    }
}

impl FromStr for Precision {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "half" | "16" | "16bit" | "f16" => Ok(Precision::Half),
            "single" | "32" | "32bit" | "f32" => Ok(Precision::Single),
            _ => Err(Error::msg(format!("Invalid precision: {}", s))),
        }
    }
}

impl Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precision::Half => write!(f, "16-bit"),
            Precision::Single => write!(f, "32-bit"),
        }
    }
}

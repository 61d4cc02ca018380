use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The kind of a [`Metric`](crate::Metric), determining how downstream aggregation treats its
/// values.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum MetricKind {
    /// Counts instances of an event.
    ///
    /// Each reported value is a delta and is treated as an individual sample.
    Counter,
    /// Stores absolute snapshots of values.
    Gauge,
    /// Measures the duration of an operation.
    Timer,
    /// Builds a statistical distribution over reported values.
    Histogram,
    /// Counts occurrences, where a missing value implies a single occurrence.
    Meter,
}

impl MetricKind {
    /// Returns the name of this metric kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Counter => "counter",
            Self::Gauge => "gauge",
            Self::Timer => "timer",
            Self::Histogram => "histogram",
            Self::Meter => "meter",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Routes serde through `FromStr` and `Display`.
macro_rules! str_conversions {
    ($type:ty) => {
        impl TryFrom<String> for $type {
            type Error = ParseProtocolError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$type> for String {
            fn from(value: $type) -> Self {
                value.to_string()
            }
        }
    };
}

/// An error returned when parsing a [`MetricKind`] or [`MetricUnit`] from a string.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
#[error("unknown {0}")]
pub struct ParseProtocolError(&'static str);

impl FromStr for MetricKind {
    type Err = ParseProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "counter" => Self::Counter,
            "gauge" => Self::Gauge,
            "timer" => Self::Timer,
            "histogram" => Self::Histogram,
            "meter" => Self::Meter,
            _ => return Err(ParseProtocolError("metric kind")),
        })
    }
}

str_conversions!(MetricKind);

/// Time duration units used in [`MetricUnit::Duration`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum DurationUnit {
    /// Nanosecond (`"nanosecond"`), 10^-9 seconds.
    NanoSecond,
    /// Microsecond (`"microsecond"`), 10^-6 seconds.
    MicroSecond,
    /// Millisecond (`"millisecond"`), 10^-3 seconds.
    MilliSecond,
    /// Full second (`"second"`).
    Second,
    /// Minute (`"minute"`), 60 seconds.
    Minute,
    /// Hour (`"hour"`), 3600 seconds.
    Hour,
    /// Day (`"day"`), 86,400 seconds.
    Day,
    /// Week (`"week"`), 604,800 seconds.
    Week,
}

impl DurationUnit {
    fn as_str(&self) -> &'static str {
        match self {
            Self::NanoSecond => "nanosecond",
            Self::MicroSecond => "microsecond",
            Self::MilliSecond => "millisecond",
            Self::Second => "second",
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
        }
    }
}

/// Size of information derived from bytes, used in [`MetricUnit::Information`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum InformationUnit {
    /// Bit (`"bit"`), corresponding to 1/8 of a byte.
    Bit,
    /// Byte (`"byte"`).
    Byte,
    /// Kilobyte (`"kilobyte"`), 10^3 bytes.
    KiloByte,
    /// Megabyte (`"megabyte"`), 10^6 bytes.
    MegaByte,
    /// Gigabyte (`"gigabyte"`), 10^9 bytes.
    GigaByte,
}

impl InformationUnit {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Bit => "bit",
            Self::Byte => "byte",
            Self::KiloByte => "kilobyte",
            Self::MegaByte => "megabyte",
            Self::GigaByte => "gigabyte",
        }
    }
}

/// The unit classification of a [`Quantity`](crate::Quantity).
///
/// Units are assigned by the [type registry](crate::TypeRegistry) and are never part of the
/// submitted line itself.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum MetricUnit {
    /// A time duration.
    Duration(DurationUnit),
    /// Size of information derived from bytes.
    Information(InformationUnit),
    /// A plain scalar without a unit, such as a count.
    #[default]
    None,
}

impl MetricUnit {
    /// Returns `true` if the metric unit is [`MetricUnit::None`].
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl fmt::Display for MetricUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Duration(unit) => f.write_str(unit.as_str()),
            Self::Information(unit) => f.write_str(unit.as_str()),
            Self::None => f.write_str("none"),
        }
    }
}

impl FromStr for MetricUnit {
    type Err = ParseProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "nanosecond" => Self::Duration(DurationUnit::NanoSecond),
            "microsecond" => Self::Duration(DurationUnit::MicroSecond),
            "millisecond" => Self::Duration(DurationUnit::MilliSecond),
            "second" => Self::Duration(DurationUnit::Second),
            "minute" => Self::Duration(DurationUnit::Minute),
            "hour" => Self::Duration(DurationUnit::Hour),
            "day" => Self::Duration(DurationUnit::Day),
            "week" => Self::Duration(DurationUnit::Week),

            "bit" => Self::Information(InformationUnit::Bit),
            "byte" => Self::Information(InformationUnit::Byte),
            "kilobyte" => Self::Information(InformationUnit::KiloByte),
            "megabyte" => Self::Information(InformationUnit::MegaByte),
            "gigabyte" => Self::Information(InformationUnit::GigaByte),

            "" | "none" => Self::None,
            _ => return Err(ParseProtocolError("metric unit")),
        })
    }
}

str_conversions!(MetricUnit);

/// A finite 64-bit floating point number.
///
/// Infinity and NaN cannot be represented, which makes the type safe to use as a magnitude of
/// a [`Quantity`](crate::Quantity).
#[derive(Clone, Copy, Default, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct FiniteF64(f64);

impl FiniteF64 {
    /// Creates a finite float if the value is finite.
    pub fn new(value: f64) -> Option<Self> {
        value.is_finite().then_some(Self(value))
    }

    /// Returns the plain [`f64`].
    pub fn to_f64(self) -> f64 {
        self.0
    }
}

impl fmt::Debug for FiniteF64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for FiniteF64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<i32> for FiniteF64 {
    fn from(value: i32) -> Self {
        Self(value.into())
    }
}

impl<'de> Deserialize<'de> for FiniteF64 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = f64::deserialize(deserializer)?;
        Self::new(value).ok_or_else(|| serde::de::Error::custom("non-finite float"))
    }
}

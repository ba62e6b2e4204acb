//! Column types and typed cell values.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Column types supported by Sift tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// 64-bit signed integer.
    Integer,
    /// 64-bit float.
    Float,
    /// UTF-8 string.
    String,
    /// Boolean.
    Boolean,
    /// Calendar day, compared at day granularity.
    Date,
    /// Instant with millisecond precision.
    Datetime,
}

impl ColumnType {
    /// Parse a column type from its lowercase token.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "integer" => Some(Self::Integer),
            "float" => Some(Self::Float),
            "string" => Some(Self::String),
            "boolean" => Some(Self::Boolean),
            "date" => Some(Self::Date),
            "datetime" => Some(Self::Datetime),
            _ => None,
        }
    }

    /// Get the type token.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Datetime => "datetime",
        }
    }

    /// Check if this is a numeric type.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer | Self::Float)
    }

    /// Check if this is a temporal type.
    pub fn is_temporal(&self) -> bool {
        matches!(self, Self::Date | Self::Datetime)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A non-null cell value. Nulls are represented as `Option::None` around it.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    /// Integer value.
    Integer(i64),
    /// Float value.
    Float(f64),
    /// String value.
    String(String),
    /// Boolean value.
    Boolean(bool),
    /// Calendar day.
    Date(NaiveDate),
    /// Milliseconds since the Unix epoch, UTC.
    Datetime(i64),
}

impl TypedValue {
    /// The column type this value belongs to.
    pub fn column_type(&self) -> ColumnType {
        match self {
            Self::Integer(_) => ColumnType::Integer,
            Self::Float(_) => ColumnType::Float,
            Self::String(_) => ColumnType::String,
            Self::Boolean(_) => ColumnType::Boolean,
            Self::Date(_) => ColumnType::Date,
            Self::Datetime(_) => ColumnType::Datetime,
        }
    }

    /// Get the string payload, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Total order within a type.
    ///
    /// Integers and floats compare numerically with each other. Any other
    /// pairing of kinds, and NaN, yields `None`.
    pub fn compare(&self, other: &TypedValue) -> Option<Ordering> {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => Some(a.cmp(b)),
            (Self::String(a), Self::String(b)) => Some(a.as_str().cmp(b.as_str())),
            (Self::Boolean(a), Self::Boolean(b)) => Some(a.cmp(b)),
            (Self::Date(a), Self::Date(b)) => Some(a.cmp(b)),
            (Self::Datetime(a), Self::Datetime(b)) => Some(a.cmp(b)),
            _ => {
                let (a, b) = (self.as_f64()?, other.as_f64()?);
                a.partial_cmp(&b)
            }
        }
    }

    /// Equality under [`TypedValue::compare`].
    pub fn matches(&self, other: &TypedValue) -> bool {
        self.compare(other) == Some(Ordering::Equal)
    }

    /// Render the value for row output. Dates surface as epoch milliseconds.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Integer(v) => serde_json::Value::from(*v),
            Self::Float(v) => serde_json::Value::from(*v),
            Self::String(s) => serde_json::Value::from(s.as_str()),
            Self::Boolean(b) => serde_json::Value::from(*b),
            Self::Date(d) => serde_json::Value::from(date_to_millis(*d)),
            Self::Datetime(ms) => serde_json::Value::from(*ms),
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::String(s) => write!(f, "{:?}", s),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Datetime(ms) => match millis_to_datetime(*ms) {
                Some(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S%.3f")),
                None => write!(f, "{}ms", ms),
            },
        }
    }
}

/// Midnight UTC of `date`, in epoch milliseconds.
pub fn date_to_millis(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp_millis()
}

/// The UTC calendar day containing the epoch-millisecond instant `ms`.
pub fn millis_to_date(ms: i64) -> Option<NaiveDate> {
    millis_to_datetime(ms).map(|dt| dt.date())
}

/// The naive UTC datetime at epoch-millisecond instant `ms`.
pub fn millis_to_datetime(ms: i64) -> Option<NaiveDateTime> {
    DateTime::<Utc>::from_timestamp_millis(ms).map(|dt| dt.naive_utc())
}

impl From<i64> for TypedValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for TypedValue {
    fn from(v: i32) -> Self {
        Self::Integer(v as i64)
    }
}

impl From<f64> for TypedValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for TypedValue {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<String> for TypedValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for TypedValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<NaiveDate> for TypedValue {
    fn from(v: NaiveDate) -> Self {
        Self::Date(v)
    }
}

impl From<NaiveDateTime> for TypedValue {
    fn from(v: NaiveDateTime) -> Self {
        Self::Datetime(v.and_utc().timestamp_millis())
    }
}

impl From<DateTime<Utc>> for TypedValue {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Datetime(v.timestamp_millis())
    }
}

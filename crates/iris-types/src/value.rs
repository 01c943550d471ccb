//! IRIS value representation.

use bytes::Bytes;
use chrono::{DateTime, Local, Utc};

/// A value exchanged with the server.
///
/// This is the closed set of shapes a column value or a bound parameter can
/// take once decoded from, or before encoding to, a list item.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum IrisValue {
    /// NULL value.
    #[default]
    Null,
    /// Boolean value (BIT).
    Bool(bool),
    /// Integer value (TINYINT, SMALLINT, INTEGER, BIGINT).
    Int(i64),
    /// Floating point value (FLOAT, REAL, DOUBLE, NUMERIC).
    Float(f64),
    /// String value (CHAR and VARCHAR family).
    Text(String),
    /// Binary value (BINARY, VARBINARY).
    Bytes(Bytes),
    /// Timestamp, held as an instant.
    Timestamp(DateTime<Utc>),
    /// Persistent object handle.
    Oref(String),
}

impl IrisValue {
    /// Check if the value is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get the value as a bool, if it is one.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the value as an i64, if it is one.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the value as an f64, if it is numeric.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Get the value as a string slice, if it is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(v) | Self::Oref(v) => Some(v),
            _ => None,
        }
    }

    /// Get the value as bytes, if it is binary.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(v) => Some(v),
            _ => None,
        }
    }

    /// Get the value as a UTC timestamp, if it is one.
    #[must_use]
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Timestamp(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the value as a timestamp in the local time zone.
    #[must_use]
    pub fn to_local(&self) -> Option<DateTime<Local>> {
        self.as_timestamp().map(|ts| ts.with_timezone(&Local))
    }

    /// Get the type name as a string.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Bool(_) => "BIT",
            Self::Int(_) => "BIGINT",
            Self::Float(_) => "DOUBLE",
            Self::Text(_) => "VARCHAR",
            Self::Bytes(_) => "VARBINARY",
            Self::Timestamp(_) => "TIMESTAMP",
            Self::Oref(_) => "OREF",
        }
    }
}

impl From<bool> for IrisValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for IrisValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for IrisValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for IrisValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for IrisValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for IrisValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<Vec<u8>> for IrisValue {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(v))
    }
}

impl From<Bytes> for IrisValue {
    fn from(v: Bytes) -> Self {
        Self::Bytes(v)
    }
}

impl From<DateTime<Utc>> for IrisValue {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Timestamp(v)
    }
}

impl<T> From<Option<T>> for IrisValue
where
    T: Into<IrisValue>,
{
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

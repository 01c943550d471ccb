//! ODBC value mapping.
//!
//! Converts between [`IrisValue`] and the list items the server expects for
//! bound parameters, and decodes column values according to their declared
//! [`SqlType`].
//!
//! The server follows a few conventions that differ from plain list items:
//!
//! - an empty string parameter is sent as `"\x00"`, and a `"\x00"` column
//!   value reads back as the empty string;
//! - NULL parameters are sent as the empty string;
//! - POSIX timestamps travel as signed microsecond ticks with a marker bit
//!   that must be cleared (or restored, for pre-epoch values) before use.

use chrono::{DateTime, NaiveDateTime, Utc};
use iris_protocol::{ItemType, ListItem};

use crate::error::TypeError;
use crate::sql_type::SqlType;
use crate::value::IrisValue;

/// Wire format for timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.9f";

/// Parse format for timestamps; the fractional part is optional.
const TIMESTAMP_PARSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Marker bit carried by non-negative POSIX ticks.
const POSIX_POSITIVE_MARKER: i64 = 0x1000_0000_0000_0000;

/// Bits restored on negative POSIX ticks.
const POSIX_NEGATIVE_FILL: i64 = 0x6000_0000_0000_0000;

/// Placeholder the server uses for an empty string.
const EMPTY_STRING: &str = "\x00";

/// Convert a parameter value into its wire item.
pub fn to_odbc(value: &IrisValue) -> Result<ListItem, TypeError> {
    let item = match value {
        IrisValue::Null => ListItem::from_text(""),
        IrisValue::Bool(v) => ListItem::from_i64(i64::from(*v)),
        IrisValue::Int(v) => ListItem::from_i64(*v),
        IrisValue::Float(v) => ListItem::from_f64(*v)
            .map_err(|_| TypeError::Unsupported(format!("float {v} has no wire form")))?,
        IrisValue::Text(v) if v.is_empty() => ListItem::from_text(EMPTY_STRING),
        IrisValue::Text(v) => ListItem::from_text(v),
        IrisValue::Bytes(v) => ListItem::from_bytes(v.clone()),
        IrisValue::Timestamp(v) => ListItem::from_text(&format_timestamp(v)),
        IrisValue::Oref(v) => ListItem::oref(v),
    };
    Ok(item)
}

/// Decode a column value of the given type.
///
/// Null items and empty strings decode to [`IrisValue::Null`]. Types
/// without a dedicated mapping decode as text and log a warning.
pub fn from_odbc(sql_type: SqlType, item: &ListItem) -> Result<IrisValue, TypeError> {
    if item.is_null() || item.is_empty() {
        return Ok(IrisValue::Null);
    }
    let value = match sql_type {
        t if t.is_character() => {
            let text = item.as_string()?;
            if text == EMPTY_STRING {
                IrisValue::Text(String::new())
            } else {
                IrisValue::Text(text)
            }
        }
        SqlType::Integer | SqlType::TinyInt | SqlType::SmallInt | SqlType::BigInt => {
            IrisValue::Int(item.as_i64()?)
        }
        SqlType::Bit => IrisValue::Bool(item.as_bool()?),
        SqlType::Float | SqlType::Real => IrisValue::Float(f64::from(item.as_f64()? as f32)),
        SqlType::Double | SqlType::Numeric | SqlType::Decimal => IrisValue::Float(item.as_f64()?),
        t if t.is_binary() => IrisValue::Bytes(item.clone().into_data()),
        SqlType::TimestampPosix => {
            if item.item_type().is_string() {
                IrisValue::Timestamp(parse_timestamp(&item.as_string()?)?)
            } else {
                IrisValue::Timestamp(decode_posix_ticks(item.as_i64()?)?)
            }
        }
        SqlType::Timestamp => IrisValue::Timestamp(parse_timestamp(&item.as_string()?)?),
        SqlType::Date | SqlType::Time | SqlType::Guid => IrisValue::Text(item.as_string()?),
        other => {
            let text = item.as_string()?;
            tracing::warn!(
                type_code = other.code(),
                item_type = item.item_type().as_u8(),
                "column type has no mapping, decoding as text"
            );
            IrisValue::Text(text)
        }
    };
    Ok(value)
}

/// Convert a value into a plain list item.
///
/// Unlike [`to_odbc`], no parameter conventions apply: NULL is the null
/// item and the empty string stays empty. Used for global subscripts and
/// class-method arguments.
pub fn to_list_item(value: &IrisValue) -> Result<ListItem, TypeError> {
    let item = match value {
        IrisValue::Null => ListItem::null(),
        IrisValue::Bool(v) => ListItem::from_bool(*v),
        IrisValue::Int(v) => ListItem::from_i64(*v),
        IrisValue::Float(v) => ListItem::from_f64(*v)
            .map_err(|_| TypeError::Unsupported(format!("float {v} has no wire form")))?,
        IrisValue::Text(v) => ListItem::from_text(v),
        IrisValue::Bytes(v) => ListItem::from_bytes(v.clone()),
        IrisValue::Timestamp(v) => ListItem::from_text(&format_timestamp(v)),
        IrisValue::Oref(v) => ListItem::oref(v),
    };
    Ok(item)
}

/// Decode a list item by its own tag, with no column type to guide it.
pub fn from_list_item(item: &ListItem) -> Result<IrisValue, TypeError> {
    if item.is_null() {
        return Ok(IrisValue::Null);
    }
    let value = match item.item_type() {
        ItemType::PositiveInt | ItemType::NegativeInt => IrisValue::Int(item.as_i64()?),
        ItemType::PositiveFloat | ItemType::NegativeFloat => IrisValue::Float(item.as_f64()?),
        ItemType::Oref => IrisValue::Oref(item.as_string()?),
        ItemType::Other(tag) => {
            return Err(TypeError::Unsupported(format!("list item type {tag}")));
        }
        _ => IrisValue::Text(item.as_string()?),
    };
    Ok(value)
}

/// Decode POSIX microsecond ticks into an instant.
pub fn decode_posix_ticks(ticks: i64) -> Result<DateTime<Utc>, TypeError> {
    let micros = if ticks > 0 {
        ticks ^ POSIX_POSITIVE_MARKER
    } else {
        ticks | POSIX_NEGATIVE_FILL
    };
    let seconds = micros.div_euclid(1_000_000);
    let nanos = (micros.rem_euclid(1_000_000) * 1_000) as u32;
    DateTime::from_timestamp(seconds, nanos)
        .ok_or_else(|| TypeError::InvalidDateTime(format!("tick value {ticks} out of range")))
}

/// Render an instant in the wire timestamp format, in UTC.
#[must_use]
pub fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a wire timestamp, interpreted as UTC.
pub fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, TypeError> {
    NaiveDateTime::parse_from_str(text, TIMESTAMP_PARSE_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| TypeError::InvalidDateTime(format!("{text:?}: {e}")))
}

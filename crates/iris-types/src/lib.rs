//! # iris-types
//!
//! IRIS to Rust type mappings and conversions.
//!
//! This crate provides the [`IrisValue`] sum type, the column [`SqlType`]
//! codes reported by the server, and the ODBC mapping between values and
//! the list items that carry them on the wire.
//!
//! ## Type Mappings
//!
//! | Column Type | Value | Rust Type |
//! |-------------|-------|-----------|
//! | `BIT` | `Bool` | `bool` |
//! | `TINYINT`/`SMALLINT`/`INTEGER`/`BIGINT` | `Int` | `i64` (narrower ints checked) |
//! | `FLOAT`/`REAL` | `Float` | `f32` precision, widened to `f64` |
//! | `DOUBLE`/`NUMERIC`/`DECIMAL` | `Float` | `f64` |
//! | `CHAR`/`VARCHAR` family | `Text` | `String` |
//! | `BINARY`/`VARBINARY` | `Bytes` | `Vec<u8>`, `bytes::Bytes` |
//! | `TIMESTAMP`/`TIMESTAMP_POSIX` | `Timestamp` | `chrono::DateTime<Utc>` |

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod from_iris;
pub mod odbc;
pub mod sql_type;
pub mod to_iris;
pub mod value;

pub use error::TypeError;
pub use from_iris::FromIris;
pub use odbc::{
    TIMESTAMP_FORMAT, decode_posix_ticks, format_timestamp, from_list_item, from_odbc, parse_timestamp,
    to_list_item, to_odbc,
};
pub use sql_type::SqlType;
pub use to_iris::ToIris;
pub use value::IrisValue;

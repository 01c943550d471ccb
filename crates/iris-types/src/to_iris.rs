//! Trait for converting Rust types to IRIS values.

use bytes::Bytes;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

use crate::error::TypeError;
use crate::value::IrisValue;

/// Trait for types that can be bound as statement parameters.
pub trait ToIris {
    /// Convert this value to an IRIS value.
    fn to_iris(&self) -> Result<IrisValue, TypeError>;
}

impl ToIris for IrisValue {
    fn to_iris(&self) -> Result<IrisValue, TypeError> {
        Ok(self.clone())
    }
}

impl ToIris for bool {
    fn to_iris(&self) -> Result<IrisValue, TypeError> {
        Ok(IrisValue::Bool(*self))
    }
}

macro_rules! int_to_iris {
    ($($ty:ty),*) => {
        $(
            impl ToIris for $ty {
                fn to_iris(&self) -> Result<IrisValue, TypeError> {
                    Ok(IrisValue::Int(i64::from(*self)))
                }
            }
        )*
    };
}

int_to_iris!(i8, i16, i32, i64, u8, u16, u32);

impl ToIris for u64 {
    fn to_iris(&self) -> Result<IrisValue, TypeError> {
        i64::try_from(*self)
            .map(IrisValue::Int)
            .map_err(|_| TypeError::OutOfRange { target_type: "BIGINT" })
    }
}

impl ToIris for usize {
    fn to_iris(&self) -> Result<IrisValue, TypeError> {
        i64::try_from(*self)
            .map(IrisValue::Int)
            .map_err(|_| TypeError::OutOfRange { target_type: "BIGINT" })
    }
}

impl ToIris for f32 {
    fn to_iris(&self) -> Result<IrisValue, TypeError> {
        Ok(IrisValue::Float(f64::from(*self)))
    }
}

impl ToIris for f64 {
    fn to_iris(&self) -> Result<IrisValue, TypeError> {
        Ok(IrisValue::Float(*self))
    }
}

impl ToIris for str {
    fn to_iris(&self) -> Result<IrisValue, TypeError> {
        Ok(IrisValue::Text(self.to_owned()))
    }
}

impl ToIris for String {
    fn to_iris(&self) -> Result<IrisValue, TypeError> {
        Ok(IrisValue::Text(self.clone()))
    }
}

impl ToIris for [u8] {
    fn to_iris(&self) -> Result<IrisValue, TypeError> {
        Ok(IrisValue::Bytes(Bytes::copy_from_slice(self)))
    }
}

impl ToIris for Vec<u8> {
    fn to_iris(&self) -> Result<IrisValue, TypeError> {
        Ok(IrisValue::Bytes(Bytes::copy_from_slice(self)))
    }
}

impl ToIris for Bytes {
    fn to_iris(&self) -> Result<IrisValue, TypeError> {
        Ok(IrisValue::Bytes(self.clone()))
    }
}

impl<Tz: TimeZone> ToIris for DateTime<Tz> {
    fn to_iris(&self) -> Result<IrisValue, TypeError> {
        Ok(IrisValue::Timestamp(self.with_timezone(&Utc)))
    }
}

/// Naive timestamps are taken to be UTC.
impl ToIris for NaiveDateTime {
    fn to_iris(&self) -> Result<IrisValue, TypeError> {
        Ok(IrisValue::Timestamp(self.and_utc()))
    }
}

impl<T: ToIris> ToIris for Option<T> {
    fn to_iris(&self) -> Result<IrisValue, TypeError> {
        match self {
            Some(v) => v.to_iris(),
            None => Ok(IrisValue::Null),
        }
    }
}

impl<T: ToIris + ?Sized> ToIris for &T {
    fn to_iris(&self) -> Result<IrisValue, TypeError> {
        (*self).to_iris()
    }
}

//! Trait for converting IRIS values to Rust types.

use bytes::Bytes;
use chrono::{DateTime, Local, NaiveDateTime, Utc};

use crate::error::TypeError;
use crate::value::IrisValue;

/// Trait for types that can be extracted from query results.
pub trait FromIris: Sized {
    /// Convert from an IRIS value to this type.
    fn from_iris(value: &IrisValue) -> Result<Self, TypeError>;

    /// Convert from an optional IRIS value.
    ///
    /// Returns `None` if the value is NULL.
    fn from_iris_nullable(value: &IrisValue) -> Result<Option<Self>, TypeError> {
        if value.is_null() {
            Ok(None)
        } else {
            Self::from_iris(value).map(Some)
        }
    }
}

fn mismatch(expected: &'static str, value: &IrisValue) -> TypeError {
    match value {
        IrisValue::Null => TypeError::UnexpectedNull,
        _ => TypeError::TypeMismatch {
            expected,
            actual: value.type_name().to_string(),
        },
    }
}

impl FromIris for IrisValue {
    fn from_iris(value: &IrisValue) -> Result<Self, TypeError> {
        Ok(value.clone())
    }

    fn from_iris_nullable(value: &IrisValue) -> Result<Option<Self>, TypeError> {
        Ok((!value.is_null()).then(|| value.clone()))
    }
}

impl FromIris for bool {
    fn from_iris(value: &IrisValue) -> Result<Self, TypeError> {
        match value {
            IrisValue::Bool(v) => Ok(*v),
            IrisValue::Int(v) => Ok(*v != 0),
            _ => Err(mismatch("bool", value)),
        }
    }
}

impl FromIris for i64 {
    fn from_iris(value: &IrisValue) -> Result<Self, TypeError> {
        match value {
            IrisValue::Int(v) => Ok(*v),
            IrisValue::Bool(v) => Ok(i64::from(*v)),
            IrisValue::Text(s) => s.trim().parse().map_err(|_| mismatch("i64", value)),
            _ => Err(mismatch("i64", value)),
        }
    }
}

macro_rules! narrow_int_from_iris {
    ($($ty:ty => $name:literal),*) => {
        $(
            impl FromIris for $ty {
                fn from_iris(value: &IrisValue) -> Result<Self, TypeError> {
                    let wide = i64::from_iris(value).map_err(|e| match e {
                        TypeError::TypeMismatch { actual, .. } => TypeError::TypeMismatch {
                            expected: $name,
                            actual,
                        },
                        other => other,
                    })?;
                    <$ty>::try_from(wide).map_err(|_| TypeError::OutOfRange { target_type: $name })
                }
            }
        )*
    };
}

narrow_int_from_iris!(i32 => "i32", i16 => "i16", u8 => "u8", u32 => "u32", u64 => "u64");

impl FromIris for f64 {
    fn from_iris(value: &IrisValue) -> Result<Self, TypeError> {
        match value {
            IrisValue::Float(v) => Ok(*v),
            IrisValue::Int(v) => Ok(*v as f64),
            _ => Err(mismatch("f64", value)),
        }
    }
}

impl FromIris for f32 {
    fn from_iris(value: &IrisValue) -> Result<Self, TypeError> {
        f64::from_iris(value).map(|v| v as f32)
    }
}

impl FromIris for String {
    fn from_iris(value: &IrisValue) -> Result<Self, TypeError> {
        match value {
            IrisValue::Text(v) | IrisValue::Oref(v) => Ok(v.clone()),
            _ => Err(mismatch("String", value)),
        }
    }
}

impl FromIris for Vec<u8> {
    fn from_iris(value: &IrisValue) -> Result<Self, TypeError> {
        match value {
            IrisValue::Bytes(v) => Ok(v.to_vec()),
            IrisValue::Text(v) => Ok(v.clone().into_bytes()),
            _ => Err(mismatch("Vec<u8>", value)),
        }
    }
}

impl FromIris for Bytes {
    fn from_iris(value: &IrisValue) -> Result<Self, TypeError> {
        match value {
            IrisValue::Bytes(v) => Ok(v.clone()),
            _ => Err(mismatch("Bytes", value)),
        }
    }
}

impl FromIris for DateTime<Utc> {
    fn from_iris(value: &IrisValue) -> Result<Self, TypeError> {
        match value {
            IrisValue::Timestamp(v) => Ok(*v),
            _ => Err(mismatch("DateTime<Utc>", value)),
        }
    }
}

impl FromIris for DateTime<Local> {
    fn from_iris(value: &IrisValue) -> Result<Self, TypeError> {
        DateTime::<Utc>::from_iris(value).map(|v| v.with_timezone(&Local))
    }
}

impl FromIris for NaiveDateTime {
    fn from_iris(value: &IrisValue) -> Result<Self, TypeError> {
        DateTime::<Utc>::from_iris(value).map(|v| v.naive_utc())
    }
}

impl<T: FromIris> FromIris for Option<T> {
    fn from_iris(value: &IrisValue) -> Result<Self, TypeError> {
        T::from_iris_nullable(value)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_iris_i32() {
        assert_eq!(i32::from_iris(&IrisValue::Int(42)).unwrap(), 42);
        assert!(matches!(
            i32::from_iris(&IrisValue::Int(i64::MAX)),
            Err(TypeError::OutOfRange { target_type: "i32" })
        ));
        assert!(matches!(
            i32::from_iris(&IrisValue::Bytes(Bytes::new())),
            Err(TypeError::TypeMismatch { expected: "i32", .. })
        ));
    }

    #[test]
    fn test_from_iris_null() {
        assert!(matches!(i64::from_iris(&IrisValue::Null), Err(TypeError::UnexpectedNull)));
        assert_eq!(Option::<i64>::from_iris(&IrisValue::Null).unwrap(), None);
        assert_eq!(Option::<IrisValue>::from_iris(&IrisValue::Null).unwrap(), None);
    }

    #[test]
    fn test_from_iris_bool_accepts_int() {
        assert!(bool::from_iris(&IrisValue::Int(1)).unwrap());
        assert!(!bool::from_iris(&IrisValue::Bool(false)).unwrap());
    }

    #[test]
    fn test_from_iris_string() {
        assert_eq!(String::from_iris(&IrisValue::from("abc")).unwrap(), "abc");
        assert!(String::from_iris(&IrisValue::Int(1)).is_err());
    }
}

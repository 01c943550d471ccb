//! Type conversion edge case tests.
//!
//! Tests edge cases for:
//! - NULL handling
//! - Latin-1 and wide string round trips through the wire mapping
//! - Integer and float boundaries
//! - Timestamp encoding

#![allow(clippy::unwrap_used, clippy::expect_used)]

use bytes::Bytes;
use iris_protocol::{ItemType, ListItem, ListReader};
use iris_types::{FromIris, IrisValue, SqlType, ToIris, TypeError, from_odbc, to_odbc};

/// Encode a value as a parameter, then decode it as a column of `sql_type`.
fn through_wire(value: &IrisValue, sql_type: SqlType) -> IrisValue {
    let item = to_odbc(value).unwrap();
    let mut reader = ListReader::new(item.to_bytes());
    let decoded = reader.next_item().unwrap();
    assert!(reader.is_exhausted());
    from_odbc(sql_type, &decoded).unwrap()
}

// ============================================================================
// NULL Handling Edge Cases
// ============================================================================

mod null_handling {
    use super::*;

    #[test]
    fn test_null_to_option_i32() {
        let result = Option::<i32>::from_iris(&IrisValue::Null).unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn test_null_to_non_option_fails() {
        assert!(matches!(
            i32::from_iris(&IrisValue::Null),
            Err(TypeError::UnexpectedNull)
        ));
    }

    #[test]
    fn test_null_to_string_fails() {
        assert!(matches!(
            String::from_iris(&IrisValue::Null),
            Err(TypeError::UnexpectedNull)
        ));
    }

    #[test]
    fn test_null_parameter_reads_back_as_null() {
        assert_eq!(through_wire(&IrisValue::Null, SqlType::VarChar), IrisValue::Null);
    }

    #[test]
    fn test_nested_option_to_iris() {
        let nested: Option<Option<i32>> = Some(None);
        assert!(nested.to_iris().unwrap().is_null());
    }
}

// ============================================================================
// String Edge Cases
// ============================================================================

mod string_handling {
    use super::*;

    #[test]
    fn test_empty_string_survives_the_wire() {
        assert_eq!(
            through_wire(&IrisValue::from(""), SqlType::VarChar),
            IrisValue::from("")
        );
    }

    #[test]
    fn test_latin1_uses_single_byte_form() {
        let item = to_odbc(&IrisValue::from("café")).unwrap();
        assert_eq!(item.item_type(), ItemType::String);
        assert_eq!(item.data_len(), 4);
        assert_eq!(
            through_wire(&IrisValue::from("café"), SqlType::VarChar),
            IrisValue::from("café")
        );
    }

    #[test]
    fn test_cyrillic_uses_wide_form() {
        let item = to_odbc(&IrisValue::from("Привет")).unwrap();
        assert_eq!(item.item_type(), ItemType::Unicode);
        assert_eq!(item.data_len(), 12);
        assert_eq!(
            through_wire(&IrisValue::from("Привет"), SqlType::WVarChar),
            IrisValue::from("Привет")
        );
    }

    #[test]
    fn test_supplementary_plane_characters() {
        assert_eq!(
            through_wire(&IrisValue::from("😀🎉"), SqlType::VarChar),
            IrisValue::from("😀🎉")
        );
    }

    #[test]
    fn test_long_string_crosses_extended_length_form() {
        let long = "x".repeat(70_000);
        assert_eq!(
            through_wire(&IrisValue::from(long.as_str()), SqlType::LongVarChar),
            IrisValue::Text(long)
        );
    }
}

// ============================================================================
// Numeric Boundaries
// ============================================================================

mod numeric_boundaries {
    use super::*;

    #[test]
    fn test_i64_extremes() {
        for v in [i64::MIN, -257, -256, -1, 0, 144, 256, i64::MAX] {
            assert_eq!(through_wire(&IrisValue::Int(v), SqlType::BigInt), IrisValue::Int(v));
        }
    }

    #[test]
    fn test_i16_range_check() {
        assert_eq!(i16::from_iris(&IrisValue::Int(i64::from(i16::MAX))).unwrap(), i16::MAX);
        assert!(matches!(
            i16::from_iris(&IrisValue::Int(i64::from(i16::MAX) + 1)),
            Err(TypeError::OutOfRange { target_type: "i16" })
        ));
    }

    #[test]
    fn test_u8_rejects_negative() {
        assert!(u8::from_iris(&IrisValue::Int(-1)).is_err());
    }

    #[test]
    fn test_double_round_trip() {
        for v in [0.01, 1.234, -12.345, 1e100, -3.5e-20] {
            assert_eq!(through_wire(&IrisValue::Float(v), SqlType::Double), IrisValue::Float(v));
        }
    }

    #[test]
    fn test_float_column_is_single_precision() {
        let decoded = through_wire(&IrisValue::Float(0.1), SqlType::Float);
        assert_eq!(decoded, IrisValue::Float(f64::from(0.1f32)));
    }

    #[test]
    fn test_infinity_is_rejected() {
        assert!(to_odbc(&IrisValue::Float(f64::INFINITY)).is_err());
    }
}

// ============================================================================
// Boolean and Binary
// ============================================================================

mod other_scalars {
    use super::*;

    #[test]
    fn test_bool_round_trip() {
        assert_eq!(through_wire(&IrisValue::Bool(true), SqlType::Bit), IrisValue::Bool(true));
        // A false BIT parameter is the zero integer, whose body is empty.
        assert_eq!(
            to_odbc(&IrisValue::Bool(false)).unwrap().to_bytes().as_ref(),
            &[0x02, 0x04]
        );
    }

    #[test]
    fn test_binary_round_trip() {
        let all: Vec<u8> = (0..=255).collect();
        let value = IrisValue::Bytes(Bytes::from(all.clone()));
        assert_eq!(
            Vec::<u8>::from_iris(&through_wire(&value, SqlType::VarBinary)).unwrap(),
            all
        );
    }

    #[test]
    fn test_oref_parameter() {
        let item = to_odbc(&IrisValue::Oref("1@Sample.Person".into())).unwrap();
        assert!(item.is_by_ref());
        assert_eq!(item, ListItem::oref("1@Sample.Person"));
    }
}

// ============================================================================
// Error Cases
// ============================================================================

mod error_cases {
    use super::*;

    #[test]
    fn test_bytes_to_int_fails() {
        assert!(matches!(
            i64::from_iris(&IrisValue::Bytes(Bytes::from_static(b"1"))),
            Err(TypeError::TypeMismatch { expected: "i64", .. })
        ));
    }

    #[test]
    fn test_text_integer_parses() {
        assert_eq!(i64::from_iris(&IrisValue::from(" 42 ")).unwrap(), 42);
    }

    #[test]
    fn test_timestamp_from_text_fails() {
        assert!(chrono::DateTime::<chrono::Utc>::from_iris(&IrisValue::from("now")).is_err());
    }
}

// ============================================================================
// Property Tests
// ============================================================================

mod properties {
    use super::*;
    use chrono::DateTime;
    use iris_types::{format_timestamp, parse_timestamp};
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_integer_parameter_roundtrip(value in any::<i64>()) {
            let decoded = through_wire(&IrisValue::Int(value), SqlType::BigInt);
            prop_assert_eq!(decoded, IrisValue::Int(value));
        }

        #[test]
        fn prop_latin1_text_roundtrip(value in "[ -~\u{a0}-\u{ff}]{1,200}") {
            let decoded = through_wire(&IrisValue::from(value.as_str()), SqlType::VarChar);
            prop_assert_eq!(decoded, IrisValue::Text(value));
        }

        #[test]
        fn prop_timestamp_text_roundtrip(
            seconds in 0i64..4_102_444_800,
            micros in 0u32..1_000_000,
        ) {
            let at = DateTime::from_timestamp(seconds, micros * 1_000).unwrap();
            prop_assert_eq!(parse_timestamp(&format_timestamp(&at)).unwrap(), at);
        }
    }
}

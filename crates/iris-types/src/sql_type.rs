//! Column type codes.
//!
//! The server reports column types using ODBC type codes, plus a few
//! IRIS-specific codes above 1000.

/// Column type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum SqlType {
    /// GUID (-11).
    Guid,
    /// WLONGVARCHAR (-10).
    WLongVarChar,
    /// WVARCHAR (-9).
    WVarChar,
    /// WCHAR (-8).
    WChar,
    /// BIT (-7).
    Bit,
    /// TINYINT (-6).
    TinyInt,
    /// BIGINT (-5).
    BigInt,
    /// LONGVARBINARY (-4).
    LongVarBinary,
    /// VARBINARY (-3).
    VarBinary,
    /// BINARY (-2).
    Binary,
    /// LONGVARCHAR (-1).
    LongVarChar,
    /// CHAR (1).
    Char,
    /// NUMERIC (2).
    Numeric,
    /// DECIMAL (3).
    Decimal,
    /// INTEGER (4).
    Integer,
    /// SMALLINT (5).
    SmallInt,
    /// FLOAT (6).
    Float,
    /// REAL (7).
    Real,
    /// DOUBLE (8).
    Double,
    /// VARCHAR (12).
    VarChar,
    /// TYPE_DATE (91).
    Date,
    /// TYPE_TIME (92).
    Time,
    /// TYPE_TIMESTAMP (93).
    Timestamp,
    /// DATE_HOROLOG (1091).
    DateHorolog,
    /// TIME_HOROLOG (1092).
    TimeHorolog,
    /// TIMESTAMP_POSIX (1093).
    TimestampPosix,
    /// Any other code.
    Other(i32),
}

impl SqlType {
    /// Map a wire type code.
    #[must_use]
    pub const fn from_code(code: i32) -> Self {
        match code {
            -11 => Self::Guid,
            -10 => Self::WLongVarChar,
            -9 => Self::WVarChar,
            -8 => Self::WChar,
            -7 => Self::Bit,
            -6 => Self::TinyInt,
            -5 => Self::BigInt,
            -4 => Self::LongVarBinary,
            -3 => Self::VarBinary,
            -2 => Self::Binary,
            -1 => Self::LongVarChar,
            1 => Self::Char,
            2 => Self::Numeric,
            3 => Self::Decimal,
            4 => Self::Integer,
            5 => Self::SmallInt,
            6 => Self::Float,
            7 => Self::Real,
            8 => Self::Double,
            12 => Self::VarChar,
            91 => Self::Date,
            92 => Self::Time,
            93 => Self::Timestamp,
            1091 => Self::DateHorolog,
            1092 => Self::TimeHorolog,
            1093 => Self::TimestampPosix,
            other => Self::Other(other),
        }
    }

    /// The wire type code.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Guid => -11,
            Self::WLongVarChar => -10,
            Self::WVarChar => -9,
            Self::WChar => -8,
            Self::Bit => -7,
            Self::TinyInt => -6,
            Self::BigInt => -5,
            Self::LongVarBinary => -4,
            Self::VarBinary => -3,
            Self::Binary => -2,
            Self::LongVarChar => -1,
            Self::Char => 1,
            Self::Numeric => 2,
            Self::Decimal => 3,
            Self::Integer => 4,
            Self::SmallInt => 5,
            Self::Float => 6,
            Self::Real => 7,
            Self::Double => 8,
            Self::VarChar => 12,
            Self::Date => 91,
            Self::Time => 92,
            Self::Timestamp => 93,
            Self::DateHorolog => 1091,
            Self::TimeHorolog => 1092,
            Self::TimestampPosix => 1093,
            Self::Other(code) => code,
        }
    }

    /// Whether values of this type decode as text.
    #[must_use]
    pub const fn is_character(self) -> bool {
        matches!(
            self,
            Self::Char
                | Self::VarChar
                | Self::LongVarChar
                | Self::WChar
                | Self::WVarChar
                | Self::WLongVarChar
        )
    }

    /// Whether values of this type decode as bytes.
    #[must_use]
    pub const fn is_binary(self) -> bool {
        matches!(self, Self::Binary | Self::VarBinary | Self::LongVarBinary)
    }
}

impl From<i32> for SqlType {
    fn from(code: i32) -> Self {
        Self::from_code(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip() {
        for code in [-11, -7, -5, -1, 1, 4, 6, 8, 12, 91, 93, 1093, 4242] {
            assert_eq!(SqlType::from_code(code).code(), code);
        }
        assert_eq!(SqlType::from_code(4242), SqlType::Other(4242));
    }

    #[test]
    fn test_families() {
        assert!(SqlType::WVarChar.is_character());
        assert!(!SqlType::Integer.is_character());
        assert!(SqlType::VarBinary.is_binary());
    }
}

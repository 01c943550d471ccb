//! List item encoding.
//!
//! A list item is the self-describing encoding of one scalar value. Every
//! message payload is a concatenation of list items, occasionally
//! interleaved with raw fixed-width fields.
//!
//! ```text
//! null:           01
//! short form:     <body_len + 2> <tag> <body...>              body_len <= 253
//! extended (16):  00 <body_len + 1: u16 LE> <tag> <body...>   body_len <= 65534
//! extended (32):  00 00 00 <body_len + 1: u32 LE> <tag> <body...>
//! ```
//!
//! Integers are stored little-endian with leading zero bytes dropped, so
//! `0` has an empty body. Negative integers store `-value - 1` with every
//! byte complemented. Floats are a one-byte signed decimal exponent
//! followed by an integer mantissa.

use bytes::{BufMut, Bytes};

use crate::error::ProtocolError;

/// Encoded form of a null item.
pub const NULL_ITEM: u8 = 0x01;

/// Largest body that fits the one-byte short form.
pub const MAX_SHORT_BODY: usize = 253;

/// Largest body that fits the 16-bit extended form.
pub const MAX_EXTENDED_BODY: usize = 0xFFFE;

/// Short-form tags in this range carry a by-reference marker.
const BY_REF_OFFSET: u8 = 32;

/// List item type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemType {
    /// Tag 0, no declared type.
    Undefined,
    /// Tag 1, single-byte (Latin-1) string or raw bytes.
    String,
    /// Tag 2, UTF-16LE string.
    Unicode,
    /// Tag 4, non-negative integer.
    PositiveInt,
    /// Tag 5, negative integer.
    NegativeInt,
    /// Tag 6, non-negative scaled decimal.
    PositiveFloat,
    /// Tag 7, negative scaled decimal.
    NegativeFloat,
    /// Tag 25, object reference handle.
    Oref,
    /// Any other tag, preserved verbatim.
    Other(u8),
}

impl ItemType {
    /// Map a raw tag to an item type.
    #[must_use]
    pub const fn from_u8(tag: u8) -> Self {
        match tag {
            0 => Self::Undefined,
            1 => Self::String,
            2 => Self::Unicode,
            4 => Self::PositiveInt,
            5 => Self::NegativeInt,
            6 => Self::PositiveFloat,
            7 => Self::NegativeFloat,
            25 => Self::Oref,
            other => Self::Other(other),
        }
    }

    /// Raw tag byte.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Undefined => 0,
            Self::String => 1,
            Self::Unicode => 2,
            Self::PositiveInt => 4,
            Self::NegativeInt => 5,
            Self::PositiveFloat => 6,
            Self::NegativeFloat => 7,
            Self::Oref => 25,
            Self::Other(tag) => tag,
        }
    }

    /// Whether the item carries text.
    #[must_use]
    pub const fn is_string(self) -> bool {
        matches!(self, Self::String | Self::Unicode)
    }

    /// Whether the item carries an integer.
    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(self, Self::PositiveInt | Self::NegativeInt)
    }

    /// Whether the item carries a scaled decimal.
    #[must_use]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::PositiveFloat | Self::NegativeFloat)
    }
}

/// A single decoded or to-be-encoded list item.
#[derive(Debug, Clone, PartialEq)]
pub struct ListItem {
    item_type: ItemType,
    data: Bytes,
    is_null: bool,
    by_ref: bool,
}

impl ListItem {
    /// The null item.
    #[must_use]
    pub fn null() -> Self {
        Self {
            item_type: ItemType::Undefined,
            data: Bytes::new(),
            is_null: true,
            by_ref: false,
        }
    }

    /// Build an item from a tag and raw body.
    #[must_use]
    pub fn raw(item_type: ItemType, data: impl Into<Bytes>) -> Self {
        Self {
            item_type,
            data: data.into(),
            is_null: false,
            by_ref: false,
        }
    }

    /// Encode a signed integer.
    #[must_use]
    pub fn from_i64(value: i64) -> Self {
        let mut body = Vec::with_capacity(8);
        let item_type = put_int_body(&mut body, value);
        Self::raw(item_type, body)
    }

    /// Encode an unsigned integer.
    #[must_use]
    pub fn from_u64(value: u64) -> Self {
        let mut body = Vec::with_capacity(8);
        put_unsigned_body(&mut body, value, 0);
        Self::raw(ItemType::PositiveInt, body)
    }

    /// Encode a boolean as a one-byte integer body.
    #[must_use]
    pub fn from_bool(value: bool) -> Self {
        Self::raw(ItemType::PositiveInt, vec![u8::from(value)])
    }

    /// Encode a float as a scaled decimal.
    ///
    /// The mantissa and exponent come from the shortest decimal
    /// representation that round-trips to `value`.
    pub fn from_f64(value: f64) -> Result<Self, ProtocolError> {
        let (mantissa, exponent) = decimal_parts(value)?;
        let mut body = Vec::with_capacity(9);
        body.push(exponent as u8);
        let item_type = match put_int_body(&mut body, mantissa) {
            ItemType::NegativeInt => ItemType::NegativeFloat,
            _ => ItemType::PositiveFloat,
        };
        Ok(Self::raw(item_type, body))
    }

    /// Encode text, using the single-byte form when every character is
    /// Latin-1 and UTF-16LE otherwise.
    #[must_use]
    pub fn from_text(value: &str) -> Self {
        if value.chars().all(|c| u32::from(c) <= 0xFF) {
            let body: Vec<u8> = value.chars().map(|c| u32::from(c) as u8).collect();
            Self::raw(ItemType::String, body)
        } else {
            let mut body = Vec::with_capacity(value.len() * 2);
            for unit in value.encode_utf16() {
                body.put_u16_le(unit);
            }
            Self::raw(ItemType::Unicode, body)
        }
    }

    /// Encode an opaque byte sequence.
    #[must_use]
    pub fn from_bytes(value: impl Into<Bytes>) -> Self {
        Self::raw(ItemType::String, value)
    }

    /// Encode an object reference handle.
    #[must_use]
    pub fn oref(handle: &str) -> Self {
        Self {
            item_type: ItemType::Oref,
            data: Bytes::copy_from_slice(handle.as_bytes()),
            is_null: false,
            by_ref: true,
        }
    }

    /// Item type tag. Meaningless for null items.
    #[must_use]
    pub fn item_type(&self) -> ItemType {
        self.item_type
    }

    /// Raw body bytes.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consume the item and return its body.
    #[must_use]
    pub fn into_data(self) -> Bytes {
        self.data
    }

    /// Length of the body in bytes.
    #[must_use]
    pub fn data_len(&self) -> usize {
        self.data.len()
    }

    /// Whether this is the null item.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.is_null
    }

    /// Whether the item is a non-null, zero-length string.
    ///
    /// The server uses this form for SQL NULL in row data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.is_null
            && self.data.is_empty()
            && matches!(
                self.item_type,
                ItemType::Undefined | ItemType::String | ItemType::Unicode
            )
    }

    /// Whether the item was flagged as a by-reference value.
    #[must_use]
    pub fn is_by_ref(&self) -> bool {
        self.by_ref
    }

    /// Number of bytes [`encode`](Self::encode) will write.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        if self.is_null {
            return 1;
        }
        let n = self.data.len();
        let prefix = if n <= MAX_SHORT_BODY {
            1
        } else if n <= MAX_EXTENDED_BODY {
            3
        } else {
            7
        };
        prefix + 1 + n
    }

    /// Append the wire form of this item to `dst`.
    pub fn encode(&self, dst: &mut impl BufMut) {
        if self.is_null {
            dst.put_u8(NULL_ITEM);
            return;
        }
        let n = self.data.len();
        if n <= MAX_SHORT_BODY {
            dst.put_u8((n + 2) as u8);
        } else if n <= MAX_EXTENDED_BODY {
            dst.put_u8(0);
            dst.put_u16_le((n + 1) as u16);
        } else {
            // Bodies past u32::MAX are rejected when the message is finished.
            dst.put_u8(0);
            dst.put_u16_le(0);
            dst.put_u32_le((n + 1) as u32);
        }
        dst.put_u8(self.item_type.as_u8());
        dst.put_slice(&self.data);
    }

    /// Encode this item into a fresh buffer.
    #[must_use]
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.encode(&mut buf);
        Bytes::from(buf)
    }

    /// Decode the item starting at `pos` and return it with the offset of
    /// the byte that follows it.
    pub fn decode(buf: &Bytes, pos: usize) -> Result<(Self, usize), ProtocolError> {
        let available = buf.len().saturating_sub(pos);
        let first = *buf.get(pos).ok_or(ProtocolError::truncated(1, available))?;

        let (tag_pos, body_len) = match first {
            NULL_ITEM => return Ok((Self::null(), pos + 1)),
            0 => {
                let short = read_u16_le(buf, pos + 1)?;
                let (size, tag_pos) = if short != 0 {
                    (u32::from(short), pos + 3)
                } else {
                    (read_u32_le(buf, pos + 3)?, pos + 7)
                };
                if size == 0 {
                    return Err(ProtocolError::InvalidLength(size));
                }
                (tag_pos, (size - 1) as usize)
            }
            len => (pos + 1, usize::from(len) - 2),
        };

        let raw_tag = *buf
            .get(tag_pos)
            .ok_or(ProtocolError::truncated(tag_pos + 1 - pos, available))?;
        let start = tag_pos + 1;
        let end = start + body_len;
        if end > buf.len() {
            return Err(ProtocolError::truncated(end - pos, available));
        }

        let (tag, by_ref) = if first != 0 && (BY_REF_OFFSET..64).contains(&raw_tag) {
            (raw_tag - BY_REF_OFFSET, true)
        } else {
            (raw_tag, false)
        };

        let item = Self {
            item_type: ItemType::from_u8(tag),
            data: buf.slice(start..end),
            is_null: false,
            by_ref,
        };
        Ok((item, end))
    }

    /// Interpret the item as an integer.
    ///
    /// Null and empty items read as zero; text is parsed.
    pub fn as_i64(&self) -> Result<i64, ProtocolError> {
        if self.is_null {
            return Ok(0);
        }
        match self.item_type {
            ItemType::PositiveInt => decode_positive(&self.data),
            ItemType::NegativeInt => decode_negative(&self.data),
            ItemType::PositiveFloat | ItemType::NegativeFloat => Ok(self.as_f64()? as i64),
            ItemType::String | ItemType::Unicode | ItemType::Undefined => {
                let text = self.as_string()?;
                if text.is_empty() {
                    return Ok(0);
                }
                text.trim()
                    .parse::<i64>()
                    .map_err(|_| ProtocolError::InvalidNumber(text))
            }
            other => Err(ProtocolError::UnexpectedItemType {
                expected: "integer",
                actual: other.as_u8(),
            }),
        }
    }

    /// Interpret the item as a float.
    pub fn as_f64(&self) -> Result<f64, ProtocolError> {
        if self.is_null {
            return Ok(0.0);
        }
        match self.item_type {
            ItemType::PositiveFloat => decode_float(&self.data, false),
            ItemType::NegativeFloat => decode_float(&self.data, true),
            ItemType::PositiveInt => Ok(decode_positive(&self.data)? as f64),
            ItemType::NegativeInt => Ok(decode_negative(&self.data)? as f64),
            ItemType::String | ItemType::Unicode | ItemType::Undefined => {
                let text = self.as_string()?;
                if text.is_empty() {
                    return Ok(0.0);
                }
                text.trim()
                    .parse::<f64>()
                    .map_err(|_| ProtocolError::InvalidNumber(text))
            }
            other => Err(ProtocolError::UnexpectedItemType {
                expected: "float",
                actual: other.as_u8(),
            }),
        }
    }

    /// Interpret the item as a boolean (non-zero integer).
    pub fn as_bool(&self) -> Result<bool, ProtocolError> {
        Ok(self.as_i64()? != 0)
    }

    /// Interpret the item as text.
    ///
    /// Numbers are rendered in decimal; null reads as the empty string.
    pub fn as_string(&self) -> Result<String, ProtocolError> {
        if self.is_null {
            return Ok(String::new());
        }
        match self.item_type {
            ItemType::String | ItemType::Oref | ItemType::Undefined => {
                Ok(self.data.iter().map(|&b| char::from(b)).collect())
            }
            ItemType::Unicode => decode_utf16(&self.data),
            ItemType::PositiveInt | ItemType::NegativeInt => Ok(self.as_i64()?.to_string()),
            ItemType::PositiveFloat | ItemType::NegativeFloat => Ok(self.as_f64()?.to_string()),
            ItemType::Other(tag) => Err(ProtocolError::UnexpectedItemType {
                expected: "string",
                actual: tag,
            }),
        }
    }
}

/// Sequential reader over a buffer of list items.
///
/// The reader owns a cheap clone of the buffer, so nested buffers can be
/// unpacked into their own reader without touching the parent's position.
#[derive(Debug, Clone, Default)]
pub struct ListReader {
    buf: Bytes,
    pos: usize,
}

impl ListReader {
    /// Create a reader positioned at the start of `buf`.
    #[must_use]
    pub fn new(buf: Bytes) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current offset into the buffer.
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    /// Whether every byte has been consumed.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Decode the next item.
    pub fn next_item(&mut self) -> Result<ListItem, ProtocolError> {
        let (item, next) = ListItem::decode(&self.buf, self.pos)?;
        self.pos = next;
        Ok(item)
    }

    /// Decode the next item as an integer.
    pub fn read_i64(&mut self) -> Result<i64, ProtocolError> {
        self.next_item()?.as_i64()
    }

    /// Decode the next item as a non-negative count.
    pub fn read_count(&mut self) -> Result<usize, ProtocolError> {
        let value = self.read_i64()?;
        usize::try_from(value).map_err(|_| ProtocolError::InvalidNumber(value.to_string()))
    }

    /// Decode the next item as a boolean.
    pub fn read_bool(&mut self) -> Result<bool, ProtocolError> {
        self.next_item()?.as_bool()
    }

    /// Decode the next item as a float.
    pub fn read_f64(&mut self) -> Result<f64, ProtocolError> {
        self.next_item()?.as_f64()
    }

    /// Decode the next item as text.
    pub fn read_string(&mut self) -> Result<String, ProtocolError> {
        self.next_item()?.as_string()
    }

    /// Decode the next item and return its raw body.
    pub fn read_bytes(&mut self) -> Result<Bytes, ProtocolError> {
        Ok(self.next_item()?.into_data())
    }

    /// Read a raw little-endian `u16` that is not list-item encoded.
    pub fn read_raw_u16(&mut self) -> Result<u16, ProtocolError> {
        let value = read_u16_le(&self.buf, self.pos)?;
        self.pos += 2;
        Ok(value)
    }

    /// Take every unconsumed byte.
    pub fn take_rest(&mut self) -> Bytes {
        let start = self.pos.min(self.buf.len());
        self.pos = self.buf.len();
        self.buf.slice(start..)
    }
}

fn read_u16_le(buf: &Bytes, pos: usize) -> Result<u16, ProtocolError> {
    match buf.get(pos..pos + 2) {
        Some(b) => Ok(u16::from_le_bytes([b[0], b[1]])),
        None => Err(ProtocolError::truncated(2, buf.len().saturating_sub(pos))),
    }
}

fn read_u32_le(buf: &Bytes, pos: usize) -> Result<u32, ProtocolError> {
    match buf.get(pos..pos + 4) {
        Some(b) => Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]])),
        None => Err(ProtocolError::truncated(4, buf.len().saturating_sub(pos))),
    }
}

/// Append the integer body for `value` and return the matching tag.
fn put_int_body(dst: &mut Vec<u8>, value: i64) -> ItemType {
    if value < 0 {
        // !value == -value - 1 without overflowing at i64::MIN
        put_unsigned_body(dst, !value as u64, 0xFF);
        ItemType::NegativeInt
    } else {
        put_unsigned_body(dst, value as u64, 0);
        ItemType::PositiveInt
    }
}

fn put_unsigned_body(dst: &mut Vec<u8>, mut value: u64, mask: u8) {
    while value > 0 {
        dst.push((value & 0xFF) as u8 ^ mask);
        value >>= 8;
    }
}

fn decode_unsigned(data: &[u8], mask: u8) -> Result<u64, ProtocolError> {
    if data.len() > 8 {
        return Err(ProtocolError::IntegerOverflow(data.len()));
    }
    Ok(data
        .iter()
        .enumerate()
        .fold(0u64, |acc, (i, &b)| acc | (u64::from(b ^ mask) << (8 * i))))
}

fn decode_positive(data: &[u8]) -> Result<i64, ProtocolError> {
    let value = decode_unsigned(data, 0)?;
    i64::try_from(value).map_err(|_| ProtocolError::IntegerOverflow(data.len()))
}

fn decode_negative(data: &[u8]) -> Result<i64, ProtocolError> {
    let value = decode_unsigned(data, 0xFF)?;
    let value = i64::try_from(value).map_err(|_| ProtocolError::IntegerOverflow(data.len()))?;
    Ok(-1 - value)
}

fn decode_float(data: &[u8], negative: bool) -> Result<f64, ProtocolError> {
    let (&exponent, mantissa) = data
        .split_first()
        .ok_or(ProtocolError::truncated(1, 0))?;
    let mantissa = if negative {
        decode_negative(mantissa)?
    } else {
        decode_positive(mantissa)?
    };
    scale_decimal(mantissa, i32::from(exponent as i8))
}

/// `mantissa * 10^exponent`, rounded once to the nearest float.
fn scale_decimal(mantissa: i64, exponent: i32) -> Result<f64, ProtocolError> {
    let literal = format!("{mantissa}e{exponent}");
    literal
        .parse::<f64>()
        .map_err(|_| ProtocolError::InvalidNumber(literal))
}

/// Split a float into an integer mantissa and a decimal exponent.
fn decimal_parts(value: f64) -> Result<(i64, i8), ProtocolError> {
    if !value.is_finite() {
        return Err(ProtocolError::FloatOutOfRange(value));
    }
    // `{:e}` yields the shortest round-tripping digits, e.g. "-1.2345e1".
    let repr = format!("{value:e}");
    let (significand, exponent) = repr
        .split_once('e')
        .ok_or(ProtocolError::FloatOutOfRange(value))?;
    let mut exponent: i32 = exponent
        .parse()
        .map_err(|_| ProtocolError::FloatOutOfRange(value))?;

    let negative = significand.starts_with('-');
    let significand = significand.trim_start_matches('-');
    let (whole, fraction) = significand.split_once('.').unwrap_or((significand, ""));
    exponent -= fraction.len() as i32;

    let mut mantissa: i64 = format!("{whole}{fraction}")
        .parse()
        .map_err(|_| ProtocolError::FloatOutOfRange(value))?;
    while mantissa != 0 && mantissa % 10 == 0 {
        mantissa /= 10;
        exponent += 1;
    }
    if mantissa == 0 {
        exponent = 0;
    }

    let exponent = i8::try_from(exponent).map_err(|_| ProtocolError::FloatOutOfRange(value))?;
    Ok((if negative { -mantissa } else { mantissa }, exponent))
}

fn decode_utf16(data: &[u8]) -> Result<String, ProtocolError> {
    if data.len() % 2 != 0 {
        return Err(ProtocolError::InvalidUtf16);
    }
    let units: Vec<u16> = data
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units).map_err(|_| ProtocolError::InvalidUtf16)
}

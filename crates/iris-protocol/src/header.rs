//! Message header definitions.
//!
//! Every message starts with a fixed 14-byte header:
//!
//! ```text
//! +----------------+----------------+----------------+---------+
//! | length (u32LE) | sequence (u32) | statement (u32)| code(2) |
//! +----------------+----------------+----------------+---------+
//! ```
//!
//! On requests the code slot holds the [`Opcode`]. On responses it holds
//! either an echoed opcode or a little-endian status word that query and
//! update responses use as a signed SQL code.

use bytes::{Buf, BufMut};

use crate::error::ProtocolError;
use crate::opcode::Opcode;

/// Header size in bytes.
pub const HEADER_SIZE: usize = 14;

/// Status word signalling a rejected login.
pub const STATUS_AUTH_FAILED: u16 = 417;

/// SQL code for success.
pub const SQL_OK: i16 = 0;

/// SQL code for "no more data".
pub const SQL_NO_MORE_DATA: i16 = 100;

/// Fixed message header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MessageHeader {
    /// Payload length, excluding the header.
    pub length: u32,
    /// Session message sequence number.
    pub sequence: u32,
    /// Statement id, or zero for non-statement messages.
    pub statement_id: u32,
    /// Opcode on requests, status on responses.
    pub code: [u8; 2],
}

impl MessageHeader {
    /// Create a request header for `opcode`.
    #[must_use]
    pub fn new(opcode: Opcode) -> Self {
        Self {
            code: opcode.as_bytes(),
            ..Self::default()
        }
    }

    /// Parse a header from the front of `src`.
    pub fn decode(src: &mut impl Buf) -> Result<Self, ProtocolError> {
        if src.remaining() < HEADER_SIZE {
            return Err(ProtocolError::truncated(HEADER_SIZE, src.remaining()));
        }
        let length = src.get_u32_le();
        let sequence = src.get_u32_le();
        let statement_id = src.get_u32_le();
        let code = [src.get_u8(), src.get_u8()];
        Ok(Self {
            length,
            sequence,
            statement_id,
            code,
        })
    }

    /// Write the header to `dst`.
    pub fn encode(&self, dst: &mut impl BufMut) {
        dst.put_u32_le(self.length);
        dst.put_u32_le(self.sequence);
        dst.put_u32_le(self.statement_id);
        dst.put_slice(&self.code);
    }

    /// The code slot as a little-endian status word.
    #[must_use]
    pub const fn status(&self) -> u16 {
        u16::from_le_bytes(self.code)
    }

    /// The code slot as a signed SQL status.
    #[must_use]
    pub const fn sql_code(&self) -> i16 {
        i16::from_le_bytes(self.code)
    }

    /// Whether the SQL status is 0 or 100.
    #[must_use]
    pub const fn is_sql_success(&self) -> bool {
        matches!(self.sql_code(), SQL_OK | SQL_NO_MORE_DATA)
    }

    /// Interpret the code slot as an opcode.
    pub fn opcode(&self) -> Result<Opcode, ProtocolError> {
        Opcode::from_bytes(self.code)
    }

    /// Payload length as `usize`.
    #[must_use]
    pub const fn payload_length(&self) -> usize {
        self.length as usize
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        let header = MessageHeader {
            length: 5,
            sequence: 2,
            statement_id: 7,
            code: Opcode::DirectQuery.as_bytes(),
        };
        let mut buf = Vec::new();
        header.encode(&mut buf);
        assert_eq!(
            buf,
            vec![5, 0, 0, 0, 2, 0, 0, 0, 7, 0, 0, 0, b'D', b'Q']
        );

        let decoded = MessageHeader::decode(&mut buf.as_slice()).unwrap();
        assert_eq!(decoded, header);
        assert_eq!(decoded.opcode().unwrap(), Opcode::DirectQuery);
    }

    #[test]
    fn test_status_interpretation() {
        let header = MessageHeader {
            code: 417u16.to_le_bytes(),
            ..MessageHeader::default()
        };
        assert_eq!(header.status(), STATUS_AUTH_FAILED);

        let header = MessageHeader {
            code: (-30i16).to_le_bytes(),
            ..MessageHeader::default()
        };
        assert_eq!(header.sql_code(), -30);
        assert!(!header.is_sql_success());

        let header = MessageHeader {
            code: 100u16.to_le_bytes(),
            ..MessageHeader::default()
        };
        assert!(header.is_sql_success());
    }

    #[test]
    fn test_short_header_is_error() {
        let bytes = [0u8; 13];
        assert!(matches!(
            MessageHeader::decode(&mut &bytes[..]),
            Err(ProtocolError::Truncated { needed: 14, available: 13 })
        ));
    }
}

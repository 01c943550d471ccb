//! Message opcodes.
//!
//! Opcodes occupy the last two bytes of a request header. Most SQL opcodes
//! are two ASCII letters; the object-access opcodes use a raw byte pair
//! ending in `0xC2`.

use crate::error::ProtocolError;

/// Two-byte request opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Opcode {
    /// Login (`CN`).
    Connect,
    /// Protocol version negotiation (`HS`).
    Handshake,
    /// Session close (`DC`).
    Disconnect,
    /// Read a global node.
    GlobalGet,
    /// Write a global node.
    GlobalSet,
    /// Delete a global node.
    GlobalKill,
    /// Walk sibling subscripts.
    GlobalOrder,
    /// Test whether a node has data or children.
    GlobalData,
    /// Call a class method that returns a value.
    ClassMethodValue,
    /// Call a class method without a return value.
    ClassMethodVoid,
    /// Call an instance method that returns a value.
    MethodValue,
    /// Call an instance method without a return value.
    MethodVoid,
    /// Read an object property.
    PropertyGet,
    /// Write an object property.
    PropertySet,
    /// Execute a query directly (`DQ`).
    DirectQuery,
    /// Execute a prepared query (`PQ`).
    PreparedQuery,
    /// Execute an update directly (`DU`).
    DirectUpdate,
    /// Execute a cached update (`PU`).
    PreparedUpdate,
    /// Prepare a statement (`PP`).
    Prepare,
    /// Fetch generated keys (`GG`).
    GetAutoGeneratedKeys,
    /// Commit the open transaction (`TC`).
    Commit,
    /// Roll back the open transaction (`TR`).
    Rollback,
    /// Fetch data for multiple result sets (`MD`).
    MultipleResultSetsFetchData,
    /// Advance to the next result set (`MR`).
    GetMoreResults,
    /// Fetch the next chunk of rows (`FD`).
    FetchData,
    /// Fetch the message for an SQL status code (`OE`).
    GetServerError,
}

impl Opcode {
    const TABLE: [(Opcode, [u8; 2]); 26] = [
        (Opcode::Connect, *b"CN"),
        (Opcode::Handshake, *b"HS"),
        (Opcode::Disconnect, *b"DC"),
        (Opcode::GlobalGet, [0x41, 0xC2]),
        (Opcode::GlobalSet, [0x42, 0xC2]),
        (Opcode::GlobalKill, [0x43, 0xC2]),
        (Opcode::GlobalOrder, [0x45, 0xC2]),
        (Opcode::GlobalData, [0x49, 0xC2]),
        (Opcode::ClassMethodValue, [0x4B, 0xC2]),
        (Opcode::ClassMethodVoid, [0x4C, 0xC2]),
        (Opcode::MethodValue, [0x5B, 0xC2]),
        (Opcode::MethodVoid, [0x5C, 0xC2]),
        (Opcode::PropertyGet, [0x5D, 0xC2]),
        (Opcode::PropertySet, [0x5E, 0xC2]),
        (Opcode::DirectQuery, *b"DQ"),
        (Opcode::PreparedQuery, *b"PQ"),
        (Opcode::DirectUpdate, *b"DU"),
        (Opcode::PreparedUpdate, *b"PU"),
        (Opcode::Prepare, *b"PP"),
        (Opcode::GetAutoGeneratedKeys, *b"GG"),
        (Opcode::Commit, *b"TC"),
        (Opcode::Rollback, *b"TR"),
        (Opcode::MultipleResultSetsFetchData, *b"MD"),
        (Opcode::GetMoreResults, *b"MR"),
        (Opcode::FetchData, *b"FD"),
        (Opcode::GetServerError, *b"OE"),
    ];

    /// Wire bytes for this opcode.
    #[must_use]
    pub fn as_bytes(self) -> [u8; 2] {
        Self::TABLE
            .iter()
            .find(|(op, _)| *op == self)
            .map_or([0, 0], |(_, bytes)| *bytes)
    }

    /// Look up an opcode by its wire bytes.
    pub fn from_bytes(bytes: [u8; 2]) -> Result<Self, ProtocolError> {
        Self::TABLE
            .iter()
            .find(|(_, b)| *b == bytes)
            .map(|(op, _)| *op)
            .ok_or(ProtocolError::UnknownOpcode(bytes))
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [a, b] = self.as_bytes();
        if a.is_ascii_alphabetic() && b.is_ascii_alphabetic() {
            write!(f, "{}{}", char::from(a), char::from(b))
        } else {
            write!(f, "{a:02X}{b:02X}")
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_opcodes() {
        assert_eq!(Opcode::Connect.as_bytes(), [0x43, 0x4E]);
        assert_eq!(Opcode::Handshake.as_bytes(), *b"HS");
        assert_eq!(Opcode::GetServerError.as_bytes(), *b"OE");
        assert_eq!(Opcode::DirectQuery.to_string(), "DQ");
    }

    #[test]
    fn test_raw_opcodes() {
        assert_eq!(Opcode::GlobalGet.as_bytes(), [0x41, 0xC2]);
        assert_eq!(Opcode::ClassMethodValue.as_bytes(), [0x4B, 0xC2]);
        assert_eq!(Opcode::PropertySet.to_string(), "5EC2");
    }

    #[test]
    fn test_opcode_lookup() {
        for (op, bytes) in Opcode::TABLE {
            assert_eq!(Opcode::from_bytes(bytes).unwrap(), op);
        }
        assert!(Opcode::from_bytes(*b"ZZ").is_err());
    }
}

//! Feature option negotiation.
//!
//! The client requests a set of feature options at login and the server
//! answers with the set it grants. Granted options change the shape of
//! later query and update responses.

use bitflags::bitflags;

bitflags! {
    /// Session feature options.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FeatureOptions: u32 {
        /// Rows arrive pre-batched in a nested list.
        const FAST_SELECT = 0x01;
        /// Batched inserts use the dense cached-statement encoding.
        const FAST_INSERT = 0x02;
        /// Commits are durable before acknowledgement.
        const DURABLE_TRANSACTIONS = 0x04;
        /// Columns are reported as not nullable.
        const NOT_NULLABLE = 0x08;
        /// Server console output is redirected to the client.
        const REDIRECT_OUTPUT = 0x20;
    }
}

impl FeatureOptions {
    /// Fast select and fast insert together.
    pub const FAST_SELECT_AND_INSERT: Self = Self::FAST_SELECT.union(Self::FAST_INSERT);

    /// Options requested unless configured otherwise.
    pub const DEFAULT_REQUEST: Self = Self::FAST_SELECT
        .union(Self::DURABLE_TRANSACTIONS)
        .union(Self::REDIRECT_OUTPUT);

    /// Build from a wire integer, keeping unknown bits.
    #[must_use]
    pub fn from_wire(value: i64) -> Self {
        Self::from_bits_retain(value as u32)
    }

    /// Value sent on the wire.
    #[must_use]
    pub fn to_wire(self) -> i64 {
        i64::from(self.bits())
    }

    /// Whether the fast-insert encoding is available.
    #[must_use]
    pub fn is_fast_insert(self) -> bool {
        self.contains(Self::FAST_INSERT)
    }

    /// Whether rows may arrive pre-batched.
    #[must_use]
    pub fn is_fast_select(self) -> bool {
        self.contains(Self::FAST_SELECT)
    }
}

impl Default for FeatureOptions {
    fn default() -> Self {
        Self::DEFAULT_REQUEST
    }
}

//! Message assembly.
//!
//! A [`MessageBuilder`] accumulates list items for one request. The header
//! fields that depend on session state (sequence number, statement id) are
//! supplied only when the message is finished.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::ProtocolError;
use crate::header::{HEADER_SIZE, MessageHeader};
use crate::list::{ListItem, ListReader};
use crate::opcode::Opcode;

/// Largest SQL text fragment sent as one list item.
pub const SQL_TEXT_CHUNK_SIZE: usize = 31_904;

/// A complete message: header plus payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Message header.
    pub header: MessageHeader,
    /// Payload bytes following the header.
    pub payload: Bytes,
}

impl Message {
    /// Create a message from its parts.
    #[must_use]
    pub fn new(header: MessageHeader, payload: Bytes) -> Self {
        Self { header, payload }
    }

    /// Status word of a response.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.header.status()
    }

    /// Signed SQL status of a response.
    #[must_use]
    pub fn sql_code(&self) -> i16 {
        self.header.sql_code()
    }

    /// A reader over the payload.
    #[must_use]
    pub fn reader(&self) -> ListReader {
        ListReader::new(self.payload.clone())
    }

    /// Header plus payload size.
    #[must_use]
    pub fn total_size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }

    /// Write the header and payload to `dst`.
    pub fn encode(&self, dst: &mut impl BufMut) {
        self.header.encode(dst);
        dst.put_slice(&self.payload);
    }
}

/// Builder for an outgoing message.
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    opcode: Opcode,
    payload: BytesMut,
}

impl MessageBuilder {
    /// Start a message with the given opcode.
    #[must_use]
    pub fn new(opcode: Opcode) -> Self {
        Self {
            opcode,
            payload: BytesMut::new(),
        }
    }

    /// The message opcode.
    #[must_use]
    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    /// Payload bytes written so far.
    #[must_use]
    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }

    /// Append an encoded list item.
    pub fn push(&mut self, item: &ListItem) -> &mut Self {
        item.encode(&mut self.payload);
        self
    }

    /// Append an integer item.
    pub fn push_int(&mut self, value: i64) -> &mut Self {
        self.push(&ListItem::from_i64(value))
    }

    /// Append a text item.
    pub fn push_str(&mut self, value: &str) -> &mut Self {
        self.push(&ListItem::from_text(value))
    }

    /// Append a byte-string item.
    pub fn push_bytes(&mut self, value: impl Into<Bytes>) -> &mut Self {
        self.push(&ListItem::from_bytes(value))
    }

    /// Append the null item.
    pub fn push_null(&mut self) -> &mut Self {
        self.push(&ListItem::null())
    }

    /// Append bytes verbatim, without list-item framing.
    pub fn push_raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.payload.put_slice(bytes);
        self
    }

    /// Append a raw little-endian `u16`.
    pub fn push_raw_u16(&mut self, value: u16) -> &mut Self {
        self.payload.put_u16_le(value);
        self
    }

    /// Append SQL text.
    ///
    /// Empty text is a single empty string item. Otherwise the text is
    /// preceded by its chunk count and split into fragments of at most
    /// [`SQL_TEXT_CHUNK_SIZE`] bytes, cut on character boundaries.
    pub fn push_sql_text(&mut self, sql: &str) -> &mut Self {
        if sql.is_empty() {
            return self.push_str("");
        }
        let chunks = sql_text_chunks(sql);
        self.push_int(chunks.len() as i64);
        for chunk in chunks {
            self.push_str(chunk);
        }
        self
    }

    /// Seal the message with its sequence number and statement id.
    pub fn finish(self, sequence: u32, statement_id: u32) -> Result<Message, ProtocolError> {
        let length = u32::try_from(self.payload.len())
            .map_err(|_| ProtocolError::ItemTooLarge(self.payload.len()))?;
        let header = MessageHeader {
            length,
            sequence,
            statement_id,
            code: self.opcode.as_bytes(),
        };
        Ok(Message::new(header, self.payload.freeze()))
    }
}

/// Split SQL text into wire fragments.
#[must_use]
pub fn sql_text_chunks(sql: &str) -> Vec<&str> {
    let mut chunks = Vec::with_capacity(sql.len() / SQL_TEXT_CHUNK_SIZE + 1);
    let mut rest = sql;
    while rest.len() > SQL_TEXT_CHUNK_SIZE {
        let mut cut = SQL_TEXT_CHUNK_SIZE;
        while !rest.is_char_boundary(cut) {
            cut -= 1;
        }
        let (head, tail) = rest.split_at(cut);
        chunks.push(head);
        rest = tail;
    }
    if !rest.is_empty() {
        chunks.push(rest);
    }
    chunks
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_finish_sets_header() {
        let mut builder = MessageBuilder::new(Opcode::GetServerError);
        builder.push_int(-30);
        let message = builder.finish(4, 0).unwrap();

        assert_eq!(message.header.length, 3);
        assert_eq!(message.header.sequence, 4);
        assert_eq!(message.header.code, *b"OE");
        assert_eq!(message.payload.as_ref(), &[0x03, 0x05, 0xe2]);

        let mut wire = Vec::new();
        message.encode(&mut wire);
        assert_eq!(wire.len(), message.total_size());
        assert_eq!(&wire[..4], &[3, 0, 0, 0]);
        assert_eq!(&wire[12..14], b"OE");
    }

    #[test]
    fn test_raw_fields() {
        let mut builder = MessageBuilder::new(Opcode::Handshake);
        builder.push_raw_u16(69);
        let message = builder.finish(0, 0).unwrap();
        assert_eq!(message.payload.as_ref(), &[69, 0]);
    }

    #[test]
    fn test_short_sql_text_has_single_chunk() {
        let mut builder = MessageBuilder::new(Opcode::DirectQuery);
        builder.push_sql_text("SELECT 1");
        let message = builder.finish(0, 1).unwrap();

        let mut reader = message.reader();
        assert_eq!(reader.read_i64().unwrap(), 1);
        assert_eq!(reader.read_string().unwrap(), "SELECT 1");
        assert!(reader.is_exhausted());
    }

    #[test]
    fn test_empty_sql_text() {
        let mut builder = MessageBuilder::new(Opcode::DirectQuery);
        builder.push_sql_text("");
        let message = builder.finish(0, 1).unwrap();
        assert_eq!(message.payload.as_ref(), &[0x02, 0x01]);
    }

    #[test]
    fn test_long_sql_text_is_chunked() {
        let sql = "x".repeat(SQL_TEXT_CHUNK_SIZE * 2 + 10);
        let mut builder = MessageBuilder::new(Opcode::DirectUpdate);
        builder.push_sql_text(&sql);
        let message = builder.finish(0, 1).unwrap();

        let mut reader = message.reader();
        assert_eq!(reader.read_i64().unwrap(), 3);
        let mut rebuilt = String::new();
        for _ in 0..3 {
            let chunk = reader.read_string().unwrap();
            assert!(chunk.len() <= SQL_TEXT_CHUNK_SIZE);
            rebuilt.push_str(&chunk);
        }
        assert_eq!(rebuilt, sql);
    }

    #[test]
    fn test_chunks_respect_char_boundaries() {
        let sql = format!("{}é", "a".repeat(SQL_TEXT_CHUNK_SIZE - 1));
        let chunks = sql_text_chunks(&sql);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), SQL_TEXT_CHUNK_SIZE - 1);
        assert_eq!(chunks[1], "é");
    }
}

//! Statement response structures.
//!
//! Query and update responses open with a statement feature descriptor,
//! followed by column metadata (queries) or parameter descriptions
//! (updates). The descriptor decides how the row data that follows is
//! framed.

use bitflags::bitflags;

use crate::error::ProtocolError;
use crate::list::ListReader;

/// How row data for a statement is framed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatementFeature {
    /// Raw feature option.
    pub option: i64,
    /// Message or key count hint, present when `option == 2`.
    pub message_count: i64,
    /// Items per pre-batched row, present when `option` is 1 or 2.
    pub max_row_items: usize,
}

impl StatementFeature {
    /// Rows arrive one item per column.
    pub const SIMPLE: i64 = 0;
    /// Each row is a nested list item.
    pub const BATCHED_ROWS: i64 = 1;
    /// The server streams count hints.
    pub const COUNT_HINTS: i64 = 2;

    /// Decode the descriptor.
    pub fn decode(reader: &mut ListReader) -> Result<Self, ProtocolError> {
        let option = reader.read_i64()?;
        let mut feature = Self {
            option,
            ..Self::default()
        };
        if option == Self::COUNT_HINTS {
            feature.message_count = reader.read_i64()?;
        }
        if option == Self::BATCHED_ROWS || option == Self::COUNT_HINTS {
            feature.max_row_items = reader.read_count()?;
        }
        Ok(feature)
    }

    /// Whether each row must be unpacked from a nested item.
    #[must_use]
    pub fn is_batched_rows(&self) -> bool {
        self.option == Self::BATCHED_ROWS
    }

    /// Whether column metadata carries explicit slot positions.
    #[must_use]
    pub fn has_slot_positions(&self) -> bool {
        self.option & 0x01 == 0x01
    }
}

bitflags! {
    /// Column attribute flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ColumnFlags: u8 {
        /// Value is generated by the server.
        const AUTO_INCREMENT = 0x01;
        /// Comparisons are case-sensitive.
        const CASE_SENSITIVE = 0x02;
        /// Column holds a currency amount.
        const CURRENCY = 0x04;
        /// Column cannot be written.
        const READ_ONLY = 0x08;
        /// Column is the row id.
        const ROW_ID = 0x10;
    }
}

impl ColumnFlags {
    /// Decode the attribute byte-string sent with each column.
    ///
    /// Bytes 0 to 3 map to auto-increment, case-sensitive, currency and
    /// read-only. Byte 11, when present, marks the row id.
    #[must_use]
    pub fn from_attributes(attributes: &[u8]) -> Self {
        let set = |index: usize| attributes.get(index) == Some(&0x01);
        let mut flags = Self::empty();
        flags.set(Self::AUTO_INCREMENT, set(0));
        flags.set(Self::CASE_SENSITIVE, set(1));
        flags.set(Self::CURRENCY, set(2));
        flags.set(Self::READ_ONLY, set(3));
        flags.set(Self::ROW_ID, set(11));
        flags
    }
}

/// Column metadata as sent by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMetadata {
    /// Column name.
    pub name: String,
    /// Column type code, with raw date/time codes remapped.
    pub type_code: i32,
    /// Declared precision.
    pub precision: i64,
    /// Declared scale.
    pub scale: i64,
    /// Nullability code.
    pub nullable: i64,
    /// Display label.
    pub label: String,
    /// Originating table.
    pub table: String,
    /// Originating schema.
    pub schema: String,
    /// Originating catalog.
    pub catalog: String,
    /// Index into the per-row item array.
    pub slot: usize,
    /// Attribute flags.
    pub flags: ColumnFlags,
}

/// Remap the server's raw date/time codes onto their ODBC equivalents.
#[must_use]
pub fn remap_type_code(code: i32) -> i32 {
    match code {
        9 => 91,
        10 => 92,
        11 => 93,
        other => other,
    }
}

impl ColumnMetadata {
    /// Decode the column block of a query response.
    pub fn decode_all(
        reader: &mut ListReader,
        feature: &StatementFeature,
    ) -> Result<Vec<Self>, ProtocolError> {
        let count = reader.read_count()?;
        let mut columns = Vec::with_capacity(count);
        for ordinal in 0..count {
            let name = reader.read_string()?;
            let raw_type = reader.read_i64()?;
            let type_code = i32::try_from(raw_type)
                .map_err(|_| ProtocolError::InvalidNumber(raw_type.to_string()))?;
            let precision = reader.read_i64()?;
            let scale = reader.read_i64()?;
            let nullable = reader.read_i64()?;
            let label = reader.read_string()?;
            let table = reader.read_string()?;
            let schema = reader.read_string()?;
            let catalog = reader.read_string()?;
            let attributes = reader.read_bytes()?;
            let slot = if feature.has_slot_positions() {
                let position = reader.read_i64()?;
                usize::try_from(position - 1)
                    .map_err(|_| ProtocolError::InvalidNumber(position.to_string()))?
            } else {
                ordinal
            };
            columns.push(Self {
                name,
                type_code: remap_type_code(type_code),
                precision,
                scale,
                nullable,
                label,
                table,
                schema,
                catalog,
                slot,
                flags: ColumnFlags::from_attributes(&attributes),
            });
        }
        Ok(columns)
    }
}

/// Skip the parameter block that closes a query response.
pub fn skip_query_parameters(reader: &mut ListReader) -> Result<(), ProtocolError> {
    if reader.is_exhausted() {
        return Ok(());
    }
    reader.next_item()?;
    if !reader.is_exhausted() {
        reader.next_item()?;
    }
    Ok(())
}

/// One bound parameter as described by an update response.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParameterDescription {
    /// Parameter type code.
    pub type_code: i64,
    /// Declared precision.
    pub precision: i64,
    /// Declared scale.
    pub scale: i64,
    /// Nullability, fast-insert only.
    pub nullable: bool,
    /// Target column position, fast-insert only.
    pub position: i64,
    /// Target column name, fast-insert only.
    pub column_name: Option<String>,
}

/// Parameter block of the first update response in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpdateParameterInfo {
    /// Per-parameter descriptions.
    pub parameters: Vec<ParameterDescription>,
    /// Target table, fast-insert only.
    pub table_name: Option<String>,
    /// Whether later batch iterations may use the cached statement.
    pub cacheable: bool,
    /// Whether the target table has an identity column, fast-insert only.
    pub has_identity: bool,
    /// Column defaults appended to each fast-insert row.
    pub defaults: Vec<String>,
}

impl UpdateParameterInfo {
    /// Decode the parameter block.
    pub fn decode(reader: &mut ListReader, fast_insert: bool) -> Result<Self, ProtocolError> {
        let count = reader.read_count()?;
        let mut info = Self::default();
        for index in 0..count {
            let mut parameter = ParameterDescription {
                type_code: reader.read_i64()?,
                precision: reader.read_i64()?,
                scale: reader.read_i64()?,
                ..ParameterDescription::default()
            };
            reader.next_item()?;
            if fast_insert {
                parameter.nullable = reader.read_bool()?;
                parameter.position = reader.read_i64()?;
                reader.next_item()?;
                reader.next_item()?;
                if index == 0 {
                    info.table_name = Some(reader.read_string()?);
                }
                parameter.column_name = Some(reader.read_string()?);
            }
            info.parameters.push(parameter);
        }

        info.cacheable = reader.read_i64()? & 0x01 == 0x01;

        if fast_insert {
            let mut defaults = ListReader::new(reader.read_bytes()?);
            if !defaults.is_exhausted() {
                let first = defaults.next_item()?;
                info.has_identity = first.is_null() || first.is_empty();
            }
            while !defaults.is_exhausted() {
                let item = defaults.next_item()?;
                if !item.is_null() {
                    info.defaults.push(item.as_string()?);
                }
            }
        }
        Ok(info)
    }
}

//! Row representation for query results.
//!
//! Values are decoded when the row is pulled from the result set, using the
//! column's declared type. A [`Row`] shares its column metadata with every
//! other row of the same result set.

use std::sync::Arc;

use iris_protocol::{ColumnFlags, ColumnMetadata};
use iris_types::{FromIris, IrisValue, SqlType, TypeError};

/// Column metadata describing a result set column.
///
/// This struct is marked `#[non_exhaustive]` to allow adding new fields
/// in future versions without breaking semver compatibility.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Column index (0-based).
    pub index: usize,
    /// Declared SQL type.
    pub sql_type: SqlType,
    /// Precision for numeric types, length for character types.
    pub precision: i64,
    /// Scale for numeric types.
    pub scale: i64,
    /// Whether the column allows NULL values.
    pub nullable: bool,
    /// Column label.
    pub label: String,
    /// Table the column belongs to.
    pub table: String,
    /// Schema of that table.
    pub schema: String,
    /// Catalog of that table.
    pub catalog: String,
    /// Attribute flags.
    pub flags: ColumnFlags,
}

impl Column {
    /// Create a new column with basic metadata.
    pub fn new(name: impl Into<String>, index: usize, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            index,
            sql_type,
            precision: 0,
            scale: 0,
            nullable: true,
            label: String::new(),
            table: String::new(),
            schema: String::new(),
            catalog: String::new(),
            flags: ColumnFlags::empty(),
        }
    }

    /// Set whether the column is nullable.
    #[must_use]
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Set the owning table.
    #[must_use]
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Whether the server generates this column's values.
    #[must_use]
    pub fn is_auto_increment(&self) -> bool {
        self.flags.contains(ColumnFlags::AUTO_INCREMENT)
    }

    /// Whether the column cannot be written.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.flags.contains(ColumnFlags::READ_ONLY)
    }

    /// Whether the column is the row id.
    #[must_use]
    pub fn is_row_id(&self) -> bool {
        self.flags.contains(ColumnFlags::ROW_ID)
    }

    pub(crate) fn from_metadata(index: usize, meta: &ColumnMetadata) -> Self {
        Self {
            // The server escapes dots in column names with U+FE52.
            name: meta.name.replace('\u{FE52}', "."),
            index,
            sql_type: SqlType::from_code(meta.type_code),
            precision: meta.precision,
            scale: meta.scale,
            nullable: meta.nullable != 0,
            label: meta.label.clone(),
            table: meta.table.clone(),
            schema: meta.schema.clone(),
            catalog: meta.catalog.clone(),
            flags: meta.flags,
        }
    }
}

/// Find a column index by name (case-insensitive).
pub(crate) fn find_by_name(columns: &[Column], name: &str) -> Option<usize> {
    columns
        .iter()
        .position(|c| c.name.eq_ignore_ascii_case(name))
}

/// A row from a query result.
#[derive(Clone, PartialEq)]
pub struct Row {
    /// Column metadata (shared across result set).
    columns: Arc<[Column]>,
    /// Decoded values, one per column.
    values: Vec<IrisValue>,
}

impl Row {
    /// Create a row from decoded values.
    pub fn new(columns: Arc<[Column]>, values: Vec<IrisValue>) -> Self {
        Self { columns, values }
    }

    /// Get a value by column index with type conversion.
    pub fn get<T: FromIris>(&self, index: usize) -> Result<T, TypeError> {
        let value = self
            .values
            .get(index)
            .ok_or_else(|| TypeError::TypeMismatch {
                expected: "valid column index",
                actual: format!("index {index} out of bounds"),
            })?;
        T::from_iris(value)
    }

    /// Get a value by column name with type conversion.
    pub fn get_by_name<T: FromIris>(&self, name: &str) -> Result<T, TypeError> {
        let index = find_by_name(&self.columns, name).ok_or_else(|| TypeError::TypeMismatch {
            expected: "valid column name",
            actual: format!("column '{name}' not found"),
        })?;
        self.get(index)
    }

    /// Try to get a value by column index, returning None if NULL, not
    /// found, or not convertible.
    pub fn try_get<T: FromIris>(&self, index: usize) -> Option<T> {
        self.values
            .get(index)
            .and_then(|v| T::from_iris_nullable(v).ok().flatten())
    }

    /// Try to get a value by column name, returning None if NULL or not found.
    pub fn try_get_by_name<T: FromIris>(&self, name: &str) -> Option<T> {
        let index = find_by_name(&self.columns, name)?;
        self.try_get(index)
    }

    /// Get the raw value by index.
    #[must_use]
    pub fn get_raw(&self, index: usize) -> Option<&IrisValue> {
        self.values.get(index)
    }

    /// Check if a column value is NULL. Out-of-range indexes read as NULL.
    #[must_use]
    pub fn is_null(&self, index: usize) -> bool {
        self.values.get(index).is_none_or(IrisValue::is_null)
    }

    /// All values in column order.
    #[must_use]
    pub fn values(&self) -> &[IrisValue] {
        &self.values
    }

    /// Consume the row and return its values.
    #[must_use]
    pub fn into_values(self) -> Vec<IrisValue> {
        self.values
    }

    /// Get the number of columns in the row.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the row is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get the column metadata.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }
}

impl std::fmt::Debug for Row {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (column, value) in self.columns.iter().zip(&self.values) {
            map.entry(&column.name, value);
        }
        map.finish()
    }
}

impl<'a> IntoIterator for &'a Row {
    type Item = &'a IrisValue;
    type IntoIter = std::slice::Iter<'a, IrisValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> Row {
        let columns: Arc<[Column]> = vec![
            Column::new("ID", 0, SqlType::Integer).with_nullable(false),
            Column::new("Name", 1, SqlType::VarChar),
            Column::new("Note", 2, SqlType::VarChar),
        ]
        .into();
        Row::new(
            columns,
            vec![IrisValue::Int(42), IrisValue::from("Alice"), IrisValue::Null],
        )
    }

    #[test]
    fn test_get_by_index_and_name() {
        let row = sample();
        assert_eq!(row.get::<i32>(0).unwrap(), 42);
        assert_eq!(row.get_by_name::<String>("name").unwrap(), "Alice");
        assert!(matches!(
            row.get::<String>(2),
            Err(TypeError::UnexpectedNull)
        ));
        assert!(row.get::<i64>(9).is_err());
        assert!(row.get_by_name::<i64>("missing").is_err());
    }

    #[test]
    fn test_try_get() {
        let row = sample();
        assert_eq!(row.try_get::<i64>(0), Some(42));
        assert_eq!(row.try_get::<String>(2), None);
        assert_eq!(row.try_get_by_name::<String>("NAME"), Some("Alice".into()));
        assert_eq!(row.try_get_by_name::<String>("nope"), None);
    }

    #[test]
    fn test_row_is_null() {
        let row = sample();
        assert!(!row.is_null(0));
        assert!(row.is_null(2));
        assert!(row.is_null(99));
    }

    #[test]
    fn test_values_and_iteration() {
        let row = sample();
        assert_eq!(row.len(), 3);
        assert_eq!(row.values()[1], IrisValue::from("Alice"));
        assert_eq!((&row).into_iter().count(), 3);
        assert_eq!(row.into_values().len(), 3);
    }

    #[test]
    fn test_column_from_metadata_unescapes_dots() {
        let meta = ColumnMetadata {
            name: "t\u{FE52}id".into(),
            type_code: 4,
            precision: 10,
            scale: 0,
            nullable: 0,
            label: "id".into(),
            table: "t".into(),
            schema: "SQLUser".into(),
            catalog: String::new(),
            slot: 0,
            flags: ColumnFlags::AUTO_INCREMENT | ColumnFlags::ROW_ID,
        };
        let column = Column::from_metadata(0, &meta);
        assert_eq!(column.name, "t.id");
        assert_eq!(column.sql_type, SqlType::Integer);
        assert!(column.is_auto_increment());
        assert!(column.is_row_id());
        assert!(!column.is_read_only());
        assert!(!column.nullable);
    }
}

//! Result set streaming.
//!
//! A query response carries the first chunk of row data. When a chunk is
//! used up and the server has not reported "no more data", the next chunk
//! is requested with a FETCH_DATA message. Rows are decoded one at a time
//! as they are pulled.
//!
//! ```rust,ignore
//! let mut rows = client.query("SELECT id, name FROM people", &[]).await?;
//! while let Some(row) = rows.next().await? {
//!     let id: i64 = row.get(0)?;
//!     let name: String = row.get_by_name("name")?;
//! }
//! ```

use std::sync::Arc;

use bytes::Bytes;
use iris_protocol::{
    ColumnMetadata, ListItem, ListReader, MessageBuilder, Opcode, ProtocolError, SQL_NO_MORE_DATA,
    StatementFeature,
};
use iris_types::from_odbc;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::client::{Client, is_sql_success};
use crate::error::Result;
use crate::row::{Column, Row};

/// First response of a query, before any row is decoded.
#[derive(Debug)]
pub(crate) struct QueryHead {
    pub(crate) statement_id: u32,
    pub(crate) feature: StatementFeature,
    pub(crate) metadata: Vec<ColumnMetadata>,
    pub(crate) data: Bytes,
    pub(crate) sql_code: i16,
}

/// Rows of one query, pulled from the server on demand.
///
/// The result set borrows the session mutably, so no other request can be
/// sent until it is dropped. Dropping it early discards buffered rows; the
/// server keeps no cursor that needs closing.
pub struct ResultSet<'a, T>
where
    T: AsyncRead + AsyncWrite,
{
    client: &'a mut Client<T>,
    statement_id: u32,
    columns: Arc<[Column]>,
    slots: Vec<usize>,
    feature: StatementFeature,
    reader: ListReader,
    sql_code: i16,
    finished: bool,
}

impl<'a, T> ResultSet<'a, T>
where
    T: AsyncRead + AsyncWrite,
{
    pub(crate) fn new(client: &'a mut Client<T>, head: QueryHead) -> Self {
        let slots = head.metadata.iter().map(|meta| meta.slot).collect();
        let columns: Arc<[Column]> = head
            .metadata
            .iter()
            .enumerate()
            .map(|(index, meta)| Column::from_metadata(index, meta))
            .collect();
        Self {
            client,
            statement_id: head.statement_id,
            columns,
            slots,
            feature: head.feature,
            reader: ListReader::new(head.data),
            sql_code: head.sql_code,
            finished: false,
        }
    }

    /// Get the column metadata.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Whether the last row has been returned.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Pull the next row.
    ///
    /// Returns `Ok(None)` once the server has no more rows. After the end
    /// or an error, every later call returns `Ok(None)` without I/O.
    pub async fn next(&mut self) -> Result<Option<Row>> {
        if self.finished {
            return Ok(None);
        }
        let result = self.next_row().await;
        if !matches!(result, Ok(Some(_))) {
            self.finished = true;
        }
        self.client.settle(result)
    }

    /// Pull every remaining row.
    pub async fn collect_all(mut self) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        while let Some(row) = self.next().await? {
            rows.push(row);
        }
        Ok(rows)
    }

    async fn next_row(&mut self) -> Result<Option<Row>> {
        if !is_sql_success(self.sql_code) {
            return Err(self.client.fetch_server_error(self.sql_code).await?);
        }

        if self.reader.is_exhausted() {
            if self.sql_code == SQL_NO_MORE_DATA {
                return Ok(None);
            }
            self.fetch_more().await?;
            if !is_sql_success(self.sql_code) {
                return Err(self.client.fetch_server_error(self.sql_code).await?);
            }
            if self.reader.is_exhausted() {
                return Ok(None);
            }
        }

        let items = if self.feature.is_batched_rows() {
            let mut nested = ListReader::new(self.reader.read_bytes()?);
            read_items(&mut nested, self.feature.max_row_items)?
        } else {
            read_items(&mut self.reader, self.columns.len())?
        };
        decode_row(&self.columns, &self.slots, &items).map(Some)
    }

    async fn fetch_more(&mut self) -> Result<()> {
        tracing::trace!(statement_id = self.statement_id, "fetching next row chunk");
        let reply = self
            .client
            .exchange(MessageBuilder::new(Opcode::FetchData), self.statement_id)
            .await?;
        self.sql_code = reply.sql_code();
        self.reader = ListReader::new(reply.payload);
        Ok(())
    }
}

impl<T> std::fmt::Debug for ResultSet<'_, T>
where
    T: AsyncRead + AsyncWrite,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultSet")
            .field("statement_id", &self.statement_id)
            .field("columns", &self.columns.len())
            .field("sql_code", &self.sql_code)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

/// Outcome of an update statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecuteResult {
    /// Rows affected, summed over every batch.
    pub rows_affected: u64,
    /// Number of request batches sent.
    pub batches: usize,
    /// SQL code of an error turned into zero affected rows by an
    /// `ON CONFLICT DO NOTHING` directive.
    pub suppressed_error: Option<i16>,
}

impl ExecuteResult {
    /// Get the number of affected rows.
    #[must_use]
    pub fn rows_affected(&self) -> u64 {
        self.rows_affected
    }
}

fn read_items(reader: &mut ListReader, count: usize) -> std::result::Result<Vec<ListItem>, ProtocolError> {
    let mut items = Vec::with_capacity(count);
    for _ in 0..count {
        items.push(reader.next_item()?);
    }
    Ok(items)
}

/// Decode one row, reading each column from its slot.
pub(crate) fn decode_row(columns: &Arc<[Column]>, slots: &[usize], items: &[ListItem]) -> Result<Row> {
    let mut values = Vec::with_capacity(columns.len());
    for (column, &slot) in columns.iter().zip(slots) {
        let item = items
            .get(slot)
            .ok_or_else(|| ProtocolError::truncated(slot + 1, items.len()))?;
        values.push(from_odbc(column.sql_type, item)?);
    }
    Ok(Row::new(Arc::clone(columns), values))
}

//! Transaction support.
//!
//! A transaction is opened with a `START TRANSACTION` statement and closed
//! with a COMMIT or ROLLBACK message. Only one transaction may be open per
//! session, and read-only transactions are not supported by the server.

use tokio::io::{AsyncRead, AsyncWrite};

use crate::client::Client;
use crate::error::{Error, Result};
use crate::row::Row;
use crate::stream::{ExecuteResult, ResultSet};
use iris_types::{IrisValue, ToIris};

/// Transaction isolation level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsolationLevel {
    /// Read uncommitted (dirty reads allowed).
    ReadUncommitted,

    /// Read committed.
    ReadCommitted,

    /// Read verified.
    ///
    /// Data read under read committed is re-checked against the latest
    /// committed version before it is returned.
    ReadVerified,
}

impl IsolationLevel {
    /// Get the isolation level name as used in SQL.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::ReadUncommitted => "READ UNCOMMITTED",
            Self::ReadCommitted => "READ COMMITTED",
            Self::ReadVerified => "READ VERIFIED",
        }
    }
}

/// Options for opening a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransactionOptions {
    /// Request a read-only transaction. Always rejected.
    pub read_only: bool,
    /// Isolation level, or the session default when `None`.
    pub isolation: Option<IsolationLevel>,
}

impl TransactionOptions {
    /// Create default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the isolation level.
    #[must_use]
    pub fn isolation(mut self, level: IsolationLevel) -> Self {
        self.isolation = Some(level);
        self
    }

    /// Request a read-only transaction.
    #[must_use]
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Check the options before anything is sent.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.read_only {
            return Err(Error::misuse("read-only transactions are not supported"));
        }
        Ok(())
    }

    /// The statement that opens the transaction.
    #[must_use]
    pub fn begin_sql(&self) -> String {
        match self.isolation {
            Some(level) => format!("START TRANSACTION ISOLATION LEVEL {}", level.name()),
            None => "START TRANSACTION".to_string(),
        }
    }
}

/// An open transaction.
///
/// The handle borrows the session for its whole lifetime and is consumed
/// by [`commit`](Self::commit) or [`rollback`](Self::rollback). Dropping it
/// without either leaves the transaction open on the session; it can still
/// be closed with [`Client::commit`] or [`Client::rollback`].
///
/// # Example
///
/// ```rust,ignore
/// let mut tx = client.begin().await?;
/// tx.execute("INSERT INTO orders (customer) VALUES (?)", &[&42]).await?;
/// tx.commit().await?;
/// ```
pub struct Transaction<'a, T>
where
    T: AsyncRead + AsyncWrite,
{
    client: &'a mut Client<T>,
    finished: bool,
}

impl<'a, T> Transaction<'a, T>
where
    T: AsyncRead + AsyncWrite,
{
    pub(crate) fn new(client: &'a mut Client<T>) -> Self {
        Self {
            client,
            finished: false,
        }
    }

    /// Run a query inside the transaction.
    pub async fn query<'b>(
        &'b mut self,
        sql: &str,
        params: &[&(dyn ToIris + Sync)],
    ) -> Result<ResultSet<'b, T>> {
        self.client.query(sql, params).await
    }

    /// Run an update statement inside the transaction.
    pub async fn execute(
        &mut self,
        sql: &str,
        params: &[&(dyn ToIris + Sync)],
    ) -> Result<ExecuteResult> {
        self.client.execute(sql, params).await
    }

    /// Run a query and return the first column of its first row.
    pub async fn query_scalar(
        &mut self,
        sql: &str,
        params: &[&(dyn ToIris + Sync)],
    ) -> Result<Option<IrisValue>> {
        self.client.query_scalar(sql, params).await
    }

    /// Run a query and collect every row.
    pub async fn query_all(
        &mut self,
        sql: &str,
        params: &[&(dyn ToIris + Sync)],
    ) -> Result<Vec<Row>> {
        self.client.query(sql, params).await?.collect_all().await
    }

    /// Commit the transaction.
    pub async fn commit(mut self) -> Result<()> {
        self.finished = true;
        self.client.commit().await
    }

    /// Roll the transaction back.
    pub async fn rollback(mut self) -> Result<()> {
        self.finished = true;
        self.client.rollback().await
    }
}

impl<T> Drop for Transaction<'_, T>
where
    T: AsyncRead + AsyncWrite,
{
    fn drop(&mut self) {
        if !self.finished && self.client.is_in_transaction() {
            tracing::warn!("transaction handle dropped without commit or rollback; it stays open");
        }
    }
}

impl<T> std::fmt::Debug for Transaction<'_, T>
where
    T: AsyncRead + AsyncWrite,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

use crate::{CancelToken, Error, ErrorKind, Result, Value, model::WriteSlot};
use futures::future::{self, BoxFuture, FutureExt};
use std::{collections::VecDeque, marker::PhantomData, sync::Arc};

/// Metadata about modify operations (INSERT/UPDATE/DELETE).
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowsAffected {
    /// Total number of rows impacted.
    pub rows_affected: u64,
    /// Backend-specific last inserted / affected identifier when available.
    pub last_affected_id: Option<i64>,
}

/// The query/exec contract a backend offers to the builders.
///
/// Both a database connection and an open transaction implement it, the builders do not know
/// which one they are talking to. Cancellation is up to the implementation: `cancel` is handed
/// over untouched.
pub trait Session: Send + Sync {
    fn query<'s>(
        &'s self,
        cancel: &'s CancelToken,
        statement: &'s str,
        args: &'s [Value],
    ) -> BoxFuture<'s, Result<Box<dyn RowCursor>>>;

    fn exec<'s>(
        &'s self,
        cancel: &'s CancelToken,
        statement: &'s str,
        args: &'s [Value],
    ) -> BoxFuture<'s, Result<RowsAffected>>;
}

/// A session able to open transactions.
pub trait TransactionalSession: Session {
    type Transaction: TransactionSession;

    fn begin(&self) -> BoxFuture<'_, Result<Self::Transaction>>;
}

/// An open transaction, consumed by its outcome.
pub trait TransactionSession: Session + Sized {
    fn commit(self) -> BoxFuture<'static, Result<()>>;
    fn rollback(self) -> BoxFuture<'static, Result<()>>;
}

/// Forward only cursor over the rows returned by [`Session::query`].
pub trait RowCursor: Send {
    fn column_names(&self) -> &[String];
    /// Moves to the next row, `false` once exhausted.
    fn advance(&mut self) -> BoxFuture<'_, Result<bool>>;
    /// Decodes the current row, one destination per column in order.
    fn decode_into(&mut self, destinations: &mut [Destination<'_>]) -> Result<()>;
    fn close(&mut self);
}

/// Target memory of one decoded column.
pub struct Destination<'a> {
    column: &'a str,
    ptr: *mut u8,
    write: WriteSlot,
    _target: PhantomData<&'a mut u8>,
}

// The pointer is derived from a `&'a mut` to a `Send` record.
unsafe impl Send for Destination<'_> {}

impl<'a> Destination<'a> {
    /// # Safety
    /// `ptr` must point to a live, initialized value of the type `write` was instantiated with,
    /// exclusively borrowed for `'a`.
    pub(crate) unsafe fn new(column: &'a str, ptr: *mut u8, write: WriteSlot) -> Self {
        Self {
            column,
            ptr,
            write,
            _target: PhantomData,
        }
    }

    pub fn column(&self) -> &str {
        self.column
    }

    /// Converts `value` into the destination type and stores it, fails with
    /// [`ErrorKind::ScanFailed`] when the conversion is not possible.
    pub fn set(&mut self, value: Value) -> Result<()> {
        unsafe { (self.write)(self.ptr, value) }.map_err(|e| {
            ErrorKind::ScanFailed {
                column: self.column.into(),
                reason: format!("{e:#}"),
            }
            .into()
        })
    }
}

/// Shared reference-counted column name list.
pub type RowNames = Arc<[String]>;
/// Owned row value slice matching `RowNames` length.
pub type Row = Box<[Value]>;

/// In memory [`RowCursor`], useful to drivers that buffer results and to middlewares that
/// synthesize them.
#[derive(Debug, Clone)]
pub struct RowSet {
    labels: RowNames,
    rows: VecDeque<Row>,
    current: Option<Row>,
}

impl RowSet {
    pub fn new(labels: impl Into<RowNames>) -> Self {
        Self {
            labels: labels.into(),
            rows: VecDeque::new(),
            current: None,
        }
    }
    /// Appends a row, it must have one value per label.
    pub fn push(&mut self, row: impl Into<Row>) -> Result<&mut Self> {
        let row = row.into();
        if row.len() != self.labels.len() {
            return Err(Error::msg(format!(
                "Row has {} values but the set has {} columns",
                row.len(),
                self.labels.len()
            )));
        }
        self.rows.push_back(row);
        Ok(self)
    }
    pub fn with_row(mut self, row: impl Into<Row>) -> Result<Self> {
        self.push(row)?;
        Ok(self)
    }
    /// Rows not consumed yet.
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }
}

impl RowCursor for RowSet {
    fn column_names(&self) -> &[String] {
        &self.labels
    }
    fn advance(&mut self) -> BoxFuture<'_, Result<bool>> {
        self.current = self.rows.pop_front();
        future::ready(Ok(self.current.is_some())).boxed()
    }
    fn decode_into(&mut self, destinations: &mut [Destination<'_>]) -> Result<()> {
        let Some(row) = &self.current else {
            return Err(Error::msg("The cursor is not positioned on a row"));
        };
        if destinations.len() != row.len() {
            return Err(Error::msg(format!(
                "Expected {} destinations, got {}",
                row.len(),
                destinations.len()
            )));
        }
        for (destination, value) in destinations.iter_mut().zip(row.iter()) {
            destination.set(value.clone())?;
        }
        Ok(())
    }
    fn close(&mut self) {
        self.rows.clear();
        self.current = None;
    }
}

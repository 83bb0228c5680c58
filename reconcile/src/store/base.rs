use std::future::Future;

use crate::diff::InsertBatch;
use crate::error::ReconcileResult;
use crate::types::{Cell, TableRows};

/// Upper bound of bind parameters a single MySQL statement accepts.
pub const MAX_BIND_PARAMETERS: usize = 65_535;

/// A table whose full content can be read.
pub trait TableReader {
    /// Returns the table name used in log lines.
    fn name(&self) -> &str;

    /// Reads every row of the table exactly once.
    ///
    /// Rows are pulled from the store in batches of at most `batch_size` rows and collected
    /// into a single [`TableRows`]. A `batch_size` of zero is a configuration error.
    fn read_table(&self, batch_size: usize)
    -> impl Future<Output = ReconcileResult<TableRows>> + Send;
}

/// A table that accepts point mutations.
///
/// Every call is committed on its own; a failure leaves earlier calls applied.
pub trait TableMutator {
    /// Inserts all rows of `batch` with a single statement and returns the affected rows.
    ///
    /// Columns not listed in the batch take the store's defaults. Batches need to stay under
    /// [`MAX_BIND_PARAMETERS`] values.
    fn bulk_insert(&self, batch: &InsertBatch) -> impl Future<Output = ReconcileResult<u64>> + Send;

    /// Sets `parameters` on rows where `key_name` equals `key_value`.
    fn update_row(
        &self,
        key_name: &str,
        key_value: &Cell,
        parameters: &[(String, Cell)],
    ) -> impl Future<Output = ReconcileResult<u64>> + Send;

    /// Removes rows where `key_name` equals `key_value`.
    fn delete_row(
        &self,
        key_name: &str,
        key_value: &Cell,
    ) -> impl Future<Output = ReconcileResult<u64>> + Send;
}

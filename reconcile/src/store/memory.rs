use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::bail;
use crate::diff::InsertBatch;
use crate::error::{ErrorKind, ReconcileResult};
use crate::reconcile_error;
use crate::store::{TableMutator, TableReader};
use crate::types::{Cell, TableRow, TableRows};

#[derive(Debug)]
struct AutoIncrement {
    index: usize,
    next: u64,
}

#[derive(Debug, Default)]
struct Failures {
    read: Option<ErrorKind>,
    inserts: bool,
    keys: Vec<Cell>,
}

#[derive(Debug)]
struct Inner {
    rows: TableRows,
    auto_increment: Option<AutoIncrement>,
    failures: Failures,
}

/// In-memory table for tests and development.
///
/// Clones share the same rows, so one clone can serve as the reader and another as the
/// mutator of a destination while the test inspects a third. Failures can be injected per
/// operation or per primary key.
///
/// # Examples
///
/// ```rust
/// use reconcile::store::memory::MemoryTable;
/// use reconcile::types::Cell;
///
/// let hosts = MemoryTable::with_rows(
///     "hosts",
///     ["host_id", "hostname"],
///     vec![vec![Cell::U64(1), Cell::String("printer".to_string())]],
/// );
/// ```
#[derive(Debug, Clone)]
pub struct MemoryTable {
    name: Arc<str>,
    inner: Arc<Mutex<Inner>>,
}

impl MemoryTable {
    /// Creates an empty table with the given columns.
    pub fn new<I, S>(name: &str, column_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_rows(name, column_names, Vec::new())
    }

    /// Creates a table holding `rows`, each in column order.
    pub fn with_rows<I, S>(name: &str, column_names: I, rows: Vec<Vec<Cell>>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let column_names = column_names.into_iter().map(Into::into).collect();
        let rows = rows.into_iter().map(TableRow::new).collect();

        let inner = Inner {
            rows: TableRows::with_rows(column_names, rows),
            auto_increment: None,
            failures: Failures::default(),
        };

        Self {
            name: Arc::from(name),
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    /// Fills `column` of inserted rows with increasing integers, continuing after the largest
    /// value already present.
    pub async fn set_auto_increment(&self, column: &str) -> ReconcileResult<()> {
        let mut inner = self.inner.lock().await;
        let index = inner.rows.require_column(&self.name, column)?;

        let next = inner
            .rows
            .rows()
            .iter()
            .filter_map(|row| row.get(index).as_integer())
            .max()
            .map_or(1, |max| max.max(0) as u64 + 1);
        inner.auto_increment = Some(AutoIncrement { index, next });

        Ok(())
    }

    /// Makes every following read fail with `kind`.
    pub async fn fail_reads(&self, kind: ErrorKind) {
        self.inner.lock().await.failures.read = Some(kind);
    }

    /// Makes every following bulk insert fail.
    pub async fn fail_inserts(&self) {
        self.inner.lock().await.failures.inserts = true;
    }

    /// Makes updates and deletes addressed to `key` fail.
    pub async fn fail_mutations_for(&self, key: Cell) {
        self.inner.lock().await.failures.keys.push(key);
    }

    /// Returns a copy of the current content.
    pub async fn rows(&self) -> TableRows {
        self.inner.lock().await.rows.clone()
    }

    /// Returns the current rows as values, in insertion order.
    pub async fn values(&self) -> Vec<Vec<Cell>> {
        self.rows()
            .await
            .into_rows()
            .into_iter()
            .map(TableRow::into_values)
            .collect()
    }

    /// Appends a row directly, bypassing the mutator and injected failures.
    pub async fn push_row(&self, values: Vec<Cell>) {
        self.inner.lock().await.rows.push(TableRow::new(values));
    }
}

impl Inner {
    fn check_key(&self, key_value: &Cell) -> ReconcileResult<()> {
        if self
            .failures
            .keys
            .iter()
            .any(|failing| failing.value_eq(key_value))
        {
            bail!(
                ErrorKind::MutationFailed,
                "Injected mutation failure",
                format!("key {key_value}")
            );
        }

        Ok(())
    }

    fn mutation_column(&self, table: &str, column: &str) -> ReconcileResult<usize> {
        self.rows
            .require_column(table, column)
            .map_err(|err| err.with_kind(ErrorKind::MutationFailed))
    }
}

impl TableReader for MemoryTable {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read_table(&self, batch_size: usize) -> ReconcileResult<TableRows> {
        if batch_size == 0 {
            bail!(
                ErrorKind::ConfigError,
                "Batch size must be positive",
                format!("reading `{}` with a batch size of 0", self.name)
            );
        }

        let inner = self.inner.lock().await;
        if let Some(kind) = inner.failures.read {
            bail!(kind, "Injected read failure", format!("table `{}`", self.name));
        }

        let mut table_rows = TableRows::new(inner.rows.column_names().to_vec());
        for batch in inner.rows.rows().chunks(batch_size) {
            table_rows.extend(batch.iter().cloned());
            debug!(
                table = %self.name,
                batch_rows = batch.len(),
                total_rows = table_rows.len(),
                "read batch of rows"
            );
        }

        Ok(table_rows)
    }
}

impl TableMutator for MemoryTable {
    async fn bulk_insert(&self, batch: &InsertBatch) -> ReconcileResult<u64> {
        let mut inner = self.inner.lock().await;
        if inner.failures.inserts {
            bail!(
                ErrorKind::MutationFailed,
                "Injected insert failure",
                format!("table `{}`", self.name)
            );
        }

        let indexes = batch
            .column_names()
            .iter()
            .map(|column| inner.mutation_column(&self.name, column))
            .collect::<ReconcileResult<Vec<_>>>()?;
        let width = inner.rows.column_names().len();

        info!(table = %self.name, rows = batch.len(), "inserting rows");

        for row in batch.rows() {
            let mut values = vec![Cell::Null; width];
            if let Some(auto_increment) = inner.auto_increment.as_mut() {
                values[auto_increment.index] = Cell::U64(auto_increment.next);
                auto_increment.next += 1;
            }
            for (index, cell) in indexes.iter().zip(row.values()) {
                values[*index] = cell.clone();
            }
            inner.rows.push(TableRow::new(values));
        }

        Ok(batch.len() as u64)
    }

    async fn update_row(
        &self,
        key_name: &str,
        key_value: &Cell,
        parameters: &[(String, Cell)],
    ) -> ReconcileResult<u64> {
        let mut inner = self.inner.lock().await;
        inner.check_key(key_value)?;

        if parameters.is_empty() {
            return Err(reconcile_error!(
                ErrorKind::MutationFailed,
                "Update has no columns to set",
                format!("{key_name} = {key_value}")
            ));
        }

        let key_index = inner.mutation_column(&self.name, key_name)?;
        let assignments = parameters
            .iter()
            .map(|(column, cell)| {
                inner
                    .mutation_column(&self.name, column)
                    .map(|index| (index, cell))
            })
            .collect::<ReconcileResult<Vec<_>>>()?;

        let mut affected = 0;
        for row in inner.rows.rows_mut() {
            if !row.get(key_index).value_eq(key_value) {
                continue;
            }
            for (index, cell) in &assignments {
                row.values_mut()[*index] = (*cell).clone();
            }
            affected += 1;
        }

        Ok(affected)
    }

    async fn delete_row(&self, key_name: &str, key_value: &Cell) -> ReconcileResult<u64> {
        let mut inner = self.inner.lock().await;
        inner.check_key(key_value)?;

        let key_index = inner.mutation_column(&self.name, key_name)?;
        let before = inner.rows.len();
        inner
            .rows
            .retain(|row| !row.get(key_index).value_eq(key_value));

        Ok((before - inner.rows.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hosts() -> MemoryTable {
        MemoryTable::with_rows(
            "hosts",
            ["host_id", "hostname", "dhcp4_subnet_id"],
            vec![
                vec![Cell::U64(1), Cell::String("printer".to_string()), Cell::I64(1)],
                vec![Cell::U64(2), Cell::String("camera".to_string()), Cell::I64(1)],
            ],
        )
    }

    #[tokio::test]
    async fn reads_every_row_in_batches() {
        let table = hosts();

        let rows = table.read_table(1).await.unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows.column_names(), ["host_id", "hostname", "dhcp4_subnet_id"]);
    }

    #[tokio::test]
    async fn zero_batch_size_is_rejected() {
        let err = hosts().read_table(0).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ConfigError);
    }

    #[tokio::test]
    async fn insert_fills_defaults_and_auto_increment() {
        let table = hosts();
        table.set_auto_increment("host_id").await.unwrap();

        let mut batch = InsertBatch::new(vec!["hostname".to_string()]);
        batch.push(TableRow::new(vec![Cell::String("laptop".to_string())]));

        assert_eq!(table.bulk_insert(&batch).await.unwrap(), 1);
        assert_eq!(
            table.values().await[2],
            vec![Cell::U64(3), Cell::String("laptop".to_string()), Cell::Null]
        );
    }

    #[tokio::test]
    async fn update_and_delete_by_key() {
        let table = hosts();

        let updated = table
            .update_row(
                "host_id",
                &Cell::I64(2),
                &[("hostname".to_string(), Cell::String("doorbell".to_string()))],
            )
            .await
            .unwrap();
        assert_eq!(updated, 1);
        assert_eq!(table.values().await[1][1], Cell::String("doorbell".to_string()));

        assert_eq!(table.delete_row("host_id", &Cell::U64(1)).await.unwrap(), 1);
        assert_eq!(table.delete_row("host_id", &Cell::U64(1)).await.unwrap(), 0);
        assert_eq!(table.rows().await.len(), 1);
    }

    #[tokio::test]
    async fn unknown_columns_fail_as_mutations() {
        let err = hosts()
            .update_row(
                "host_id",
                &Cell::U64(1),
                &[("missing".to_string(), Cell::Null)],
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::MutationFailed);
    }

    #[tokio::test]
    async fn injected_failures_are_reported() {
        let table = hosts();
        table.fail_mutations_for(Cell::U64(2)).await;
        table.fail_reads(ErrorKind::ConnectionFailed).await;

        let err = table.delete_row("host_id", &Cell::U64(2)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MutationFailed);
        assert_eq!(table.delete_row("host_id", &Cell::U64(1)).await.unwrap(), 1);

        let err = table.read_table(10).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConnectionFailed);
    }
}

use crate::error::ReconcileResult;
use crate::store::{TableMutator, TableReader};
use crate::types::TableRows;

/// A readable table together with the column that joins it to its counterpart.
#[derive(Debug, Clone)]
pub struct SyncTable<R> {
    reader: R,
    join_key: String,
}

impl<R> SyncTable<R>
where
    R: TableReader,
{
    pub fn new(reader: R, join_key: impl Into<String>) -> Self {
        Self {
            reader,
            join_key: join_key.into(),
        }
    }

    pub fn name(&self) -> &str {
        self.reader.name()
    }

    pub fn join_key(&self) -> &str {
        &self.join_key
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub async fn read(&self, batch_size: usize) -> ReconcileResult<TableRows> {
        let rows = self.reader.read_table(batch_size).await?;
        rows.require_column(self.reader.name(), &self.join_key)?;

        Ok(rows)
    }
}

/// The table being reconciled: a [`SyncTable`] that also knows its primary key and can be
/// mutated.
#[derive(Debug, Clone)]
pub struct DestinationTable<R, M> {
    table: SyncTable<R>,
    primary_key: String,
    mutator: M,
}

impl<R, M> DestinationTable<R, M>
where
    R: TableReader,
    M: TableMutator,
{
    pub fn new(
        reader: R,
        mutator: M,
        join_key: impl Into<String>,
        primary_key: impl Into<String>,
    ) -> Self {
        Self {
            table: SyncTable::new(reader, join_key),
            primary_key: primary_key.into(),
            mutator,
        }
    }

    pub fn name(&self) -> &str {
        self.table.name()
    }

    pub fn join_key(&self) -> &str {
        self.table.join_key()
    }

    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    pub fn mutator(&self) -> &M {
        &self.mutator
    }

    pub async fn read(&self, batch_size: usize) -> ReconcileResult<TableRows> {
        let rows = self.table.read(batch_size).await?;
        rows.require_column(self.table.name(), &self.primary_key)?;

        Ok(rows)
    }
}

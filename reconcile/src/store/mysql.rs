use std::sync::Arc;

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use futures::TryStreamExt;
use reconcile_mysql::db::get_table_schema;
use reconcile_mysql::types::{ColumnKind, ColumnSchema, TableName, TableSchema, quote_identifier};
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, MySqlPool, QueryBuilder, Row};
use tracing::debug;

use crate::bail;
use crate::diff::InsertBatch;
use crate::error::{ErrorKind, ReconcileError, ReconcileResult};
use crate::store::{MAX_BIND_PARAMETERS, TableMutator, TableReader};
use crate::types::{Cell, TableRow, TableRows};

/// A MySQL table, readable and mutable through a shared pool.
///
/// The column list is resolved once from `information_schema` when the table is opened and
/// used for every read.
#[derive(Debug, Clone)]
pub struct MySqlTable {
    pool: MySqlPool,
    schema: Arc<TableSchema>,
    display_name: String,
}

impl MySqlTable {
    /// Resolves the columns of `table_name`.
    ///
    /// Fails with [`ErrorKind::SchemaError`] if the table does not exist.
    pub async fn open(pool: MySqlPool, table_name: TableName) -> ReconcileResult<Self> {
        let schema = get_table_schema(&pool, &table_name).await?;
        debug!(
            table = %table_name,
            columns = schema.num_columns(),
            "resolved table schema"
        );

        Ok(Self {
            pool,
            display_name: table_name.to_string(),
            schema: Arc::new(schema),
        })
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    fn quoted_table(&self) -> String {
        self.schema.name.as_quoted_identifier()
    }
}

impl TableReader for MySqlTable {
    fn name(&self) -> &str {
        &self.display_name
    }

    async fn read_table(&self, batch_size: usize) -> ReconcileResult<TableRows> {
        if batch_size == 0 {
            bail!(
                ErrorKind::ConfigError,
                "Batch size must be positive",
                format!("reading `{}` with a batch size of 0", self.display_name)
            );
        }

        let query = format!(
            "SELECT {} FROM {}",
            self.schema.quoted_column_list(),
            self.quoted_table()
        );
        let column_names = self.schema.column_names().map(str::to_string).collect();
        let mut table_rows = TableRows::new(column_names);

        let mut batches = sqlx::query(&query)
            .fetch(&self.pool)
            .try_chunks(batch_size);
        while let Some(batch) = batches
            .try_next()
            .await
            .map_err(|err| ReconcileError::from(err.1))?
        {
            for row in &batch {
                table_rows.push(decode_row(row, &self.schema)?);
            }

            debug!(
                table = %self.display_name,
                batch_rows = batch.len(),
                total_rows = table_rows.len(),
                "read batch of rows"
            );
        }

        Ok(table_rows)
    }
}

impl TableMutator for MySqlTable {
    async fn bulk_insert(&self, batch: &InsertBatch) -> ReconcileResult<u64> {
        if batch.is_empty() {
            return Ok(0);
        }

        let placeholders = batch.len() * batch.column_names().len();
        if placeholders > MAX_BIND_PARAMETERS {
            bail!(
                ErrorKind::MutationFailed,
                "Insert batch exceeds the bind parameter limit",
                format!("{placeholders} values, at most {MAX_BIND_PARAMETERS} are allowed")
            );
        }

        let columns = batch
            .column_names()
            .iter()
            .map(|column| quote_identifier(column))
            .collect::<Vec<_>>()
            .join(", ");

        let mut builder = QueryBuilder::<MySql>::new(format!(
            "INSERT INTO {} ({columns}) VALUES ",
            self.quoted_table()
        ));
        for (row_index, row) in batch.rows().iter().enumerate() {
            if row_index > 0 {
                builder.push(", ");
            }
            builder.push("(");
            for (value_index, cell) in row.values().iter().enumerate() {
                if value_index > 0 {
                    builder.push(", ");
                }
                push_cell(&mut builder, cell);
            }
            builder.push(")");
        }

        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(mutation_error)?;

        Ok(result.rows_affected())
    }

    async fn update_row(
        &self,
        key_name: &str,
        key_value: &Cell,
        parameters: &[(String, Cell)],
    ) -> ReconcileResult<u64> {
        if parameters.is_empty() {
            bail!(
                ErrorKind::MutationFailed,
                "Update has no columns to set",
                format!("{key_name} = {key_value}")
            );
        }

        let mut builder =
            QueryBuilder::<MySql>::new(format!("UPDATE {} SET ", self.quoted_table()));
        for (index, (column, cell)) in parameters.iter().enumerate() {
            if index > 0 {
                builder.push(", ");
            }
            builder.push(quote_identifier(column));
            builder.push(" = ");
            push_cell(&mut builder, cell);
        }
        builder.push(" WHERE ");
        builder.push(quote_identifier(key_name));
        builder.push(" = ");
        push_cell(&mut builder, key_value);

        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(mutation_error)?;

        Ok(result.rows_affected())
    }

    async fn delete_row(&self, key_name: &str, key_value: &Cell) -> ReconcileResult<u64> {
        let mut builder = QueryBuilder::<MySql>::new(format!(
            "DELETE FROM {} WHERE {} = ",
            self.quoted_table(),
            quote_identifier(key_name)
        ));
        push_cell(&mut builder, key_value);

        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(mutation_error)?;

        Ok(result.rows_affected())
    }
}

fn mutation_error(err: sqlx::Error) -> ReconcileError {
    ReconcileError::from(err).with_kind(ErrorKind::MutationFailed)
}

/// Binds `cell` as the next placeholder of `builder`.
fn push_cell(builder: &mut QueryBuilder<'_, MySql>, cell: &Cell) {
    match cell {
        Cell::Null => builder.push_bind(Option::<String>::None),
        Cell::Bool(value) => builder.push_bind(*value),
        Cell::I64(value) => builder.push_bind(*value),
        Cell::U64(value) => builder.push_bind(*value),
        Cell::F64(value) => builder.push_bind(*value),
        Cell::Numeric(value) => builder.push_bind(value.clone()),
        Cell::String(value) => builder.push_bind(value.clone()),
        Cell::Bytes(value) => builder.push_bind(value.clone()),
        Cell::Date(value) => builder.push_bind(*value),
        Cell::Time(value) => builder.push_bind(*value),
        Cell::Timestamp(value) => builder.push_bind(*value),
        Cell::Json(value) => builder.push_bind(sqlx::types::Json(value.clone())),
    };
}

fn decode_row(row: &MySqlRow, schema: &TableSchema) -> ReconcileResult<TableRow> {
    let mut values = Vec::with_capacity(schema.num_columns());
    for (index, column) in schema.column_schemas.iter().enumerate() {
        values.push(decode_cell(row, index, column)?);
    }

    Ok(TableRow::new(values))
}

/// Decodes one value according to the declared type of its column.
///
/// Text and unknown types are read without sqlx's type check, which refuses the wire types of
/// `ENUM`, `SET` and `YEAR` columns.
fn decode_cell(row: &MySqlRow, index: usize, column: &ColumnSchema) -> ReconcileResult<Cell> {
    let cell = match column.kind() {
        ColumnKind::SignedInteger => row.try_get::<Option<i64>, _>(index)?.map(Cell::I64),
        ColumnKind::UnsignedInteger => row.try_get::<Option<u64>, _>(index)?.map(Cell::U64),
        ColumnKind::Float => row
            .try_get::<Option<f32>, _>(index)?
            .map(|value| Cell::F64(f64::from(value))),
        ColumnKind::Double => row.try_get::<Option<f64>, _>(index)?.map(Cell::F64),
        ColumnKind::Decimal => row
            .try_get::<Option<BigDecimal>, _>(index)?
            .map(Cell::Numeric),
        ColumnKind::Text => row
            .try_get_unchecked::<Option<String>, _>(index)?
            .map(Cell::String),
        ColumnKind::Binary => row.try_get::<Option<Vec<u8>>, _>(index)?.map(Cell::Bytes),
        ColumnKind::Date => row.try_get::<Option<NaiveDate>, _>(index)?.map(Cell::Date),
        ColumnKind::Time => row.try_get::<Option<NaiveTime>, _>(index)?.map(Cell::Time),
        ColumnKind::DateTime => row
            .try_get::<Option<NaiveDateTime>, _>(index)?
            .map(Cell::Timestamp),
        ColumnKind::Json => row
            .try_get::<Option<serde_json::Value>, _>(index)?
            .map(Cell::Json),
        ColumnKind::Other => row
            .try_get_unchecked::<Option<Vec<u8>>, _>(index)?
            .map(Cell::Bytes),
    };

    Ok(cell.unwrap_or(Cell::Null))
}

use std::time::Duration;

use reconcile_config::shared::{IntoConnectOptions, MySqlConnectionConfig};
use sqlx::{MySqlPool, Row, mysql::MySqlPoolOptions};
use thiserror::Error;
use tracing::debug;

use crate::types::{ColumnSchema, TableName, TableSchema};

/// How long pool acquisition waits for a connection before giving up.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur during table lookups.
#[derive(Debug, Error)]
pub enum TableLookupError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Table {0} not found")]
    TableNotFound(TableName),
}

/// Connects to a MySQL database with a single-connection pool.
///
/// A reconciliation pass issues one statement at a time, so one connection per side is all it
/// uses. The pool is created eagerly so an unreachable server fails here and not mid-run.
pub async fn connect_to_database(config: &MySqlConnectionConfig) -> Result<MySqlPool, sqlx::Error> {
    let options = config.with_db();

    let pool = MySqlPoolOptions::new()
        .min_connections(1)
        .max_connections(1)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect_with(options)
        .await?;

    debug!(host = %config.host, database = %config.name, "connected to mysql");

    Ok(pool)
}

/// Loads the column metadata of a table from `information_schema.columns`.
///
/// Returns [`TableLookupError::TableNotFound`] when the table has no columns visible to the
/// connected user, which is how MySQL reports a missing table there.
pub async fn get_table_schema(
    pool: &MySqlPool,
    table_name: &TableName,
) -> Result<TableSchema, TableLookupError> {
    // Aliases are needed because MySQL 8 returns information_schema labels in upper case.
    let query = "
        SELECT
            column_name AS name,
            data_type AS data_type,
            column_type AS column_type,
            is_nullable AS is_nullable,
            column_key AS column_key
        FROM information_schema.columns
        WHERE table_schema = ?
        AND table_name = ?
        ORDER BY ordinal_position
    ";

    let rows = sqlx::query(query)
        .bind(&table_name.schema)
        .bind(&table_name.name)
        .fetch_all(pool)
        .await?;

    if rows.is_empty() {
        return Err(TableLookupError::TableNotFound(table_name.clone()));
    }

    let mut column_schemas = Vec::with_capacity(rows.len());
    for row in rows {
        let name: String = row.try_get("name")?;
        let data_type: String = row.try_get("data_type")?;
        let column_type: String = row.try_get("column_type")?;
        let is_nullable: String = row.try_get("is_nullable")?;
        let column_key: String = row.try_get("column_key")?;

        column_schemas.push(ColumnSchema::new(
            name,
            data_type,
            column_type,
            is_nullable.eq_ignore_ascii_case("YES"),
            column_key.eq_ignore_ascii_case("PRI"),
        ));
    }

    Ok(TableSchema::new(table_name.clone(), column_schemas))
}

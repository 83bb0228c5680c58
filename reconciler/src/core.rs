use reconcile::pipeline::{ReconcilePipeline, RunReport};
use reconcile::store::mysql::MySqlTable;
use reconcile::store::{DestinationTable, SyncTable};
use reconcile_config::shared::{
    DestinationTableConfig, MySqlConnectionConfig, ReconcilerConfig, SourceTableConfig,
    SyncConfig,
};
use reconcile_mysql::db::connect_to_database;
use reconcile_mysql::types::TableName;
use tracing::{debug, info};

use crate::error::{ReconcilerError, ReconcilerResult};

/// Connects to both databases and runs one reconciliation pass.
///
/// Returns [`ReconcilerError::Incomplete`] when the run finished but some statements failed.
pub async fn run_reconciler_with_config(config: ReconcilerConfig) -> ReconcilerResult<RunReport> {
    info!("starting reconciler");

    log_config(&config);

    let source_pool = connect_to_database(&config.source.connection).await?;
    let destination_pool = connect_to_database(&config.destination.connection).await?;

    let source_table = MySqlTable::open(
        source_pool,
        table_name(&config.source.connection, &config.source.table),
    )
    .await?;
    let destination_table = MySqlTable::open(
        destination_pool,
        table_name(&config.destination.connection, &config.destination.table),
    )
    .await?;

    // One pool serves the destination reads and every mutation phase.
    let source = SyncTable::new(source_table, config.source.join_key);
    let destination = DestinationTable::new(
        destination_table.clone(),
        destination_table,
        config.destination.join_key,
        config.destination.primary_key,
    );

    let pipeline = ReconcilePipeline::new(source, destination, config.sync);
    let report = pipeline.run().await?;

    info!(
        inserted = report.insert.applied,
        updated = report.update.applied,
        deleted = report.delete.applied,
        unchanged = report.unchanged,
        identifier_drift = report.identifier_drift,
        skipped = report.skipped(),
        failed = report.failed(),
        dry_run = report.dry_run,
        "reconciler completed"
    );

    if report.failed() > 0 {
        return Err(ReconcilerError::Incomplete(report));
    }

    Ok(report)
}

/// Tables are looked up in the database the connection points at, unless the name is
/// qualified as `schema.table`.
fn table_name(connection: &MySqlConnectionConfig, table: &str) -> TableName {
    match table.split_once('.') {
        Some((schema, name)) => TableName::new(schema, name),
        None => TableName::new(connection.name.clone(), table),
    }
}

fn log_config(config: &ReconcilerConfig) {
    log_source_config(&config.source);
    log_destination_config(&config.destination);
    log_sync_config(&config.sync);
}

fn log_source_config(config: &SourceTableConfig) {
    debug!(
        table = config.table,
        join_key = config.join_key,
        "source table config"
    );
    log_connection_config("source", &config.connection);
}

fn log_destination_config(config: &DestinationTableConfig) {
    debug!(
        table = config.table,
        join_key = config.join_key,
        primary_key = config.primary_key,
        "destination table config"
    );
    log_connection_config("destination", &config.connection);
}

fn log_connection_config(side: &str, config: &MySqlConnectionConfig) {
    debug!(
        side,
        host = config.host,
        port = config.port,
        dbname = config.name,
        username = config.username,
        tls_enabled = config.tls.enabled,
        "mysql connection config",
    );
}

fn log_sync_config(config: &SyncConfig) {
    debug!(
        column_mappings = ?config.column_mappings,
        transcoding = ?config.transcoding,
        constant_mappings = ?config.constant_mappings,
        batch_max_size = config.batch.max_size,
        dry_run = config.dry_run,
        "sync config"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use reconcile_config::shared::TlsConfig;

    fn connection() -> MySqlConnectionConfig {
        MySqlConnectionConfig {
            host: "localhost".to_string(),
            port: 3306,
            name: "kea".to_string(),
            username: "kea".to_string(),
            password: None,
            tls: TlsConfig::disabled(),
        }
    }

    #[test]
    fn unqualified_tables_live_in_the_connection_database() {
        assert_eq!(table_name(&connection(), "hosts"), TableName::new("kea", "hosts"));
    }

    #[test]
    fn qualified_tables_keep_their_schema() {
        assert_eq!(
            table_name(&connection(), "inventory.assets"),
            TableName::new("inventory", "assets")
        );
    }
}

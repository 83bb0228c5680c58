use reconcile_config::shared::{IntoConnectOptions, MySqlConnectionConfig};
use sqlx::mysql::MySqlConnectOptions;
use sqlx::{ConnectOptions, Executor, MySqlPool};

use crate::types::quote_identifier;

/// Creates the database named in `config` and returns a pool connected to it.
///
/// # Panics
/// Panics if connection or database creation fails.
pub async fn create_mysql_database(config: &MySqlConnectionConfig) -> MySqlPool {
    let server_options: MySqlConnectOptions = config.without_db();
    let mut connection = server_options
        .connect()
        .await
        .expect("Failed to connect to MySQL");

    connection
        .execute(&*format!(
            "CREATE DATABASE {}",
            quote_identifier(&config.name)
        ))
        .await
        .expect("Failed to create database");

    let database_options: MySqlConnectOptions = config.with_db();
    MySqlPool::connect_with(database_options)
        .await
        .expect("Failed to connect to MySQL database")
}

/// Drops the database named in `config` if it exists.
///
/// # Panics
/// Panics if any database operation fails.
pub async fn drop_mysql_database(config: &MySqlConnectionConfig) {
    let server_options: MySqlConnectOptions = config.without_db();
    let mut connection = server_options
        .connect()
        .await
        .expect("Failed to connect to MySQL");

    connection
        .execute(&*format!(
            "DROP DATABASE IF EXISTS {}",
            quote_identifier(&config.name)
        ))
        .await
        .expect("Failed to destroy database");
}

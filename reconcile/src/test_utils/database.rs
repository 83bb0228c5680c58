use reconcile_config::shared::{MySqlConnectionConfig, TlsConfig};
use reconcile_mysql::sqlx::test_utils::{create_mysql_database, drop_mysql_database};
use reconcile_mysql::types::TableName;
use sqlx::MySqlPool;
use uuid::Uuid;

/// Generates connection configuration for an isolated database on a local MySQL server.
///
/// Every call yields a new database name. The server is read from environment variables:
/// - `TESTS_DATABASE_HOST`: MySQL server hostname (required)
/// - `TESTS_DATABASE_PORT`: MySQL server port (required)
/// - `TESTS_DATABASE_USERNAME`: Database user (required)
/// - `TESTS_DATABASE_PASSWORD`: Database password (optional)
pub fn local_mysql_connection_config() -> MySqlConnectionConfig {
    MySqlConnectionConfig {
        host: std::env::var("TESTS_DATABASE_HOST").expect("TESTS_DATABASE_HOST must be set"),
        port: std::env::var("TESTS_DATABASE_PORT")
            .expect("TESTS_DATABASE_PORT must be set")
            .parse()
            .expect("TESTS_DATABASE_PORT must be a valid port number"),
        name: format!("reconcile_test_{}", Uuid::new_v4().simple()),
        username: std::env::var("TESTS_DATABASE_USERNAME")
            .expect("TESTS_DATABASE_USERNAME must be set"),
        password: std::env::var("TESTS_DATABASE_PASSWORD")
            .ok()
            .map(Into::into),
        tls: TlsConfig::disabled(),
    }
}

/// A database created for one test.
///
/// Call [`MySqlDatabase::drop_database`] at the end of the test to remove it.
#[derive(Debug)]
pub struct MySqlDatabase {
    pub config: MySqlConnectionConfig,
    pub pool: MySqlPool,
}

impl MySqlDatabase {
    pub async fn spawn() -> Self {
        let config = local_mysql_connection_config();
        let pool = create_mysql_database(&config).await;

        Self { config, pool }
    }

    /// Returns the name of `table` inside this database.
    pub fn table_name(&self, table: &str) -> TableName {
        TableName::new(self.config.name.clone(), table)
    }

    /// Runs a statement, typically DDL or fixture rows.
    ///
    /// # Panics
    /// Panics if the statement fails.
    pub async fn execute(&self, statement: &str) {
        sqlx::query(statement)
            .execute(&self.pool)
            .await
            .expect("Failed to execute test statement");
    }

    pub async fn drop_database(self) {
        self.pool.close().await;
        drop_mysql_database(&self.config).await;
    }
}

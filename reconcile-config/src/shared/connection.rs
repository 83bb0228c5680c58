use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sqlx::mysql::{MySqlConnectOptions, MySqlSslMode};

use crate::shared::ValidationError;

const DEFAULT_MYSQL_PORT: u16 = 3306;

/// Character set requested on every connection so text columns compare byte-for-byte.
const CONNECTION_CHARSET: &str = "utf8mb4";

/// Connection settings for one MySQL server.
///
/// Does not implement [`Serialize`]: use [`MySqlConnectionConfigWithoutSecrets`] for anything
/// that ends up in logs.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MySqlConnectionConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Database (schema) name.
    pub name: String,
    pub username: String,
    pub password: Option<SecretString>,
    #[serde(default)]
    pub tls: TlsConfig,
}

impl MySqlConnectionConfig {
    pub fn validate(&self, prefix: &str) -> Result<(), ValidationError> {
        if self.host.trim().is_empty() {
            return Err(ValidationError::EmptyField(format!("{prefix}.host")));
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyField(format!("{prefix}.name")));
        }
        if self.username.trim().is_empty() {
            return Err(ValidationError::EmptyField(format!("{prefix}.username")));
        }

        self.tls.validate()
    }
}

/// [`MySqlConnectionConfig`] with the password removed. Safe to serialize.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MySqlConnectionConfigWithoutSecrets {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub username: String,
    pub tls_enabled: bool,
}

impl From<MySqlConnectionConfig> for MySqlConnectionConfigWithoutSecrets {
    fn from(value: MySqlConnectionConfig) -> Self {
        MySqlConnectionConfigWithoutSecrets {
            host: value.host,
            port: value.port,
            name: value.name,
            username: value.username,
            tls_enabled: value.tls.enabled,
        }
    }
}

/// TLS settings for a MySQL connection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct TlsConfig {
    /// PEM-encoded CA certificates used to verify the server.
    #[serde(default)]
    pub trusted_root_certs: String,
    #[serde(default)]
    pub enabled: bool,
}

impl TlsConfig {
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Returns [`ValidationError::MissingTrustedRootCerts`] if TLS is enabled without certificates.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.enabled && self.trusted_root_certs.is_empty() {
            return Err(ValidationError::MissingTrustedRootCerts);
        }

        Ok(())
    }
}

/// Converts the connection config into driver-specific connect options.
pub trait IntoConnectOptions<Output> {
    /// Options for the server without selecting a database, used for administrative statements.
    fn without_db(&self) -> Output;

    /// Options for the configured database.
    fn with_db(&self) -> Output;
}

impl IntoConnectOptions<MySqlConnectOptions> for MySqlConnectionConfig {
    fn without_db(&self) -> MySqlConnectOptions {
        let mut options = MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.username)
            .charset(CONNECTION_CHARSET);

        if let Some(password) = &self.password {
            options = options.password(password.expose_secret());
        }

        if self.tls.enabled {
            options = options
                .ssl_mode(MySqlSslMode::VerifyIdentity)
                .ssl_ca_from_pem(self.tls.trusted_root_certs.clone().into_bytes());
        } else {
            options = options.ssl_mode(MySqlSslMode::Preferred);
        }

        options
    }

    fn with_db(&self) -> MySqlConnectOptions {
        let options: MySqlConnectOptions = self.without_db();
        options.database(&self.name)
    }
}

fn default_port() -> u16 {
    DEFAULT_MYSQL_PORT
}

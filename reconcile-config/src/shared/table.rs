use serde::{Deserialize, Serialize};

use crate::shared::{MySqlConnectionConfig, MySqlConnectionConfigWithoutSecrets, ValidationError};

/// The table rows are read from.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SourceTableConfig {
    pub connection: MySqlConnectionConfig,
    pub table: String,
    /// Column identifying the same entity in the destination table.
    pub join_key: String,
}

impl SourceTableConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.connection.validate("source.connection")?;
        require_non_empty(&self.table, "source.table")?;
        require_non_empty(&self.join_key, "source.join_key")
    }
}

/// The table that is made to mirror the source.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DestinationTableConfig {
    pub connection: MySqlConnectionConfig,
    pub table: String,
    pub join_key: String,
    /// Column used in the `WHERE` clause of updates and deletes.
    pub primary_key: String,
}

impl DestinationTableConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.connection.validate("destination.connection")?;
        require_non_empty(&self.table, "destination.table")?;
        require_non_empty(&self.join_key, "destination.join_key")?;
        require_non_empty(&self.primary_key, "destination.primary_key")?;

        if self.join_key == self.primary_key {
            return Err(ValidationError::PrimaryKeyIsJoinKey(self.primary_key.clone()));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceTableConfigWithoutSecrets {
    pub connection: MySqlConnectionConfigWithoutSecrets,
    pub table: String,
    pub join_key: String,
}

impl From<SourceTableConfig> for SourceTableConfigWithoutSecrets {
    fn from(value: SourceTableConfig) -> Self {
        SourceTableConfigWithoutSecrets {
            connection: value.connection.into(),
            table: value.table,
            join_key: value.join_key,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationTableConfigWithoutSecrets {
    pub connection: MySqlConnectionConfigWithoutSecrets,
    pub table: String,
    pub join_key: String,
    pub primary_key: String,
}

impl From<DestinationTableConfig> for DestinationTableConfigWithoutSecrets {
    fn from(value: DestinationTableConfig) -> Self {
        DestinationTableConfigWithoutSecrets {
            connection: value.connection.into(),
            table: value.table,
            join_key: value.join_key,
            primary_key: value.primary_key,
        }
    }
}

fn require_non_empty(value: &str, field: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(field.to_string()));
    }

    Ok(())
}

use serde::{Deserialize, Serialize};

use crate::shared::{
    DestinationTableConfig, DestinationTableConfigWithoutSecrets, SourceTableConfig,
    SourceTableConfigWithoutSecrets, SyncConfig, ValidationError,
};

/// Complete configuration of one reconciliation run.
///
/// This intentionally does not implement [`Serialize`] to avoid leaking passwords.
#[derive(Debug, Clone, Deserialize)]
pub struct ReconcilerConfig {
    pub source: SourceTableConfig,
    pub destination: DestinationTableConfig,
    pub sync: SyncConfig,
}

impl ReconcilerConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.source.validate()?;
        self.destination.validate()?;
        self.sync.validate(&self.destination.primary_key)
    }
}

/// Same as [`ReconcilerConfig`] but without secrets, safe to serialize.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcilerConfigWithoutSecrets {
    pub source: SourceTableConfigWithoutSecrets,
    pub destination: DestinationTableConfigWithoutSecrets,
    pub sync: SyncConfig,
}

impl From<ReconcilerConfig> for ReconcilerConfigWithoutSecrets {
    fn from(value: ReconcilerConfig) -> Self {
        ReconcilerConfigWithoutSecrets {
            source: value.source.into(),
            destination: value.destination.into(),
            sync: value.sync,
        }
    }
}

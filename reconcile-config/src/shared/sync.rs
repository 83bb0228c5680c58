use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::shared::{BatchConfig, ValidationError};

/// Storage encoding of a destination column whose source holds a human-readable form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transcoding {
    /// Dotted-quad string in the source, unsigned 32-bit integer in the destination.
    Ipv4,
    /// Colon-separated hex string in the source, 6 raw bytes in the destination.
    ///
    /// Columns with this encoding are identifiers and are never rewritten by updates.
    Mac,
}

/// Transcoded columns of the DHCP host reservation schema this tool was built for.
pub fn default_transcoding() -> BTreeMap<String, Transcoding> {
    BTreeMap::from([
        ("ipv4_address".to_string(), Transcoding::Ipv4),
        ("dhcp_identifier".to_string(), Transcoding::Mac),
    ])
}

/// How source rows are projected onto destination rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SyncConfig {
    /// Source column name to destination column name.
    pub column_mappings: BTreeMap<String, String>,
    /// Destination column name to its storage encoding.
    #[serde(default = "default_transcoding")]
    pub transcoding: BTreeMap<String, Transcoding>,
    /// Literal values written into destination columns of inserted rows.
    #[serde(default)]
    pub constant_mappings: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub batch: BatchConfig,
    /// Computes and logs the diff without touching the destination.
    #[serde(default)]
    pub dry_run: bool,
}

impl SyncConfig {
    pub fn transcoding_for(&self, destination_column: &str) -> Option<Transcoding> {
        self.transcoding.get(destination_column).copied()
    }

    /// Validates the mapping against the destination primary key.
    pub fn validate(&self, primary_key: &str) -> Result<(), ValidationError> {
        if self.column_mappings.is_empty() {
            return Err(ValidationError::EmptyColumnMappings);
        }

        let mut targets = BTreeSet::new();
        for (source_column, destination_column) in &self.column_mappings {
            if source_column.trim().is_empty() || destination_column.trim().is_empty() {
                return Err(ValidationError::EmptyField(
                    "sync.column_mappings".to_string(),
                ));
            }
            if !targets.insert(destination_column.as_str()) {
                return Err(ValidationError::DuplicateDestinationColumn(
                    destination_column.clone(),
                ));
            }
        }

        if targets.contains(primary_key) || self.constant_mappings.contains_key(primary_key) {
            return Err(ValidationError::PrimaryKeyWritten(primary_key.to_string()));
        }

        if self.transcoding.keys().any(|column| column.trim().is_empty()) {
            return Err(ValidationError::EmptyField("sync.transcoding".to_string()));
        }
        if self.transcoding.contains_key(primary_key) {
            return Err(ValidationError::PrimaryKeyTranscoded(primary_key.to_string()));
        }

        if let Some(column) = self
            .constant_mappings
            .keys()
            .find(|column| targets.contains(column.as_str()))
        {
            return Err(ValidationError::ConstantShadowsMapping(column.clone()));
        }

        self.batch.validate()
    }
}

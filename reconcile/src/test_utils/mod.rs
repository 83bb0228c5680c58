//! Helpers for tests of the reconciler, in this crate and in `tests/`.
//!
//! [`hosts`] holds a small inventory-to-DHCP fixture: an `assets` source table with readable
//! MAC and IPv4 strings and a `hosts` destination table storing them as bytes and integers.
//! [`pipeline`] assembles [`crate::pipeline::ReconcilePipeline`]s over
//! [`crate::store::memory::MemoryTable`]s. [`database`] creates throwaway MySQL databases for
//! tests of [`crate::store::mysql::MySqlTable`].

use std::collections::BTreeMap;

use reconcile_config::shared::{BatchConfig, SyncConfig, default_transcoding};

use crate::types::{Cell, TableRow, TableRows};

#[cfg(feature = "test-utils")]
pub mod database;
pub mod hosts;
pub mod pipeline;

/// Builds a [`SyncConfig`] with the given source to destination mappings and defaults for the
/// rest.
pub fn sync_config(mappings: &[(&str, &str)]) -> SyncConfig {
    SyncConfig {
        column_mappings: mappings
            .iter()
            .map(|(source, destination)| (source.to_string(), destination.to_string()))
            .collect(),
        transcoding: default_transcoding(),
        constant_mappings: BTreeMap::new(),
        batch: BatchConfig::default(),
        dry_run: false,
    }
}

pub fn text(value: &str) -> Cell {
    Cell::String(value.to_string())
}

/// Builds a [`TableRows`] from column names and rows of values.
pub fn table_rows(column_names: &[&str], rows: Vec<Vec<Cell>>) -> TableRows {
    TableRows::with_rows(
        column_names.iter().map(|column| column.to_string()).collect(),
        rows.into_iter().map(TableRow::new).collect(),
    )
}

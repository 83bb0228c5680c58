use reconcile_config::shared::SyncConfig;

use crate::pipeline::ReconcilePipeline;
use crate::store::memory::MemoryTable;
use crate::store::{DestinationTable, SyncTable};
use crate::test_utils::hosts::hosts_sync_config;

/// A pipeline whose source, destination reader and destination mutator all live in memory.
pub type MemoryPipeline = ReconcilePipeline<MemoryTable, MemoryTable, MemoryTable>;

/// Builder for [`MemoryPipeline`]s.
///
/// Keys default to the hosts fixture: `mac` in the source, `dhcp_identifier` in the
/// destination and `host_id` as primary key.
///
/// ```ignore
/// let pipeline = PipelineBuilder::new(source.clone(), destination.clone())
///     .with_sync_config(sync_config(&[("id", "id"), ("name", "name")]))
///     .with_join_keys("id", "id")
///     .with_primary_key("pk")
///     .build();
/// ```
#[derive(Debug)]
pub struct PipelineBuilder {
    source: MemoryTable,
    destination: MemoryTable,
    source_join_key: String,
    destination_join_key: String,
    primary_key: String,
    sync: SyncConfig,
}

impl PipelineBuilder {
    pub fn new(source: MemoryTable, destination: MemoryTable) -> Self {
        Self {
            source,
            destination,
            source_join_key: "mac".to_string(),
            destination_join_key: "dhcp_identifier".to_string(),
            primary_key: "host_id".to_string(),
            sync: hosts_sync_config(),
        }
    }

    pub fn with_sync_config(mut self, sync: SyncConfig) -> Self {
        self.sync = sync;
        self
    }

    pub fn with_join_keys(mut self, source: &str, destination: &str) -> Self {
        self.source_join_key = source.to_string();
        self.destination_join_key = destination.to_string();
        self
    }

    pub fn with_primary_key(mut self, primary_key: &str) -> Self {
        self.primary_key = primary_key.to_string();
        self
    }

    pub fn with_dry_run(mut self) -> Self {
        self.sync.dry_run = true;
        self
    }

    pub fn with_batch_size(mut self, max_size: usize) -> Self {
        self.sync.batch.max_size = max_size;
        self
    }

    /// Builds the pipeline. The destination table serves as both reader and mutator.
    pub fn build(self) -> MemoryPipeline {
        let source = SyncTable::new(self.source, self.source_join_key);
        let destination = DestinationTable::new(
            self.destination.clone(),
            self.destination,
            self.destination_join_key,
            self.primary_key,
        );

        ReconcilePipeline::new(source, destination, self.sync)
    }
}

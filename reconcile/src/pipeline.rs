//! One reconciliation pass from a source table onto a destination table.

use reconcile_config::shared::SyncConfig;
use tracing::{error, info, warn};

use crate::apply::{BranchOutcome, apply_deletes, apply_inserts, apply_updates};
use crate::conversions::transcode::decode_columns;
use crate::diff::{Branch, DiffSets, Differ};
use crate::error::ReconcileResult;
use crate::store::{DestinationTable, SyncTable, TableMutator, TableReader};
use crate::types::describe_row;

/// Outcome of [`ReconcilePipeline::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunReport {
    pub insert: BranchOutcome,
    pub update: BranchOutcome,
    pub delete: BranchOutcome,
    /// Matched rows that needed no change.
    pub unchanged: usize,
    /// Matched rows differing only in columns updates never write.
    pub identifier_drift: usize,
    /// Whether the sets were only computed and logged.
    pub dry_run: bool,
}

impl RunReport {
    /// Returns the number of rows whose statement failed, over all branches.
    pub fn failed(&self) -> usize {
        self.insert.failed + self.update.failed + self.delete.failed
    }

    /// Returns the number of rows left out because of malformed values, over all branches.
    pub fn skipped(&self) -> usize {
        self.insert.skipped + self.update.skipped + self.delete.skipped
    }
}

/// Reads both tables, diffs them and applies the result to the destination.
///
/// Reads and diffs abort the run on error; mutations never do. Each mutation is committed on
/// its own, so a run that stops half way leaves the destination partially reconciled and the
/// next run picks up the rest.
#[derive(Debug)]
pub struct ReconcilePipeline<S, D, M> {
    source: SyncTable<S>,
    destination: DestinationTable<D, M>,
    sync: SyncConfig,
}

impl<S, D, M> ReconcilePipeline<S, D, M>
where
    S: TableReader,
    D: TableReader,
    M: TableMutator,
{
    pub fn new(source: SyncTable<S>, destination: DestinationTable<D, M>, sync: SyncConfig) -> Self {
        Self {
            source,
            destination,
            sync,
        }
    }

    pub fn sync_config(&self) -> &SyncConfig {
        &self.sync
    }

    /// Reads both tables and computes what a run would change.
    pub async fn plan(&self) -> ReconcileResult<DiffSets> {
        let batch_size = self.sync.batch.max_size;

        let source_rows = self.source.read(batch_size).await?;
        info!(
            table = self.source.name(),
            rows = source_rows.len(),
            "read source table"
        );

        let mut destination_rows = self.destination.read(batch_size).await?;
        info!(
            table = self.destination.name(),
            rows = destination_rows.len(),
            "read destination table"
        );

        decode_columns(&mut destination_rows, &self.sync.transcoding);

        Differ::new(
            &self.sync,
            self.source.join_key(),
            self.destination.join_key(),
            self.destination.primary_key(),
        )
        .diff(&source_rows, &destination_rows)
    }

    /// Runs one full reconciliation pass.
    ///
    /// Branches are applied in the order inserts, updates, deletes. Failed statements are
    /// counted in the returned [`RunReport`], not returned as errors.
    pub async fn run(&self) -> ReconcileResult<RunReport> {
        info!(
            source = self.source.name(),
            destination = self.destination.name(),
            dry_run = self.sync.dry_run,
            "starting reconciliation"
        );

        let sets = self.plan().await?;
        info!(
            inserts = sets.inserts.len(),
            updates = sets.updates.len(),
            deletes = sets.deletes.len(),
            unchanged = sets.unchanged,
            identifier_drift = sets.identifier_drift,
            skipped = sets.skipped.len(),
            "computed diff"
        );

        let report = if self.sync.dry_run {
            self.report_plan(&sets)
        } else {
            self.apply(&sets).await
        };

        if report.failed() > 0 {
            error!(
                failed = report.failed(),
                skipped = report.skipped(),
                "reconciliation finished with failures"
            );
        } else if report.skipped() > 0 {
            warn!(
                skipped = report.skipped(),
                "reconciliation finished with skipped rows"
            );
        } else {
            info!("reconciliation finished");
        }

        Ok(report)
    }

    async fn apply(&self, sets: &DiffSets) -> RunReport {
        let mutator = self.destination.mutator();
        let primary_key = self.destination.primary_key();

        let insert_skipped = sets.skipped_in(Branch::Insert);
        let insert = if sets.inserts.is_empty() {
            info!("{} | no data to insert", Branch::Insert);
            BranchOutcome::planned(0, insert_skipped)
        } else {
            let outcome = apply_inserts(
                mutator,
                &sets.inserts,
                self.sync.batch.max_size,
                insert_skipped,
            )
            .await;
            log_outcome(Branch::Insert, &outcome);
            outcome
        };

        let update_skipped = sets.skipped_in(Branch::Update);
        let update = if sets.updates.is_empty() {
            info!("{} | no data to update", Branch::Update);
            BranchOutcome::planned(0, update_skipped)
        } else {
            let outcome = apply_updates(mutator, primary_key, &sets.updates, update_skipped).await;
            log_outcome(Branch::Update, &outcome);
            outcome
        };

        let delete_skipped = sets.skipped_in(Branch::Delete);
        let delete = if sets.deletes.is_empty() {
            info!("{} | no data to delete", Branch::Delete);
            BranchOutcome::planned(0, delete_skipped)
        } else {
            let outcome = apply_deletes(mutator, primary_key, &sets.deletes, delete_skipped).await;
            log_outcome(Branch::Delete, &outcome);
            outcome
        };

        RunReport {
            insert,
            update,
            delete,
            unchanged: sets.unchanged,
            identifier_drift: sets.identifier_drift,
            dry_run: false,
        }
    }

    fn report_plan(&self, sets: &DiffSets) -> RunReport {
        for row in sets.inserts.rows() {
            info!(
                row = %describe_row(sets.inserts.column_names(), row),
                "{} | would insert",
                Branch::Insert
            );
        }
        for update in &sets.updates {
            info!(
                key = %update.key,
                changed = ?update.changed_columns,
                "{} | would update",
                Branch::Update
            );
        }
        for delete in &sets.deletes {
            info!(
                key = %delete.key,
                row = %delete.description,
                "{} | would delete",
                Branch::Delete
            );
        }

        RunReport {
            insert: BranchOutcome::planned(sets.inserts.len(), sets.skipped_in(Branch::Insert)),
            update: BranchOutcome::planned(sets.updates.len(), sets.skipped_in(Branch::Update)),
            delete: BranchOutcome::planned(sets.deletes.len(), sets.skipped_in(Branch::Delete)),
            unchanged: sets.unchanged,
            identifier_drift: sets.identifier_drift,
            dry_run: true,
        }
    }
}

fn log_outcome(branch: Branch, outcome: &BranchOutcome) {
    if outcome.failed > 0 {
        error!(
            planned = outcome.planned,
            applied = outcome.applied,
            failed = outcome.failed,
            "{branch} | finished with failures"
        );
    } else {
        info!(
            planned = outcome.planned,
            applied = outcome.applied,
            "{branch} | finished"
        );
    }
}

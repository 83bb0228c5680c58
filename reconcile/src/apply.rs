//! Application of the diff sets to the destination.
//!
//! Each branch runs its statements one after the other in diff order. A failed statement is
//! logged with its payload and counted; the branch carries on with the next one.

use tracing::{error, info, warn};

use crate::diff::{Branch, InsertBatch, RowDelete, RowUpdate};
use crate::store::{MAX_BIND_PARAMETERS, TableMutator};
use crate::types::{Cell, describe_row};

/// What happened to the rows of one branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BranchOutcome {
    /// Rows the diff assigned to the branch.
    pub planned: usize,
    /// Rows whose statement succeeded.
    pub applied: usize,
    /// Rows whose statement failed.
    pub failed: usize,
    /// Rows the diff left out because of malformed values.
    pub skipped: usize,
}

impl BranchOutcome {
    /// An outcome where nothing was executed.
    pub fn planned(planned: usize, skipped: usize) -> Self {
        Self {
            planned,
            skipped,
            ..Self::default()
        }
    }

    /// Returns `true` if every planned row was applied and none was skipped.
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.skipped == 0 && self.applied == self.planned
    }
}

/// Returns how many rows of `column_count` columns fit into one insert statement.
pub fn rows_per_insert(column_count: usize, max_batch_size: usize) -> usize {
    let by_parameters = MAX_BIND_PARAMETERS / column_count.max(1);
    by_parameters.min(max_batch_size).max(1)
}

/// Appends `batch` to the destination in statements of at most `max_batch_size` rows.
///
/// A failed statement fails all of its rows; later statements are still executed.
pub async fn apply_inserts<M>(
    mutator: &M,
    batch: &InsertBatch,
    max_batch_size: usize,
    skipped: usize,
) -> BranchOutcome
where
    M: TableMutator,
{
    let mut outcome = BranchOutcome::planned(batch.len(), skipped);
    let total = batch.len();
    let rows_per_statement = rows_per_insert(batch.column_names().len(), max_batch_size);

    for (chunk_index, chunk) in batch.chunks(rows_per_statement).enumerate() {
        let first = chunk_index * rows_per_statement + 1;
        let last = first + chunk.len() - 1;
        info!("{} | rows {first} to {last} of {total}", Branch::Insert);

        match mutator.bulk_insert(&chunk).await {
            Ok(affected) => {
                outcome.applied += chunk.len();
                if affected != chunk.len() as u64 {
                    warn!(
                        expected = chunk.len(),
                        affected,
                        "{} | affected row count differs from batch size",
                        Branch::Insert
                    );
                }
            }
            Err(err) => {
                outcome.failed += chunk.len();
                error!(
                    rows = chunk.len(),
                    error = %err,
                    "{} | insert statement failed",
                    Branch::Insert
                );
                for row in chunk.rows() {
                    error!(
                        row = %describe_row(chunk.column_names(), row),
                        "{} | row not inserted",
                        Branch::Insert
                    );
                }
            }
        }
    }

    outcome
}

/// Updates every row of `updates` through its primary key.
pub async fn apply_updates<M>(
    mutator: &M,
    primary_key: &str,
    updates: &[RowUpdate],
    skipped: usize,
) -> BranchOutcome
where
    M: TableMutator,
{
    let mut outcome = BranchOutcome::planned(updates.len(), skipped);
    let total = updates.len();

    for (index, update) in updates.iter().enumerate() {
        info!(
            key = %update.key,
            changed = ?update.changed_columns,
            "{} | {} of {total}",
            Branch::Update,
            index + 1
        );

        match mutator
            .update_row(primary_key, &update.key, &update.parameters)
            .await
        {
            Ok(affected) => {
                outcome.applied += 1;
                if affected == 0 {
                    warn!(key = %update.key, "{} | no row matched the key", Branch::Update);
                }
            }
            Err(err) => {
                outcome.failed += 1;
                error!(
                    key = %update.key,
                    parameters = %describe_parameters(&update.parameters),
                    error = %err,
                    "{} | update failed",
                    Branch::Update
                );
            }
        }
    }

    outcome
}

/// Deletes every row of `deletes` through its primary key.
pub async fn apply_deletes<M>(
    mutator: &M,
    primary_key: &str,
    deletes: &[RowDelete],
    skipped: usize,
) -> BranchOutcome
where
    M: TableMutator,
{
    let mut outcome = BranchOutcome::planned(deletes.len(), skipped);
    let total = deletes.len();

    for (index, delete) in deletes.iter().enumerate() {
        info!(
            key = %delete.key,
            row = %delete.description,
            "{} | {} of {total}",
            Branch::Delete,
            index + 1
        );

        match mutator.delete_row(primary_key, &delete.key).await {
            Ok(affected) => {
                outcome.applied += 1;
                if affected == 0 {
                    warn!(key = %delete.key, "{} | no row matched the key", Branch::Delete);
                }
            }
            Err(err) => {
                outcome.failed += 1;
                error!(
                    key = %delete.key,
                    row = %delete.description,
                    error = %err,
                    "{} | delete failed",
                    Branch::Delete
                );
            }
        }
    }

    outcome
}

fn describe_parameters(parameters: &[(String, Cell)]) -> String {
    let pairs = parameters
        .iter()
        .map(|(column, value)| format!("{column}={value}"))
        .collect::<Vec<_>>()
        .join(", ");

    format!("{{{pairs}}}")
}

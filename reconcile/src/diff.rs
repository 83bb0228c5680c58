//! Derivation of the insert, update and delete sets.
//!
//! The [`Differ`] hash-joins source rows and destination rows on their join keys. Every source
//! row ends up inserted, updated, unchanged or skipped; every destination row without a source
//! counterpart ends up deleted or skipped.

use std::collections::{HashMap, HashSet};
use std::collections::hash_map::Entry;
use std::fmt;

use reconcile_config::shared::{SyncConfig, Transcoding};
use tracing::{debug, error, warn};

use crate::conversions::transcode::CellTranscoding;
use crate::error::{ErrorKind, ReconcileError, ReconcileResult};
use crate::reconcile_error;
use crate::types::{Cell, JoinKey, TableRow, TableRows};

/// The three kinds of mutation a run can apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Branch {
    Insert,
    Update,
    Delete,
}

impl Branch {
    /// Returns the prefix used in log lines, e.g. `INSERT`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Branch::Insert => "INSERT",
            Branch::Update => "UPDATE",
            Branch::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rows to append to the destination, all with the same column list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InsertBatch {
    column_names: Vec<String>,
    rows: Vec<TableRow>,
}

impl InsertBatch {
    pub fn new(column_names: Vec<String>) -> Self {
        Self {
            column_names,
            rows: Vec::new(),
        }
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    pub fn push(&mut self, row: TableRow) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Splits the batch into consecutive batches of at most `rows_per_batch` rows.
    pub fn chunks(&self, rows_per_batch: usize) -> impl Iterator<Item = InsertBatch> + '_ {
        self.rows
            .chunks(rows_per_batch.max(1))
            .map(|rows| InsertBatch {
                column_names: self.column_names.clone(),
                rows: rows.to_vec(),
            })
    }

    /// Returns the value of `column_name` in every row.
    pub fn column_values(&self, column_name: &str) -> Vec<&Cell> {
        match self.column_names.iter().position(|name| name == column_name) {
            Some(index) => self.rows.iter().map(|row| row.get(index)).collect(),
            None => Vec::new(),
        }
    }
}

/// A point update of one destination row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowUpdate {
    /// Primary key value of the destination row.
    pub key: Cell,
    /// Destination columns and their new, storage encoded values.
    pub parameters: Vec<(String, Cell)>,
    /// Destination columns whose value differed.
    pub changed_columns: Vec<String>,
}

/// A destination row without a source counterpart.
#[derive(Debug, Clone, PartialEq)]
pub struct RowDelete {
    /// Primary key value of the destination row.
    pub key: Cell,
    /// The full destination row, rendered for log lines.
    pub description: String,
}

/// A row left out of its branch.
#[derive(Debug, Clone)]
pub struct SkippedRow {
    pub branch: Branch,
    /// The full row, rendered for log lines.
    pub description: String,
    pub error: ReconcileError,
}

/// Output of [`Differ::diff`].
#[derive(Debug, Clone, Default)]
pub struct DiffSets {
    pub inserts: InsertBatch,
    pub updates: Vec<RowUpdate>,
    pub deletes: Vec<RowDelete>,
    /// Matched rows whose mapped columns are all equal.
    pub unchanged: usize,
    /// Matched rows that only differ in columns updates never write, such as MAC identifiers.
    pub identifier_drift: usize,
    pub skipped: Vec<SkippedRow>,
}

impl DiffSets {
    /// Returns how many rows were left out of `branch`.
    pub fn skipped_in(&self, branch: Branch) -> usize {
        self.skipped
            .iter()
            .filter(|skipped| skipped.branch == branch)
            .count()
    }

    /// Returns `true` when applying the sets would not change the destination.
    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty() && self.updates.is_empty() && self.deletes.is_empty()
    }
}

/// A column mapping resolved against both tables.
#[derive(Debug)]
struct ResolvedMapping<'a> {
    source_index: usize,
    destination_index: usize,
    destination_column: &'a str,
    transcoding: Option<Transcoding>,
}

impl ResolvedMapping<'_> {
    /// Whether an update may write this column.
    fn is_updatable(&self, destination_join_key: &str) -> bool {
        self.transcoding != Some(Transcoding::Mac)
            && self.destination_column != destination_join_key
    }
}

/// What a matched pair of rows amounts to.
#[derive(Debug)]
enum MatchOutcome {
    Unchanged,
    /// Only columns listed here differ, and updates never write them.
    IdentifierDrift(Vec<String>),
    Update(RowUpdate),
}

/// Column positions of one diff, resolved once before walking the rows.
#[derive(Debug)]
struct Layout<'a> {
    mappings: Vec<ResolvedMapping<'a>>,
    source_join: usize,
    destination_join: usize,
    primary_key: usize,
    join_transcoding: Option<Transcoding>,
    /// Whether inserted rows get the source join value copied into the destination join key.
    copy_join_key: bool,
    insert_columns: Vec<String>,
    /// Positions in `insert_columns` and values of the constant overrides.
    constants: Vec<(usize, Cell)>,
}

/// Computes the [`DiffSets`] of a source and a destination table.
///
/// Destination values of transcoded columns are expected in display form, see
/// [`crate::conversions::transcode::decode_columns`].
#[derive(Debug, Clone)]
pub struct Differ<'a> {
    sync: &'a SyncConfig,
    source_join_key: &'a str,
    destination_join_key: &'a str,
    primary_key: &'a str,
}

impl<'a> Differ<'a> {
    pub fn new(
        sync: &'a SyncConfig,
        source_join_key: &'a str,
        destination_join_key: &'a str,
        primary_key: &'a str,
    ) -> Self {
        Self {
            sync,
            source_join_key,
            destination_join_key,
            primary_key,
        }
    }

    /// Partitions the joined rows of `source` and `destination`.
    ///
    /// Fails with [`ErrorKind::SchemaError`] if a configured column is missing from either
    /// table. Malformed values only skip the row they belong to.
    pub fn diff(&self, source: &TableRows, destination: &TableRows) -> ReconcileResult<DiffSets> {
        let layout = self.layout(source, destination)?;
        let mut sets = DiffSets {
            inserts: InsertBatch::new(layout.insert_columns.clone()),
            ..DiffSets::default()
        };

        let index = self.index_destination(destination, &layout);
        let mut matched = vec![false; destination.len()];
        let mut seen_source_keys = HashSet::with_capacity(source.len());

        for source_row in source.rows() {
            let key = self.source_key(source_row, &layout);
            let destination_index = key.as_ref().and_then(|key| index.get(key).copied());

            if let Some(key) = key
                && !seen_source_keys.insert(key)
            {
                let branch = match destination_index {
                    Some(_) => Branch::Update,
                    None => Branch::Insert,
                };
                let err = reconcile_error!(
                    ErrorKind::DuplicateJoinKey,
                    "Source join key is not unique",
                    format!(
                        "`{}` = {} belongs to an earlier source row",
                        self.source_join_key,
                        source_row.get(layout.source_join)
                    )
                );
                skip(&mut sets, branch, source.describe(source_row), err);
                continue;
            }

            let Some(destination_index) = destination_index else {
                match self.build_insert(source_row, &layout) {
                    Ok(row) => sets.inserts.push(row),
                    Err(err) => skip(&mut sets, Branch::Insert, source.describe(source_row), err),
                }
                continue;
            };

            matched[destination_index] = true;

            let destination_row = &destination.rows()[destination_index];
            match self.build_update(source_row, destination_row, &layout) {
                Ok(MatchOutcome::Update(update)) => sets.updates.push(update),
                Ok(MatchOutcome::Unchanged) => sets.unchanged += 1,
                Ok(MatchOutcome::IdentifierDrift(columns)) => {
                    warn!(
                        row = %source.describe(source_row),
                        columns = ?columns,
                        "identifier columns differ from the destination and are not updated"
                    );
                    sets.identifier_drift += 1;
                }
                Err(err) => skip(&mut sets, Branch::Update, source.describe(source_row), err),
            }
        }

        for (destination_row, _) in destination
            .rows()
            .iter()
            .zip(&matched)
            .filter(|(_, matched)| !**matched)
        {
            let description = destination.describe(destination_row);
            let key = destination_row.get(layout.primary_key);
            if key.is_null() {
                let err = null_primary_key(self.primary_key);
                skip(&mut sets, Branch::Delete, description, err);
                continue;
            }

            sets.deletes.push(RowDelete {
                key: key.clone(),
                description,
            });
        }

        debug!(
            inserts = sets.inserts.len(),
            updates = sets.updates.len(),
            deletes = sets.deletes.len(),
            unchanged = sets.unchanged,
            identifier_drift = sets.identifier_drift,
            skipped = sets.skipped.len(),
            "computed diff"
        );

        Ok(sets)
    }

    fn layout(&self, source: &TableRows, destination: &TableRows) -> ReconcileResult<Layout<'a>> {
        let sync = self.sync;

        let mut mappings = Vec::with_capacity(sync.column_mappings.len());
        for (source_column, destination_column) in &sync.column_mappings {
            mappings.push(ResolvedMapping {
                source_index: source.require_column("source", source_column)?,
                destination_index: destination
                    .require_column("destination", destination_column)?,
                destination_column: destination_column.as_str(),
                transcoding: sync.transcoding_for(destination_column),
            });
        }

        let source_join = source.require_column("source", self.source_join_key)?;
        let destination_join =
            destination.require_column("destination", self.destination_join_key)?;
        let primary_key = destination.require_column("destination", self.primary_key)?;

        let mut insert_columns: Vec<String> = mappings
            .iter()
            .map(|mapping| mapping.destination_column.to_string())
            .collect();

        let copy_join_key = !insert_columns
            .iter()
            .any(|column| column == self.destination_join_key);
        if copy_join_key {
            insert_columns.push(self.destination_join_key.to_string());
        }

        let mut constants = Vec::with_capacity(sync.constant_mappings.len());
        for (column, value) in &sync.constant_mappings {
            destination.require_column("destination", column)?;
            let position = match insert_columns.iter().position(|name| name == column) {
                Some(position) => position,
                None => {
                    insert_columns.push(column.clone());
                    insert_columns.len() - 1
                }
            };
            let value = encode(sync.transcoding_for(column), &Cell::from_json(value))
                .map_err(|err| err.with_kind(ErrorKind::ConfigError))?;
            constants.push((position, value));
        }

        Ok(Layout {
            mappings,
            source_join,
            destination_join,
            primary_key,
            join_transcoding: sync.transcoding_for(self.destination_join_key),
            copy_join_key,
            insert_columns,
            constants,
        })
    }

    /// Maps join keys of the destination to the position of the first row holding them.
    fn index_destination(
        &self,
        destination: &TableRows,
        layout: &Layout<'_>,
    ) -> HashMap<JoinKey, usize> {
        let mut index = HashMap::with_capacity(destination.len());
        for (position, row) in destination.rows().iter().enumerate() {
            let Some(key) = JoinKey::from_cell(row.get(layout.destination_join)) else {
                continue;
            };

            match index.entry(key) {
                Entry::Vacant(entry) => {
                    entry.insert(position);
                }
                Entry::Occupied(_) => warn!(
                    row = %destination.describe(row),
                    join_key = self.destination_join_key,
                    "destination join key is not unique, treating the row as unmatched"
                ),
            }
        }

        index
    }

    /// Returns the join key of a source row in the form destination keys are indexed by.
    ///
    /// A value the destination join transcoding rejects has no key; the row is then built as
    /// an insert, which reports the malformed value.
    fn source_key(&self, row: &TableRow, layout: &Layout<'_>) -> Option<JoinKey> {
        let cell = row.get(layout.source_join);
        match layout.join_transcoding {
            Some(transcoding) => transcoding
                .canonicalize(cell)
                .ok()
                .and_then(|cell| JoinKey::from_cell(&cell)),
            None => JoinKey::from_cell(cell),
        }
    }

    fn build_insert(&self, row: &TableRow, layout: &Layout<'_>) -> ReconcileResult<TableRow> {
        let mut values = Vec::with_capacity(layout.insert_columns.len());
        for mapping in &layout.mappings {
            values.push(encode(mapping.transcoding, row.get(mapping.source_index))?);
        }
        if layout.copy_join_key {
            values.push(encode(layout.join_transcoding, row.get(layout.source_join))?);
        }

        values.resize(layout.insert_columns.len(), Cell::Null);
        for (position, value) in &layout.constants {
            values[*position] = value.clone();
        }

        Ok(TableRow::new(values))
    }

    fn build_update(
        &self,
        source_row: &TableRow,
        destination_row: &TableRow,
        layout: &Layout<'_>,
    ) -> ReconcileResult<MatchOutcome> {
        let mut changed_columns = Vec::new();
        let mut writes_changed_column = false;
        for mapping in &layout.mappings {
            let source_value =
                canonicalize(mapping.transcoding, source_row.get(mapping.source_index))?;
            if !source_value.value_eq(destination_row.get(mapping.destination_index)) {
                changed_columns.push(mapping.destination_column.to_string());
                writes_changed_column |= mapping.is_updatable(self.destination_join_key);
            }
        }

        if changed_columns.is_empty() {
            return Ok(MatchOutcome::Unchanged);
        }
        if !writes_changed_column {
            return Ok(MatchOutcome::IdentifierDrift(changed_columns));
        }

        let mut parameters = Vec::new();
        for mapping in &layout.mappings {
            if mapping.is_updatable(self.destination_join_key) {
                let value = encode(mapping.transcoding, source_row.get(mapping.source_index))?;
                parameters.push((mapping.destination_column.to_string(), value));
            }
        }

        let key = destination_row.get(layout.primary_key);
        if key.is_null() {
            return Err(null_primary_key(self.primary_key));
        }

        Ok(MatchOutcome::Update(RowUpdate {
            key: key.clone(),
            parameters,
            changed_columns,
        }))
    }
}

fn encode(transcoding: Option<Transcoding>, cell: &Cell) -> ReconcileResult<Cell> {
    match transcoding {
        Some(transcoding) => transcoding.encode(cell),
        None => Ok(cell.clone()),
    }
}

fn canonicalize(transcoding: Option<Transcoding>, cell: &Cell) -> ReconcileResult<Cell> {
    match transcoding {
        Some(transcoding) => transcoding.canonicalize(cell),
        None => Ok(cell.clone()),
    }
}

fn null_primary_key(primary_key: &str) -> ReconcileError {
    reconcile_error!(
        ErrorKind::InvalidFormat,
        "Destination row has no primary key",
        format!("`{primary_key}` is NULL")
    )
}

fn skip(sets: &mut DiffSets, branch: Branch, description: String, error: ReconcileError) {
    error!(
        row = %description,
        error = %error,
        "{branch} | skipping row"
    );

    sets.skipped.push(SkippedRow {
        branch,
        description,
        error,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{sync_config, table_rows as table, text};
    use serde_json::json;

    #[test]
    fn unmatched_source_rows_are_transcoded_into_inserts() {
        let sync = sync_config(&[("mac", "dhcp_identifier"), ("ip", "ipv4_address")]);
        let source = table(
            &["id", "ip", "mac"],
            vec![vec![Cell::I64(7), text("10.0.0.5"), text("aa:bb:cc:dd:ee:ff")]],
        );
        let destination = table(&["host_id", "dhcp_identifier", "ipv4_address"], vec![]);

        let sets = Differ::new(&sync, "mac", "dhcp_identifier", "host_id")
            .diff(&source, &destination)
            .unwrap();

        assert_eq!(sets.inserts.column_names(), ["ipv4_address", "dhcp_identifier"]);
        assert_eq!(
            sets.inserts.rows()[0].values(),
            &[
                Cell::U64(167772165),
                Cell::Bytes(vec![0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]),
            ]
        );
        assert!(sets.updates.is_empty());
        assert!(sets.deletes.is_empty());
    }

    #[test]
    fn join_key_is_copied_when_not_mapped() {
        let mut sync = sync_config(&[("name", "hostname")]);
        sync.constant_mappings.insert("subnet".to_string(), json!(1));
        let source = table(&["id", "name"], vec![vec![Cell::I64(7), text("X")]]);
        let destination = table(&["pk", "id", "hostname", "subnet"], vec![]);

        let sets = Differ::new(&sync, "id", "id", "pk")
            .diff(&source, &destination)
            .unwrap();

        assert_eq!(sets.inserts.column_names(), ["hostname", "id", "subnet"]);
        assert_eq!(
            sets.inserts.rows()[0].values(),
            &[text("X"), Cell::I64(7), Cell::I64(1)]
        );
    }

    #[test]
    fn differing_rows_become_updates_without_join_key() {
        let sync = sync_config(&[("id", "id"), ("name", "name")]);
        let source = table(&["id", "name"], vec![vec![Cell::I64(7), text("X")]]);
        let destination = table(
            &["pk", "id", "name"],
            vec![vec![Cell::U64(1), Cell::U64(7), text("Y")]],
        );

        let sets = Differ::new(&sync, "id", "id", "pk")
            .diff(&source, &destination)
            .unwrap();

        assert_eq!(
            sets.updates,
            vec![RowUpdate {
                key: Cell::U64(1),
                parameters: vec![("name".to_string(), text("X"))],
                changed_columns: vec!["name".to_string()],
            }]
        );
        assert!(sets.inserts.is_empty());
        assert!(sets.deletes.is_empty());
    }

    #[test]
    fn updates_compare_canonical_forms_and_skip_mac_columns() {
        let sync = sync_config(&[
            ("asset", "hostname"),
            ("ip", "ipv4_address"),
            ("mac", "dhcp_identifier"),
        ]);
        let source = table(
            &["asset", "ip", "mac"],
            vec![
                vec![text("printer"), text("10.0.0.9"), text("AA:BB:CC:DD:EE:FF")],
                vec![text("camera"), text("10.0.0.7"), text("aa:bb:cc:dd:ee:01")],
            ],
        );
        let destination = table(
            &["host_id", "hostname", "ipv4_address", "dhcp_identifier"],
            vec![
                vec![Cell::U64(1), text("printer"), text("10.0.0.5"), text("aa:bb:cc:dd:ee:ff")],
                vec![Cell::U64(2), text("camera"), text("10.0.0.7"), text("aa:bb:cc:dd:ee:01")],
            ],
        );

        let sets = Differ::new(&sync, "mac", "dhcp_identifier", "host_id")
            .diff(&source, &destination)
            .unwrap();

        assert_eq!(sets.unchanged, 1);
        assert_eq!(
            sets.updates,
            vec![RowUpdate {
                key: Cell::U64(1),
                parameters: vec![
                    ("hostname".to_string(), text("printer")),
                    ("ipv4_address".to_string(), Cell::U64(167772169)),
                ],
                changed_columns: vec!["ipv4_address".to_string()],
            }]
        );
    }

    #[test]
    fn unmatched_destination_rows_become_deletes() {
        let sync = sync_config(&[("id", "id")]);
        let source = table(&["id"], vec![]);
        let destination = table(&["pk", "id"], vec![vec![Cell::U64(2), Cell::I64(9)]]);

        let sets = Differ::new(&sync, "id", "id", "pk")
            .diff(&source, &destination)
            .unwrap();

        assert_eq!(
            sets.deletes,
            vec![RowDelete {
                key: Cell::U64(2),
                description: "{pk=2, id=9}".to_string(),
            }]
        );
    }

    #[test]
    fn malformed_values_skip_only_their_row() {
        let sync = sync_config(&[("mac", "dhcp_identifier")]);
        let source = table(
            &["mac"],
            vec![vec![text("zz:zz")], vec![text("aa:bb:cc:dd:ee:ff")]],
        );
        let destination = table(&["host_id", "dhcp_identifier"], vec![]);

        let sets = Differ::new(&sync, "mac", "dhcp_identifier", "host_id")
            .diff(&source, &destination)
            .unwrap();

        assert_eq!(sets.inserts.len(), 1);
        assert_eq!(sets.skipped.len(), 1);
        assert_eq!(sets.skipped[0].branch, Branch::Insert);
        assert_eq!(sets.skipped[0].error.kind(), ErrorKind::InvalidFormat);
        assert_eq!(sets.skipped[0].description, "{mac=\"zz:zz\"}");
    }

    #[test]
    fn null_join_keys_never_match() {
        let sync = sync_config(&[("id", "id"), ("name", "name")]);
        let source = table(&["id", "name"], vec![vec![Cell::Null, text("X")]]);
        let destination = table(
            &["pk", "id", "name"],
            vec![vec![Cell::U64(1), Cell::Null, text("X")]],
        );

        let sets = Differ::new(&sync, "id", "id", "pk")
            .diff(&source, &destination)
            .unwrap();

        assert_eq!(sets.inserts.len(), 1);
        assert_eq!(sets.deletes.len(), 1);
        assert_eq!(sets.unchanged, 0);
    }

    #[test]
    fn duplicate_keys_match_once() {
        let sync = sync_config(&[("id", "id")]);
        let source = table(&["id"], vec![vec![Cell::I64(1)], vec![Cell::I64(1)]]);
        let destination = table(
            &["pk", "id"],
            vec![vec![Cell::U64(1), Cell::I64(1)], vec![Cell::U64(2), Cell::I64(1)]],
        );

        let sets = Differ::new(&sync, "id", "id", "pk")
            .diff(&source, &destination)
            .unwrap();

        assert_eq!(sets.unchanged, 1);
        assert_eq!(sets.skipped_in(Branch::Update), 1);
        assert_eq!(sets.skipped[0].error.kind(), ErrorKind::DuplicateJoinKey);
        assert_eq!(sets.deletes.len(), 1);
        assert_eq!(sets.deletes[0].key, Cell::U64(2));
    }

    #[test]
    fn duplicate_source_keys_are_inserted_once() {
        let sync = sync_config(&[("id", "id"), ("name", "name")]);
        let source = table(
            &["id", "name"],
            vec![vec![Cell::I64(1), text("a")], vec![Cell::I64(1), text("b")]],
        );
        let destination = table(&["pk", "id", "name"], vec![]);

        let sets = Differ::new(&sync, "id", "id", "pk")
            .diff(&source, &destination)
            .unwrap();

        assert_eq!(sets.inserts.len(), 1);
        assert_eq!(sets.inserts.rows()[0].values(), &[Cell::I64(1), text("a")]);
        assert_eq!(sets.skipped_in(Branch::Insert), 1);
        assert_eq!(sets.skipped[0].error.kind(), ErrorKind::DuplicateJoinKey);
        assert_eq!(sets.skipped[0].description, "{id=1, name=\"b\"}");
    }

    #[test]
    fn duplicate_source_keys_compare_in_canonical_form() {
        let sync = sync_config(&[("mac", "dhcp_identifier")]);
        let source = table(
            &["mac"],
            vec![vec![text("AA:BB:CC:DD:EE:FF")], vec![text("aa:bb:cc:dd:ee:ff")]],
        );
        let destination = table(&["host_id", "dhcp_identifier"], vec![]);

        let sets = Differ::new(&sync, "mac", "dhcp_identifier", "host_id")
            .diff(&source, &destination)
            .unwrap();

        assert_eq!(sets.inserts.len(), 1);
        assert_eq!(sets.skipped_in(Branch::Insert), 1);
    }

    #[test]
    fn mac_only_differences_are_identifier_drift() {
        let sync = sync_config(&[("id", "id"), ("mac", "dhcp_identifier"), ("name", "name")]);
        let source = table(
            &["id", "mac", "name"],
            vec![
                vec![Cell::I64(1), text("aa:bb:cc:dd:ee:01"), text("a")],
                vec![Cell::I64(2), text("aa:bb:cc:dd:ee:02"), text("renamed")],
            ],
        );
        let destination = table(
            &["pk", "id", "dhcp_identifier", "name"],
            vec![
                vec![Cell::U64(10), Cell::I64(1), text("aa:bb:cc:dd:ee:ff"), text("a")],
                vec![Cell::U64(20), Cell::I64(2), text("aa:bb:cc:dd:ee:fe"), text("b")],
            ],
        );

        let sets = Differ::new(&sync, "id", "id", "pk")
            .diff(&source, &destination)
            .unwrap();

        assert_eq!(sets.identifier_drift, 1);
        assert_eq!(sets.unchanged, 0);
        assert_eq!(
            sets.updates,
            vec![RowUpdate {
                key: Cell::U64(20),
                parameters: vec![("name".to_string(), text("renamed"))],
                changed_columns: vec!["dhcp_identifier".to_string(), "name".to_string()],
            }]
        );
    }

    #[test]
    fn constants_on_transcoded_columns_are_encoded() {
        let mut sync = sync_config(&[("id", "id")]);
        sync.constant_mappings
            .insert("ipv4_address".to_string(), json!("10.0.0.1"));
        let source = table(&["id"], vec![vec![Cell::I64(7)]]);
        let destination = table(&["pk", "id", "ipv4_address"], vec![]);

        let sets = Differ::new(&sync, "id", "id", "pk")
            .diff(&source, &destination)
            .unwrap();

        assert_eq!(sets.inserts.column_names(), ["id", "ipv4_address"]);
        assert_eq!(
            sets.inserts.rows()[0].values(),
            &[Cell::I64(7), Cell::U64(167772161)]
        );
    }

    #[test]
    fn malformed_constants_are_config_errors() {
        let mut sync = sync_config(&[("id", "id")]);
        sync.constant_mappings
            .insert("dhcp_identifier".to_string(), json!("not-a-mac"));
        let source = table(&["id"], vec![vec![Cell::I64(7)]]);
        let destination = table(&["pk", "id", "dhcp_identifier"], vec![]);

        let err = Differ::new(&sync, "id", "id", "pk")
            .diff(&source, &destination)
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ConfigError);
    }

    #[test]
    fn null_primary_keys_are_skipped() {
        let sync = sync_config(&[("id", "id")]);
        let source = table(&["id"], vec![]);
        let destination = table(&["pk", "id"], vec![vec![Cell::Null, Cell::I64(3)]]);

        let sets = Differ::new(&sync, "id", "id", "pk")
            .diff(&source, &destination)
            .unwrap();

        assert!(sets.deletes.is_empty());
        assert_eq!(sets.skipped_in(Branch::Delete), 1);
    }

    #[test]
    fn missing_columns_are_schema_errors() {
        let sync = sync_config(&[("id", "id"), ("name", "label")]);
        let source = table(&["id", "name"], vec![]);
        let destination = table(&["pk", "id"], vec![]);

        let err = Differ::new(&sync, "id", "id", "pk")
            .diff(&source, &destination)
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::SchemaError);
        assert_eq!(err.detail(), Some("destination table has no column `label`"));
    }

    #[test]
    fn every_row_lands_in_one_outcome() {
        let sync = sync_config(&[("id", "id"), ("name", "name"), ("ip", "ipv4_address")]);
        let source = table(
            &["id", "name", "ip"],
            vec![
                vec![Cell::I64(1), text("a"), text("10.0.0.1")],
                vec![Cell::I64(2), text("b"), text("10.0.0.2")],
                vec![Cell::I64(3), text("c"), text("bogus")],
                vec![Cell::I64(4), text("d"), text("10.0.0.4")],
                vec![Cell::I64(5), text("e"), text("10.0.0.300")],
            ],
        );
        let destination = table(
            &["pk", "id", "name", "ipv4_address"],
            vec![
                vec![Cell::U64(10), Cell::I64(1), text("a"), text("10.0.0.1")],
                vec![Cell::U64(20), Cell::I64(2), text("old"), text("10.0.0.2")],
                vec![Cell::U64(30), Cell::I64(3), text("c"), text("10.0.0.3")],
                vec![Cell::U64(60), Cell::I64(6), text("f"), text("10.0.0.6")],
            ],
        );

        let sets = Differ::new(&sync, "id", "id", "pk")
            .diff(&source, &destination)
            .unwrap();

        let source_outcomes = sets.inserts.len()
            + sets.updates.len()
            + sets.unchanged
            + sets.identifier_drift
            + sets.skipped_in(Branch::Insert)
            + sets.skipped_in(Branch::Update);
        assert_eq!(source_outcomes, source.len());

        let matched = sets.updates.len()
            + sets.unchanged
            + sets.identifier_drift
            + sets.skipped_in(Branch::Update);
        assert_eq!(
            matched + sets.deletes.len() + sets.skipped_in(Branch::Delete),
            destination.len()
        );

        assert_eq!(sets.unchanged, 1);
        assert_eq!(sets.updates.len(), 1);
        assert_eq!(sets.inserts.len(), 1);
        assert_eq!(sets.deletes.len(), 1);
        assert_eq!(sets.skipped.len(), 2);
    }
}

#![cfg(feature = "test-utils")]

use reconcile::diff::Branch;
use reconcile::error::ErrorKind;
use reconcile::store::memory::MemoryTable;
use reconcile::test_utils::hosts::{asset, assets_table, host, hosts_table};
use reconcile::test_utils::pipeline::PipelineBuilder;
use reconcile::test_utils::{sync_config, text};
use reconcile::types::Cell;
use reconcile_telemetry::tracing::init_test_tracing;

const PRINTER_MAC: [u8; 6] = [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0x01];
const CAMERA_MAC: [u8; 6] = [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0x02];

/// 10.0.0.1
const PRINTER_IP: u32 = 0x0a00_0001;
/// 10.0.0.2
const CAMERA_IP: u32 = 0x0a00_0002;

fn printer() -> Vec<Cell> {
    asset(1, "aa:bb:cc:dd:ee:01", "10.0.0.1", "printer")
}

fn camera() -> Vec<Cell> {
    asset(2, "aa:bb:cc:dd:ee:02", "10.0.0.2", "camera")
}

#[tokio::test]
async fn missing_hosts_are_inserted_in_storage_form() {
    init_test_tracing();

    let source = assets_table(vec![printer(), camera()]);
    let destination = hosts_table(vec![]).await;
    let pipeline = PipelineBuilder::new(source, destination.clone()).build();

    let report = pipeline.run().await.unwrap();

    assert_eq!(report.insert.planned, 2);
    assert_eq!(report.insert.applied, 2);
    assert!(report.update.is_clean());
    assert!(report.delete.is_clean());
    assert_eq!(
        destination.values().await,
        vec![
            host(1, PRINTER_MAC, PRINTER_IP, "printer"),
            host(2, CAMERA_MAC, CAMERA_IP, "camera"),
        ]
    );
}

#[tokio::test]
async fn second_run_plans_nothing() {
    init_test_tracing();

    let source = assets_table(vec![printer(), camera()]);
    let destination = hosts_table(vec![
        host(1, PRINTER_MAC, 0x0a00_0063, "old-printer"),
        host(7, [0, 0, 0, 0, 0, 7], 0x0a00_0007, "gone"),
    ])
    .await;
    let pipeline = PipelineBuilder::new(source, destination.clone()).build();

    let first = pipeline.run().await.unwrap();
    assert_eq!(first.insert.applied, 1);
    assert_eq!(first.update.applied, 1);
    assert_eq!(first.delete.applied, 1);

    let sets = pipeline.plan().await.unwrap();
    assert!(sets.is_empty());
    assert_eq!(sets.unchanged, 2);
    assert!(sets.skipped.is_empty());

    let second = pipeline.run().await.unwrap();
    assert_eq!(second.insert.planned + second.update.planned + second.delete.planned, 0);
    assert_eq!(second.unchanged, 2);
}

#[tokio::test]
async fn duplicate_source_macs_are_inserted_once() {
    init_test_tracing();

    let source = assets_table(vec![
        printer(),
        asset(3, "AA:BB:CC:DD:EE:01", "10.0.0.3", "printer-spare"),
    ]);
    let destination = hosts_table(vec![]).await;
    let pipeline = PipelineBuilder::new(source, destination.clone()).build();

    let first = pipeline.run().await.unwrap();
    assert_eq!(first.insert.applied, 1);
    assert_eq!(first.insert.skipped, 1);
    assert_eq!(
        destination.values().await,
        vec![host(1, PRINTER_MAC, PRINTER_IP, "printer")]
    );

    let sets = pipeline.plan().await.unwrap();
    assert!(sets.is_empty());
    assert_eq!(sets.unchanged, 1);
    assert_eq!(sets.skipped_in(Branch::Update), 1);
    assert_eq!(sets.skipped[0].error.kind(), ErrorKind::DuplicateJoinKey);
}

#[tokio::test]
async fn mac_drift_is_reported_and_left_alone() {
    init_test_tracing();

    let source = MemoryTable::with_rows(
        "assets",
        ["id", "mac", "name"],
        vec![vec![Cell::I64(7), text("aa:bb:cc:dd:ee:01"), text("printer")]],
    );
    let stored = vec![
        Cell::U64(1),
        Cell::I64(7),
        Cell::Bytes(CAMERA_MAC.to_vec()),
        text("printer"),
    ];
    let destination = MemoryTable::with_rows(
        "hosts",
        ["pk", "id", "dhcp_identifier", "name"],
        vec![stored.clone()],
    );
    let pipeline = PipelineBuilder::new(source, destination.clone())
        .with_sync_config(sync_config(&[
            ("id", "id"),
            ("mac", "dhcp_identifier"),
            ("name", "name"),
        ]))
        .with_join_keys("id", "id")
        .with_primary_key("pk")
        .build();

    let report = pipeline.run().await.unwrap();

    assert_eq!(report.identifier_drift, 1);
    assert_eq!(report.unchanged, 0);
    assert_eq!(report.update.planned, 0);
    assert_eq!(destination.values().await, vec![stored]);
}

#[tokio::test]
async fn changed_hosts_are_updated_by_primary_key() {
    init_test_tracing();

    let source = assets_table(vec![printer()]);
    let destination = hosts_table(vec![host(5, PRINTER_MAC, 0x0a00_0009, "old-printer")]).await;
    let pipeline = PipelineBuilder::new(source, destination.clone()).build();

    let sets = pipeline.plan().await.unwrap();
    assert_eq!(sets.updates.len(), 1);
    assert!(sets.updates[0].key.value_eq(&Cell::U64(5)));
    assert_eq!(
        sets.updates[0].parameters,
        vec![
            ("ipv4_address".to_string(), Cell::U64(u64::from(PRINTER_IP))),
            ("hostname".to_string(), text("printer")),
        ]
    );

    let report = pipeline.run().await.unwrap();

    assert_eq!(report.update.applied, 1);
    assert_eq!(
        destination.values().await,
        vec![host(5, PRINTER_MAC, PRINTER_IP, "printer")]
    );
}

#[tokio::test]
async fn unmatched_hosts_are_deleted() {
    init_test_tracing();

    let source = assets_table(vec![printer()]);
    let destination = hosts_table(vec![
        host(1, PRINTER_MAC, PRINTER_IP, "printer"),
        host(2, CAMERA_MAC, CAMERA_IP, "camera"),
    ])
    .await;
    let pipeline = PipelineBuilder::new(source, destination.clone()).build();

    let report = pipeline.run().await.unwrap();

    assert_eq!(report.delete.applied, 1);
    assert_eq!(report.unchanged, 1);
    assert_eq!(
        destination.values().await,
        vec![host(1, PRINTER_MAC, PRINTER_IP, "printer")]
    );
}

#[tokio::test]
async fn malformed_mac_skips_only_its_row() {
    init_test_tracing();

    let source = assets_table(vec![asset(3, "zz:zz", "10.0.0.3", "broken"), camera()]);
    let destination = hosts_table(vec![]).await;
    let pipeline = PipelineBuilder::new(source, destination.clone()).build();

    let sets = pipeline.plan().await.unwrap();
    assert_eq!(sets.skipped.len(), 1);
    assert_eq!(sets.skipped[0].error.kind(), ErrorKind::InvalidFormat);

    let report = pipeline.run().await.unwrap();

    assert_eq!(report.insert.skipped, 1);
    assert_eq!(report.insert.applied, 1);
    assert_eq!(report.skipped(), 1);
    assert_eq!(
        destination.values().await,
        vec![host(1, CAMERA_MAC, CAMERA_IP, "camera")]
    );
}

#[tokio::test]
async fn failed_branch_does_not_stop_later_branches() {
    init_test_tracing();

    let source = assets_table(vec![
        printer(),
        asset(3, "aa:bb:cc:dd:ee:03", "10.0.0.3", "scanner"),
    ]);
    let destination = hosts_table(vec![
        host(1, PRINTER_MAC, PRINTER_IP, "old-printer"),
        host(2, CAMERA_MAC, CAMERA_IP, "camera"),
    ])
    .await;
    destination.fail_inserts().await;
    let pipeline = PipelineBuilder::new(source, destination.clone()).build();

    let report = pipeline.run().await.unwrap();

    assert_eq!(report.insert.failed, 1);
    assert_eq!(report.update.applied, 1);
    assert_eq!(report.delete.applied, 1);
    assert_eq!(report.failed(), 1);
    assert_eq!(
        destination.values().await,
        vec![host(1, PRINTER_MAC, PRINTER_IP, "printer")]
    );
}

#[tokio::test]
async fn failed_row_mutations_are_counted_per_row() {
    init_test_tracing();

    let source = assets_table(vec![]);
    let destination = hosts_table(vec![
        host(1, PRINTER_MAC, PRINTER_IP, "printer"),
        host(2, CAMERA_MAC, CAMERA_IP, "camera"),
    ])
    .await;
    destination.fail_mutations_for(Cell::U64(1)).await;
    let pipeline = PipelineBuilder::new(source, destination.clone()).build();

    let report = pipeline.run().await.unwrap();

    assert_eq!(report.delete.planned, 2);
    assert_eq!(report.delete.failed, 1);
    assert_eq!(report.delete.applied, 1);
    assert_eq!(
        destination.values().await,
        vec![host(1, PRINTER_MAC, PRINTER_IP, "printer")]
    );
}

#[tokio::test]
async fn read_failure_aborts_before_mutating() {
    init_test_tracing();

    let source = assets_table(vec![printer()]);
    source.fail_reads(ErrorKind::ConnectionFailed).await;
    let destination = hosts_table(vec![host(2, CAMERA_MAC, CAMERA_IP, "camera")]).await;
    let pipeline = PipelineBuilder::new(source, destination.clone()).build();

    let err = pipeline.run().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ConnectionFailed);
    assert_eq!(destination.rows().await.len(), 1);
}

#[tokio::test]
async fn missing_join_column_is_a_schema_error() {
    init_test_tracing();

    let source = MemoryTable::with_rows("assets", ["id", "ip", "name"], vec![]);
    let destination = hosts_table(vec![]).await;
    let pipeline = PipelineBuilder::new(source, destination).build();

    let err = pipeline.run().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::SchemaError);
}

#[tokio::test]
async fn dry_run_leaves_destination_untouched() {
    init_test_tracing();

    let source = assets_table(vec![printer(), camera()]);
    let destination = hosts_table(vec![host(9, [0, 0, 0, 0, 0, 9], 0x0a00_0009, "gone")]).await;
    let pipeline = PipelineBuilder::new(source, destination.clone())
        .with_dry_run()
        .build();

    let report = pipeline.run().await.unwrap();

    assert!(report.dry_run);
    assert_eq!(report.insert.planned, 2);
    assert_eq!(report.insert.applied, 0);
    assert_eq!(report.delete.planned, 1);
    assert_eq!(report.delete.applied, 0);
    assert_eq!(
        destination.values().await,
        vec![host(9, [0, 0, 0, 0, 0, 9], 0x0a00_0009, "gone")]
    );
}

#[tokio::test]
async fn small_batches_read_and_insert_every_row() {
    init_test_tracing();

    let source = assets_table(vec![
        printer(),
        camera(),
        asset(3, "aa:bb:cc:dd:ee:03", "10.0.0.3", "scanner"),
    ]);
    let destination = hosts_table(vec![]).await;
    let pipeline = PipelineBuilder::new(source, destination.clone())
        .with_batch_size(1)
        .build();

    let report = pipeline.run().await.unwrap();

    assert_eq!(report.insert.applied, 3);
    assert_eq!(destination.rows().await.len(), 3);
}

#[tokio::test]
async fn plain_columns_reconcile_without_transcoding() {
    init_test_tracing();

    let source = MemoryTable::with_rows(
        "people",
        ["id", "name"],
        vec![vec![Cell::I64(7), text("X")], vec![Cell::I64(8), text("Z")]],
    );
    let destination = MemoryTable::with_rows(
        "people_copy",
        ["pk", "id", "name"],
        vec![
            vec![Cell::U64(1), Cell::U64(7), text("Y")],
            vec![Cell::U64(2), Cell::U64(9), text("W")],
        ],
    );
    let pipeline = PipelineBuilder::new(source, destination.clone())
        .with_sync_config(sync_config(&[("id", "id"), ("name", "name")]))
        .with_join_keys("id", "id")
        .with_primary_key("pk")
        .build();

    let report = pipeline.run().await.unwrap();

    assert_eq!(report.insert.applied, 1);
    assert_eq!(report.update.applied, 1);
    assert_eq!(report.delete.applied, 1);
    assert_eq!(
        destination.values().await,
        vec![
            vec![Cell::U64(1), Cell::U64(7), text("X")],
            vec![Cell::Null, Cell::I64(8), text("Z")],
        ]
    );
}

use reconcile_config::shared::SyncConfig;
use serde_json::json;

use crate::store::memory::MemoryTable;
use crate::test_utils::{sync_config, text};
use crate::types::Cell;

pub const ASSETS_TABLE: &str = "assets";
pub const ASSETS_COLUMNS: [&str; 4] = ["id", "mac", "ip", "name"];

pub const HOSTS_TABLE: &str = "hosts";
pub const HOSTS_COLUMNS: [&str; 6] = [
    "host_id",
    "dhcp_identifier",
    "dhcp_identifier_type",
    "ipv4_address",
    "hostname",
    "dhcp4_subnet_id",
];

/// Subnet id written into every inserted host.
pub const SUBNET_ID: i64 = 1;

/// Mappings of the fixture: `mac`, `ip` and `name` onto their `hosts` columns, plus constant
/// identifier type and subnet for inserts.
pub fn hosts_sync_config() -> SyncConfig {
    let mut sync = sync_config(&[
        ("mac", "dhcp_identifier"),
        ("ip", "ipv4_address"),
        ("name", "hostname"),
    ]);
    sync.constant_mappings
        .insert("dhcp_identifier_type".to_string(), json!(0));
    sync.constant_mappings
        .insert("dhcp4_subnet_id".to_string(), json!(SUBNET_ID));

    sync
}

/// A source row in [`ASSETS_COLUMNS`] order.
pub fn asset(id: i64, mac: &str, ip: &str, name: &str) -> Vec<Cell> {
    vec![Cell::I64(id), text(mac), text(ip), text(name)]
}

/// A destination row in [`HOSTS_COLUMNS`] order, with values in storage form.
pub fn host(host_id: u64, mac: [u8; 6], ip: u32, name: &str) -> Vec<Cell> {
    vec![
        Cell::U64(host_id),
        Cell::Bytes(mac.to_vec()),
        Cell::I64(0),
        Cell::U64(u64::from(ip)),
        text(name),
        Cell::I64(SUBNET_ID),
    ]
}

pub fn assets_table(rows: Vec<Vec<Cell>>) -> MemoryTable {
    MemoryTable::with_rows(ASSETS_TABLE, ASSETS_COLUMNS, rows)
}

/// Creates the destination table with `host_id` assigned on insert.
///
/// # Panics
/// Panics if the auto increment column cannot be set up.
pub async fn hosts_table(rows: Vec<Vec<Cell>>) -> MemoryTable {
    let table = MemoryTable::with_rows(HOSTS_TABLE, HOSTS_COLUMNS, rows);
    table
        .set_auto_increment("host_id")
        .await
        .expect("Failed to set up host_id auto increment");

    table
}

//! MySQL connectivity for the table reconciler.
//!
//! Holds the MySQL-facing types ([`types::TableName`], [`types::TableSchema`]) and the pool and
//! schema lookup helpers used by the readers and mutators in the `reconcile` crate.

pub mod db;
#[cfg(feature = "test-utils")]
pub mod sqlx;
pub mod types;

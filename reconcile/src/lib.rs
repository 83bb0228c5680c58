//! One-way reconciliation of a destination MySQL table against a source table.
//!
//! A run reads both tables fully, joins them on a configured key and derives three sets:
//! rows to insert, rows to update and rows to delete. The sets are then applied to the
//! destination one statement at a time. Columns stored in a binary or integer encoding in the
//! destination (IPv4 addresses, MAC addresses) are transcoded on the way in and compared in
//! their display form.
//!
//! Mutations are not wrapped in a transaction. Each insert statement, update and delete
//! commits on its own, so a run interrupted half way leaves the destination partially
//! reconciled; running again converges.

pub mod apply;
pub mod conversions;
pub mod diff;
pub mod error;
mod macros;
pub mod pipeline;
pub mod store;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;

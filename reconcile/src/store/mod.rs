mod base;
pub mod memory;
pub mod mysql;
mod table;

pub use base::*;
pub use table::*;

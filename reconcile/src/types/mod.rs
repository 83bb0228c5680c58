mod cell;
mod join_key;
mod table_row;

pub use cell::*;
pub use join_key::*;
pub use table_row::*;

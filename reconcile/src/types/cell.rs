use std::fmt;

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// A single column value read from or written to a table.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Bool(bool),
    I64(i64),
    U64(u64),
    F64(f64),
    Numeric(BigDecimal),
    String(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    Json(serde_json::Value),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Returns the value as an integer when it is one, regardless of signedness.
    pub fn as_integer(&self) -> Option<i128> {
        match self {
            Cell::I64(value) => Some(i128::from(*value)),
            Cell::U64(value) => Some(i128::from(*value)),
            _ => None,
        }
    }

    /// Compares two cells the way the differ does.
    ///
    /// Integers compare by value across [`Cell::I64`] and [`Cell::U64`]. Everything else must
    /// have the same variant and the same value, so `"7"` never equals `7`.
    pub fn value_eq(&self, other: &Cell) -> bool {
        match (self.as_integer(), other.as_integer()) {
            (Some(left), Some(right)) => left == right,
            _ => self == other,
        }
    }

    /// Converts a configuration literal into a cell.
    ///
    /// Arrays and objects are kept as [`Cell::Json`].
    pub fn from_json(value: &serde_json::Value) -> Cell {
        match value {
            serde_json::Value::Null => Cell::Null,
            serde_json::Value::Bool(value) => Cell::Bool(*value),
            serde_json::Value::Number(number) => {
                if let Some(value) = number.as_i64() {
                    Cell::I64(value)
                } else if let Some(value) = number.as_u64() {
                    Cell::U64(value)
                } else {
                    Cell::F64(number.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(value) => Cell::String(value.clone()),
            other => Cell::Json(other.clone()),
        }
    }
}

/// Renders values for log lines; bytes are shown as `0x` prefixed hex.
impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => f.write_str("NULL"),
            Cell::Bool(value) => write!(f, "{value}"),
            Cell::I64(value) => write!(f, "{value}"),
            Cell::U64(value) => write!(f, "{value}"),
            Cell::F64(value) => write!(f, "{value}"),
            Cell::Numeric(value) => write!(f, "{value}"),
            Cell::String(value) => write!(f, "{value:?}"),
            Cell::Bytes(bytes) => {
                f.write_str("0x")?;
                for byte in bytes {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
            Cell::Date(value) => write!(f, "{value}"),
            Cell::Time(value) => write!(f, "{value}"),
            Cell::Timestamp(value) => write!(f, "{value}"),
            Cell::Json(value) => write!(f, "{value}"),
        }
    }
}

use crate::types::Cell;

/// Hashable form of a join column value.
///
/// Integers are widened so that a signed source column matches an unsigned destination
/// column holding the same number. Strings and bytes match only when identical.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JoinKey {
    Integer(i128),
    Text(String),
    Bytes(Vec<u8>),
    /// Any other value, keyed by its rendering prefixed with its type.
    Other(String),
}

impl JoinKey {
    /// Returns the key for `cell`, or [`None`] for [`Cell::Null`] which never matches.
    pub fn from_cell(cell: &Cell) -> Option<JoinKey> {
        let key = match cell {
            Cell::Null => return None,
            Cell::Bool(value) => JoinKey::Integer(i128::from(*value)),
            Cell::I64(value) => JoinKey::Integer(i128::from(*value)),
            Cell::U64(value) => JoinKey::Integer(i128::from(*value)),
            Cell::String(value) => JoinKey::Text(value.clone()),
            Cell::Bytes(value) => JoinKey::Bytes(value.clone()),
            Cell::F64(value) => JoinKey::Other(format!("f64:{value}")),
            Cell::Numeric(value) => JoinKey::Other(format!("numeric:{}", value.normalized())),
            Cell::Date(value) => JoinKey::Other(format!("date:{value}")),
            Cell::Time(value) => JoinKey::Other(format!("time:{value}")),
            Cell::Timestamp(value) => JoinKey::Other(format!("timestamp:{value}")),
            Cell::Json(value) => JoinKey::Other(format!("json:{value}")),
        };

        Some(key)
    }
}

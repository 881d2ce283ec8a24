use std::fmt;

/// Identifier assigned by the backing store. Never minted client-side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        RecordId::Int(value)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        RecordId::Text(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        RecordId::Text(value)
    }
}

impl RecordId {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            RecordId::Int(value) => Some(*value),
            RecordId::Text(_) => None,
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(value) => write!(f, "{value}"),
            RecordId::Text(value) => write!(f, "{value}"),
        }
    }
}

/// One row of a fetched page: the identifier plus the projected cell values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: RecordId,
    pub values: Vec<String>,
}

impl Record {
    pub fn new(id: impl Into<RecordId>, values: Vec<String>) -> Self {
        Self {
            id: id.into(),
            values,
        }
    }
}

/// Identifiers of `rows` in render order.
pub fn ids_of(rows: &[Record]) -> Vec<RecordId> {
    rows.iter().map(|row| row.id.clone()).collect()
}

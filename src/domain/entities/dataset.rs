use crate::domain::entities::record::{ids_of, Record, RecordId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DatasetId(pub i64);

impl From<i64> for DatasetId {
    fn from(value: i64) -> Self {
        DatasetId(value)
    }
}

impl From<DatasetId> for i64 {
    fn from(value: DatasetId) -> Self {
        value.0
    }
}

impl DatasetId {
    /// Resource path the request keys for this dataset are rooted at.
    pub fn resource_path(self) -> String {
        format!("/datasets/{}/records", self.0)
    }

    pub fn from_resource_path(path: &str) -> Option<Self> {
        path.strip_prefix("/datasets/")?
            .strip_suffix("/records")?
            .parse::<i64>()
            .ok()
            .map(DatasetId)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetMeta {
    pub id: DatasetId,
    pub name: String,
    pub columns: Vec<String>,
    pub record_count: i64,
    pub source_path: String,
}

/// One fetched page. Replaced wholesale on every successful fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSnapshot {
    pub columns: Vec<String>,
    pub rows: Vec<Record>,
    pub total_row_count: u64,
}

impl PageSnapshot {
    pub fn row_ids(&self) -> Vec<RecordId> {
        ids_of(&self.rows)
    }
}

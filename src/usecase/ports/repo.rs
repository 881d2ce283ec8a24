use std::collections::BTreeSet;

use thiserror::Error;

use crate::domain::entities::dataset::{DatasetId, DatasetMeta, PageSnapshot};
use crate::domain::entities::pagination::FilterState;
use crate::domain::entities::record::RecordId;
use crate::domain::request_key::{KeyParseError, RequestKey};

/// Failures of the fetch layer. All of them are recoverable: the table keeps
/// its last good snapshot and the user retries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("fetch failed: {0}")]
    Transient(String),
    #[error("invalid request key: {0}")]
    InvalidKey(#[from] KeyParseError),
    #[error("unknown resource: {0}")]
    UnknownResource(String),
}

impl FetchError {
    pub fn transient(err: impl std::fmt::Display) -> Self {
        FetchError::Transient(err.to_string())
    }
}

/// Why one id of a bulk action did not go through.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemFailure {
    #[error("record no longer exists")]
    Missing,
    #[error("rejected: {0}")]
    Rejected(String),
}

/// Per-item result of a bulk action. A failed item never aborts the batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkReport {
    pub succeeded: Vec<RecordId>,
    pub failed: Vec<(RecordId, ItemFailure)>,
}

impl BulkReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn missing(&self) -> impl Iterator<Item = &RecordId> {
        self.failed
            .iter()
            .filter(|(_, failure)| *failure == ItemFailure::Missing)
            .map(|(id, _)| id)
    }
}

/// Turns a request key into a page. This is the raw fetch behind the
/// stale-while-revalidate view.
pub trait RecordSource: Send + Sync {
    fn fetch_page(&self, key: &RequestKey) -> Result<PageSnapshot, FetchError>;
}

/// Every id matching a query across all pages, not just the loaded one.
pub trait UniverseFetcher: Send + Sync {
    fn fetch_all_ids(
        &self,
        resource: &str,
        filter: &FilterState,
        show_trash: bool,
    ) -> Result<Vec<RecordId>, FetchError>;
}

pub trait BulkActions: Send + Sync {
    fn move_to_trash(&self, ids: &[RecordId]) -> Result<BulkReport, FetchError>;
    fn restore(&self, ids: &[RecordId]) -> Result<BulkReport, FetchError>;
}

pub trait DatasetCatalog: Send + Sync {
    fn init(&self) -> Result<(), FetchError>;
    fn list_datasets(&self) -> Result<Vec<DatasetMeta>, FetchError>;
    fn load_hidden_columns(&self, id: DatasetId) -> Result<BTreeSet<String>, FetchError>;
    fn save_hidden_columns(
        &self,
        id: DatasetId,
        hidden: &BTreeSet<String>,
    ) -> Result<(), FetchError>;
}

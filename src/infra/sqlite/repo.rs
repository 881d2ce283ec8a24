use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::domain::entities::dataset::{DatasetId, DatasetMeta, PageSnapshot};
use crate::domain::entities::pagination::FilterState;
use crate::domain::entities::record::RecordId;
use crate::domain::request_key::{RequestKey, RequestKeyBuilder};
use crate::infra::sqlite::queries::{
    dataset_exists, fetch_all_ids, list_datasets, load_hidden_columns, query_page, set_deleted_at,
    upsert_hidden_columns, PageQuery, TrashUpdate,
};
use crate::infra::sqlite::schema::{init_db, open_connection};
use crate::usecase::ports::repo::{
    BulkActions, BulkReport, DatasetCatalog, FetchError, ItemFailure, RecordSource,
    UniverseFetcher,
};

/// Local SQLite store standing in for the remote dataset.
#[derive(Debug, Clone)]
pub struct SqliteRepo {
    pub db_path: PathBuf,
}

impl SqliteRepo {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    fn resolve(&self, resource: &str) -> Result<DatasetId, FetchError> {
        let dataset_id = DatasetId::from_resource_path(resource)
            .ok_or_else(|| FetchError::UnknownResource(resource.to_string()))?;
        let conn = open_connection(&self.db_path).map_err(FetchError::transient)?;
        if !dataset_exists(&conn, dataset_id.0).map_err(FetchError::transient)? {
            return Err(FetchError::UnknownResource(resource.to_string()));
        }
        Ok(dataset_id)
    }

    fn set_trashed(&self, ids: &[RecordId], trashed: bool) -> Result<BulkReport, FetchError> {
        let mut report = BulkReport::default();
        let mut store_ids = Vec::with_capacity(ids.len());
        for id in ids {
            match id.as_int() {
                Some(value) => store_ids.push(value),
                // The store only ever hands out integer ids.
                None => report.failed.push((id.clone(), ItemFailure::Missing)),
            }
        }

        let stamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let deleted_at = trashed.then_some(stamp.as_str());
        let outcomes =
            set_deleted_at(&self.db_path, &store_ids, deleted_at).map_err(FetchError::transient)?;

        for (record_id, outcome) in outcomes {
            let id = RecordId::Int(record_id);
            match outcome {
                TrashUpdate::Updated => report.succeeded.push(id),
                TrashUpdate::Missing => report.failed.push((id, ItemFailure::Missing)),
                TrashUpdate::AlreadyInState => {
                    let reason = if trashed {
                        "already in trash"
                    } else {
                        "not in trash"
                    };
                    report
                        .failed
                        .push((id, ItemFailure::Rejected(reason.to_string())));
                }
            }
        }
        Ok(report)
    }
}

impl RecordSource for SqliteRepo {
    fn fetch_page(&self, key: &RequestKey) -> Result<PageSnapshot, FetchError> {
        let request = RequestKeyBuilder::parse(key.as_str())?;
        let dataset_id = self.resolve(&request.resource)?;
        let query = PageQuery {
            columns: request.columns,
            page_index: request.page_index,
            page_size: request.page_size,
            filter: request.filter.term().to_string(),
            show_trash: request.show_trash,
        };
        query_page(&self.db_path, dataset_id.0, &query).map_err(FetchError::transient)
    }
}

impl UniverseFetcher for SqliteRepo {
    fn fetch_all_ids(
        &self,
        resource: &str,
        filter: &FilterState,
        show_trash: bool,
    ) -> Result<Vec<RecordId>, FetchError> {
        let dataset_id = self.resolve(resource)?;
        let ids = fetch_all_ids(&self.db_path, dataset_id.0, filter.term(), show_trash)
            .map_err(FetchError::transient)?;
        Ok(ids.into_iter().map(RecordId::Int).collect())
    }
}

impl BulkActions for SqliteRepo {
    fn move_to_trash(&self, ids: &[RecordId]) -> Result<BulkReport, FetchError> {
        self.set_trashed(ids, true)
    }

    fn restore(&self, ids: &[RecordId]) -> Result<BulkReport, FetchError> {
        self.set_trashed(ids, false)
    }
}

impl DatasetCatalog for SqliteRepo {
    fn init(&self) -> Result<(), FetchError> {
        init_db(&self.db_path).map_err(FetchError::transient)
    }

    fn list_datasets(&self) -> Result<Vec<DatasetMeta>, FetchError> {
        list_datasets(&self.db_path).map_err(FetchError::transient)
    }

    fn load_hidden_columns(&self, id: DatasetId) -> Result<BTreeSet<String>, FetchError> {
        load_hidden_columns(&self.db_path, id.0).map_err(FetchError::transient)
    }

    fn save_hidden_columns(
        &self,
        id: DatasetId,
        hidden: &BTreeSet<String>,
    ) -> Result<(), FetchError> {
        upsert_hidden_columns(&self.db_path, id.0, hidden).map_err(FetchError::transient)
    }
}

use std::sync::Arc;

use crate::domain::entities::dataset::PageSnapshot;
use crate::domain::entities::record::RecordId;
use crate::platform::desktop::blocking::run_blocking;
use crate::usecase::ports::repo::{FetchError, RecordSource, UniverseFetcher};
use crate::usecase::services::dataset_view::FetchTicket;
use crate::usecase::services::table_controller::UniverseRequest;

/// Runs page and universe fetches off the UI thread. Results go back through
/// `DatasetView::complete` / `TableController::finish_select_all_in_dataset`,
/// which decide whether they are still wanted.
#[derive(Clone)]
pub struct QueryService {
    records: Arc<dyn RecordSource>,
    universe: Arc<dyn UniverseFetcher>,
}

impl QueryService {
    pub fn new(records: Arc<dyn RecordSource>, universe: Arc<dyn UniverseFetcher>) -> Self {
        Self { records, universe }
    }

    pub async fn fetch_page(&self, ticket: &FetchTicket) -> Result<PageSnapshot, FetchError> {
        let records = self.records.clone();
        let key = ticket.key.clone();
        run_blocking(move || records.fetch_page(&key))
            .await
            .map_err(FetchError::transient)?
    }

    pub async fn fetch_universe(
        &self,
        request: &UniverseRequest,
    ) -> Result<Vec<RecordId>, FetchError> {
        let universe = self.universe.clone();
        let request = request.clone();
        run_blocking(move || {
            universe.fetch_all_ids(&request.resource, &request.filter, request.show_trash)
        })
        .await
        .map_err(FetchError::transient)?
    }
}

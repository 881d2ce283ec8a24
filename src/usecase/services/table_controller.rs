use crate::domain::entities::pagination::{FilterState, PaginationChange, PaginationState};
use crate::domain::entities::record::{Record, RecordId};
use crate::domain::request_key::{RequestKey, RequestKeyBuilder};
use crate::domain::selection::affordance::{CheckboxState, SelectionAffordance};
use crate::domain::selection::model::SelectionModel;
use crate::domain::selection::range::RangeSelector;
use crate::usecase::ports::repo::{BulkReport, FetchError, UniverseFetcher};

/// A "select all in dataset" fetch in flight, stamped with the universe
/// generation it was issued under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniverseRequest {
    pub generation: u64,
    pub resource: String,
    pub filter: FilterState,
    pub show_trash: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UniverseOutcome {
    Applied { added: usize },
    /// The filter, trash flag or dataset changed while the fetch was out.
    Stale,
    Failed(FetchError),
}

/// State of one table instance: query, selection, shift-click cursor and the
/// universe generation.
///
/// The selection and the generation live in the same value and are only
/// changed through `&mut self`, so a universe result is checked and applied
/// in one step.
#[derive(Debug, Clone)]
pub struct TableController {
    resource: String,
    projection: Vec<String>,
    pagination: PaginationState,
    show_trash: bool,
    selection: SelectionModel,
    range: RangeSelector,
    universe_generation: u64,
    pending_universe: Option<u64>,
}

impl TableController {
    /// Starts deferred: no request key until [`TableController::start`].
    pub fn new(resource: impl Into<String>, page_size: i64) -> Self {
        Self {
            resource: resource.into(),
            projection: Vec::new(),
            pagination: PaginationState::uninitialized(page_size),
            show_trash: false,
            selection: SelectionModel::new(),
            range: RangeSelector::new(),
            universe_generation: 0,
            pending_universe: None,
        }
    }

    pub fn start(&mut self) {
        if !self.pagination.is_initialized() {
            self.pagination.set_page(0);
        }
    }

    pub fn pagination(&self) -> &PaginationState {
        &self.pagination
    }

    pub fn show_trash(&self) -> bool {
        self.show_trash
    }

    pub fn selection(&self) -> &SelectionModel {
        &self.selection
    }

    pub fn cursor(&self) -> Option<&RecordId> {
        self.range.cursor()
    }

    pub fn is_universe_pending(&self) -> bool {
        self.pending_universe.is_some()
    }

    /// `None` while the page index is still deferred.
    pub fn request_key(&self) -> Option<RequestKey> {
        if !self.pagination.is_initialized() {
            return None;
        }
        Some(RequestKeyBuilder::build(
            &self.resource,
            &self.pagination,
            self.show_trash,
            &self.projection,
        ))
    }

    pub fn set_page(&mut self, index: i64) {
        self.pagination.set_page(index);
    }

    pub fn set_page_size(&mut self, size: i64) {
        self.pagination.set_page_size(size);
    }

    pub fn set_filter(&mut self, text: &str) {
        if self.pagination.set_filter(text) == PaginationChange::Filter {
            self.invalidate_universe("filter changed");
        }
    }

    /// Switching between live rows and the trash is a different result set:
    /// the selection and cursor start over.
    pub fn set_show_trash(&mut self, show_trash: bool) {
        if self.show_trash == show_trash {
            return;
        }
        self.show_trash = show_trash;
        self.pagination.rewind();
        self.selection.clear_all();
        self.range.reset();
        self.invalidate_universe("trash flag changed");
    }

    pub fn set_projection(&mut self, projection: Vec<String>) {
        self.projection = projection;
    }

    /// Points the table at another dataset. Behaves like a fresh table.
    pub fn set_resource(&mut self, resource: impl Into<String>) {
        let resource = resource.into();
        if resource == self.resource {
            return;
        }
        self.resource = resource;
        self.pagination.set_filter("");
        self.pagination.rewind();
        self.show_trash = false;
        self.teardown();
        self.invalidate_universe("dataset changed");
    }

    /// Ordinary click on a row checkbox.
    pub fn toggle(&mut self, id: &RecordId) -> bool {
        let selected = self.selection.toggle(id);
        self.range.record_interaction(id);
        selected
    }

    /// Row click on the rendered page. Returns how many rows were written.
    pub fn click_row(&mut self, rows: &[Record], id: &RecordId, shift: bool) -> usize {
        if !shift || self.range.cursor().is_none() {
            self.toggle(id);
            return 1;
        }
        let plan = self.range.plan_shift_click(rows, id, &self.selection);
        for target in &plan.ids {
            self.selection.set(target, plan.value);
        }
        plan.ids.len()
    }

    /// Header checkbox: a fully selected page is cleared, anything else is
    /// filled. Returns the page's new state.
    pub fn toggle_page(&mut self, page_ids: &[RecordId]) -> bool {
        if self.selection.is_all_page_selected(page_ids) {
            self.selection.deselect_all_on_page(page_ids);
            false
        } else {
            self.selection.select_all_on_page(page_ids);
            true
        }
    }

    pub fn select_all_on_page(&mut self, page_ids: &[RecordId]) -> usize {
        self.selection.select_all_on_page(page_ids)
    }

    /// Also drops a pending universe: it must not refill a selection the
    /// user just emptied.
    pub fn clear_all(&mut self) -> usize {
        let cleared = self.selection.clear_all();
        tracing::debug!(cleared, "selection cleared");
        self.invalidate_universe("selection cleared");
        cleared
    }

    /// Issues the universe fetch for "select all in dataset". Returns `None`
    /// (nothing to do) when the total is unknown or zero.
    pub fn begin_select_all_in_dataset(
        &mut self,
        total_row_count: Option<u64>,
    ) -> Option<UniverseRequest> {
        match total_row_count {
            Some(total) if total > 0 => {}
            _ => return None,
        }
        self.pending_universe = Some(self.universe_generation);
        Some(UniverseRequest {
            generation: self.universe_generation,
            resource: self.resource.clone(),
            filter: self.pagination.filter().clone(),
            show_trash: self.show_trash,
        })
    }

    /// Applies a universe result, unless the query moved on since it was
    /// issued.
    pub fn finish_select_all_in_dataset(
        &mut self,
        request: &UniverseRequest,
        result: Result<Vec<RecordId>, FetchError>,
    ) -> UniverseOutcome {
        if request.generation != self.universe_generation {
            tracing::debug!(
                issued = request.generation,
                current = self.universe_generation,
                "dropping stale universe"
            );
            return UniverseOutcome::Stale;
        }
        self.pending_universe = None;
        match result {
            Ok(ids) => {
                let added = self.selection.union(ids);
                tracing::debug!(
                    added,
                    selected = self.selection.selected_count(),
                    "universe applied"
                );
                UniverseOutcome::Applied { added }
            }
            Err(err) => {
                tracing::warn!(error = %err, "universe fetch failed");
                UniverseOutcome::Failed(err)
            }
        }
    }

    /// Blocking form of the two steps above. Returns how many ids were added.
    pub fn select_all_in_dataset(
        &mut self,
        total_row_count: Option<u64>,
        fetcher: &dyn UniverseFetcher,
    ) -> Result<usize, FetchError> {
        let Some(request) = self.begin_select_all_in_dataset(total_row_count) else {
            return Ok(0);
        };
        let result = fetcher.fetch_all_ids(&request.resource, &request.filter, request.show_trash);
        match self.finish_select_all_in_dataset(&request, result) {
            UniverseOutcome::Applied { added } => Ok(added),
            UniverseOutcome::Stale => Ok(0),
            UniverseOutcome::Failed(err) => Err(err),
        }
    }

    /// Drops ids a bulk action finished with: the ones that went through and
    /// the ones the store no longer has. Returns how many were deselected.
    pub fn apply_bulk_report(&mut self, report: &BulkReport) -> usize {
        let done = report.succeeded.iter().chain(report.missing());
        self.selection.deselect_all_on_page(done)
    }

    pub fn header_checkbox(&self, page_ids: &[RecordId]) -> CheckboxState {
        CheckboxState::derive(
            self.selection.is_all_page_selected(page_ids),
            self.selection.is_any_page_selected(page_ids),
        )
    }

    pub fn affordance(&self, page_ids: &[RecordId], total_row_count: u64) -> SelectionAffordance {
        SelectionAffordance::derive(
            self.selection.is_all_page_selected(page_ids),
            self.selection.selected_count(),
            total_row_count,
        )
    }

    pub fn is_all_dataset_selected(&self, total_row_count: u64) -> bool {
        self.selection.is_all_dataset_selected(total_row_count)
    }

    /// Table instance torn down: the shift-click cursor does not survive.
    pub fn teardown(&mut self) {
        self.range.reset();
        self.selection.clear_all();
    }

    fn invalidate_universe(&mut self, reason: &'static str) {
        self.universe_generation += 1;
        if self.pending_universe.take().is_some() {
            tracing::debug!(reason, "pending universe invalidated");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecase::ports::repo::ItemFailure;

    fn rows(ids: std::ops::Range<i64>) -> Vec<Record> {
        ids.map(|id| Record::new(id, vec![format!("part-{id}")]))
            .collect()
    }

    fn ids_of(rows: &[Record]) -> Vec<RecordId> {
        rows.iter().map(|row| row.id.clone()).collect()
    }

    struct FixedUniverse(Vec<RecordId>);

    impl UniverseFetcher for FixedUniverse {
        fn fetch_all_ids(
            &self,
            _resource: &str,
            _filter: &FilterState,
            _show_trash: bool,
        ) -> Result<Vec<RecordId>, FetchError> {
            Ok(self.0.clone())
        }
    }

    fn started() -> TableController {
        let mut controller = TableController::new("/datasets/1/records", 10);
        controller.start();
        controller
    }

    #[test]
    fn deferred_until_started() {
        let mut controller = TableController::new("/datasets/1/records", 10);
        assert_eq!(controller.request_key(), None);

        controller.start();

        assert_eq!(
            controller.request_key().map(String::from).as_deref(),
            Some("/datasets/1/records?columns=&pageIndex=1&pageSize=10")
        );
    }

    #[test]
    fn selection_survives_page_navigation() {
        let mut controller = started();
        let page_one = rows(0..10);
        let page_two = rows(10..20);

        for row in &page_one[..3] {
            controller.click_row(&page_one, &row.id, false);
        }
        controller.set_page(1);
        for row in &page_two[..2] {
            controller.click_row(&page_two, &row.id, false);
        }

        assert_eq!(controller.selection().selected_count(), 5);
    }

    #[test]
    fn shift_click_selects_contiguous_range() {
        let mut controller = started();
        let page = rows(0..10);

        controller.click_row(&page, &RecordId::Int(2), false);
        let written = controller.click_row(&page, &RecordId::Int(5), true);

        assert_eq!(written, 4);
        assert_eq!(
            controller.selection().to_vec(),
            (2..=5).map(RecordId::Int).collect::<Vec<_>>()
        );
    }

    #[test]
    fn shift_click_without_cursor_is_a_plain_toggle() {
        let mut controller = started();
        let page = rows(0..10);

        controller.click_row(&page, &RecordId::Int(4), true);

        assert_eq!(controller.selection().to_vec(), vec![RecordId::Int(4)]);
        assert_eq!(controller.cursor(), Some(&RecordId::Int(4)));
    }

    #[test]
    fn header_checkbox_toggles_page() {
        let mut controller = started();
        let page = ids_of(&rows(0..10));

        assert_eq!(controller.header_checkbox(&page), CheckboxState::Unchecked);
        controller.toggle(&page[0]);
        assert_eq!(controller.header_checkbox(&page), CheckboxState::Indeterminate);
        assert!(controller.toggle_page(&page));
        assert_eq!(controller.header_checkbox(&page), CheckboxState::Checked);
        assert!(!controller.toggle_page(&page));
        assert_eq!(controller.selection().selected_count(), 0);
    }

    #[test]
    fn select_all_in_dataset_applies_universe() {
        let mut controller = started();
        let universe = FixedUniverse((0..100).map(RecordId::Int).collect());

        let added = controller
            .select_all_in_dataset(Some(100), &universe)
            .expect("universe fetch should succeed");

        assert_eq!(added, 100);
        assert_eq!(controller.selection().selected_count(), 100);
        assert!(controller.is_all_dataset_selected(100));
        assert!(!controller.is_universe_pending());
    }

    #[test]
    fn select_all_in_dataset_is_noop_without_total() {
        let mut controller = started();
        let universe = FixedUniverse(vec![RecordId::Int(1)]);

        assert_eq!(controller.select_all_in_dataset(None, &universe), Ok(0));
        assert_eq!(controller.select_all_in_dataset(Some(0), &universe), Ok(0));
        assert_eq!(controller.selection().selected_count(), 0);
    }

    #[test]
    fn filter_change_discards_outstanding_universe() {
        let mut controller = started();
        let request = controller
            .begin_select_all_in_dataset(Some(100))
            .expect("request should be issued");
        assert!(controller.is_universe_pending());

        controller.set_filter("bolt");
        let outcome = controller
            .finish_select_all_in_dataset(&request, Ok((0..100).map(RecordId::Int).collect()));

        assert_eq!(outcome, UniverseOutcome::Stale);
        assert_eq!(controller.selection().selected_count(), 0);
        assert!(!controller.is_universe_pending());
    }

    #[test]
    fn clearing_selection_discards_outstanding_universe() {
        let mut controller = started();
        let request = controller
            .begin_select_all_in_dataset(Some(100))
            .expect("request should be issued");

        controller.toggle(&RecordId::Int(7));
        assert_eq!(controller.clear_all(), 1);
        assert!(!controller.is_universe_pending());

        let outcome = controller
            .finish_select_all_in_dataset(&request, Ok((0..100).map(RecordId::Int).collect()));

        assert_eq!(outcome, UniverseOutcome::Stale);
        assert!(controller.selection().is_empty());
    }

    #[test]
    fn pagination_only_changes_keep_universe_valid() {
        let mut controller = started();
        let request = controller
            .begin_select_all_in_dataset(Some(3))
            .expect("request should be issued");

        controller.set_page(2);
        controller.set_page_size(50);
        let outcome = controller.finish_select_all_in_dataset(
            &request,
            Ok(vec![RecordId::Int(1), RecordId::Int(2), RecordId::Int(3)]),
        );

        assert_eq!(outcome, UniverseOutcome::Applied { added: 3 });
    }

    #[test]
    fn failed_universe_leaves_selection_untouched() {
        let mut controller = started();
        controller.toggle(&RecordId::Int(7));
        let request = controller
            .begin_select_all_in_dataset(Some(10))
            .expect("request should be issued");

        let outcome = controller
            .finish_select_all_in_dataset(&request, Err(FetchError::transient("timeout")));

        assert!(matches!(outcome, UniverseOutcome::Failed(_)));
        assert_eq!(controller.selection().to_vec(), vec![RecordId::Int(7)]);
        assert!(!controller.is_universe_pending());
    }

    #[test]
    fn trash_toggle_starts_selection_over() {
        let mut controller = started();
        controller.set_page(3);
        controller.toggle(&RecordId::Int(1));

        controller.set_show_trash(true);

        assert!(controller.selection().is_empty());
        assert_eq!(controller.cursor(), None);
        assert_eq!(controller.pagination().page_index(), 0);
        assert!(controller
            .request_key()
            .is_some_and(|key| key.as_str().starts_with("/datasets/1/records/trash?")));
    }

    #[test]
    fn bulk_report_deselects_done_and_missing_ids() {
        let mut controller = started();
        controller.select_all_on_page(&[RecordId::Int(1), RecordId::Int(2), RecordId::Int(3)]);
        let report = BulkReport {
            succeeded: vec![RecordId::Int(1)],
            failed: vec![
                (RecordId::Int(2), ItemFailure::Missing),
                (RecordId::Int(3), ItemFailure::Rejected("locked".to_string())),
            ],
        };

        assert_eq!(controller.apply_bulk_report(&report), 2);
        assert_eq!(controller.selection().to_vec(), vec![RecordId::Int(3)]);
    }

    #[test]
    fn affordance_follows_selection() {
        let mut controller = started();
        let page = ids_of(&rows(0..10));

        assert_eq!(controller.affordance(&page, 100), SelectionAffordance::SelectPage);
        controller.toggle_page(&page);
        assert_eq!(
            controller.affordance(&page, 100),
            SelectionAffordance::SelectDataset { total: 100 }
        );
        controller.toggle(&page[0]);
        assert_eq!(
            controller.affordance(&page, 100),
            SelectionAffordance::ClearSelection { count: 9 }
        );
    }
}

use std::collections::BTreeSet;

use crate::domain::entities::record::RecordId;

/// Set of selected record identifiers.
///
/// Only selected ids are stored; an absent id is unselected. Ids are never
/// pruned eagerly when a record disappears from the dataset, consumers that
/// act on the selection deal with missing ids per item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionModel {
    selected: BTreeSet<RecordId>,
}

impl SelectionModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_selected(&self, id: &RecordId) -> bool {
        self.selected.contains(id)
    }

    /// Flips one id. Returns the new state.
    pub fn toggle(&mut self, id: &RecordId) -> bool {
        if self.selected.remove(id) {
            false
        } else {
            self.selected.insert(id.clone());
            true
        }
    }

    pub fn set(&mut self, id: &RecordId, selected: bool) {
        if selected {
            self.selected.insert(id.clone());
        } else {
            self.selected.remove(id);
        }
    }

    /// Marks every id of the page as selected, leaving other ids alone.
    /// Returns how many were newly selected.
    pub fn select_all_on_page<'a>(
        &mut self,
        page_ids: impl IntoIterator<Item = &'a RecordId>,
    ) -> usize {
        page_ids
            .into_iter()
            .filter(|id| self.selected.insert((*id).clone()))
            .count()
    }

    pub fn deselect_all_on_page<'a>(
        &mut self,
        page_ids: impl IntoIterator<Item = &'a RecordId>,
    ) -> usize {
        page_ids
            .into_iter()
            .filter(|id| self.selected.remove(*id))
            .count()
    }

    /// Unions a fetched universe into the selection. Returns how many ids
    /// were newly selected.
    pub fn union(&mut self, ids: impl IntoIterator<Item = RecordId>) -> usize {
        ids.into_iter().filter(|id| self.selected.insert(id.clone())).count()
    }

    /// Empties the selection and returns how many ids were cleared.
    pub fn clear_all(&mut self) -> usize {
        let cleared = self.selected.len();
        self.selected.clear();
        cleared
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// An empty page is never fully selected.
    pub fn is_all_page_selected(&self, page_ids: &[RecordId]) -> bool {
        !page_ids.is_empty() && page_ids.iter().all(|id| self.selected.contains(id))
    }

    pub fn is_any_page_selected(&self, page_ids: &[RecordId]) -> bool {
        page_ids.iter().any(|id| self.selected.contains(id))
    }

    /// Exact equality: a drifted count (more ids than rows) is not "all".
    pub fn is_all_dataset_selected(&self, total_row_count: u64) -> bool {
        self.selected.len() as u64 == total_row_count
    }

    pub fn to_vec(&self) -> Vec<RecordId> {
        self.selected.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[i64]) -> Vec<RecordId> {
        values.iter().copied().map(RecordId::from).collect()
    }

    #[test]
    fn toggle_flips_and_never_keeps_unselected_entries() {
        let mut model = SelectionModel::new();
        let id = RecordId::Int(7);

        assert!(model.toggle(&id));
        assert_eq!(model.selected_count(), 1);
        assert!(!model.toggle(&id));
        assert_eq!(model.selected_count(), 0);
        assert!(model.is_empty());
    }

    #[test]
    fn select_all_on_page_is_idempotent() {
        let page = ids(&[1, 2, 3]);
        let mut once = SelectionModel::new();
        once.select_all_on_page(&page);

        let mut twice = SelectionModel::new();
        assert_eq!(twice.select_all_on_page(&page), 3);
        assert_eq!(twice.select_all_on_page(&page), 0);

        assert_eq!(once, twice);
    }

    #[test]
    fn select_all_on_page_leaves_other_ids_alone() {
        let mut model = SelectionModel::new();
        model.toggle(&RecordId::Int(99));

        model.select_all_on_page(&ids(&[1, 2]));

        assert!(model.is_selected(&RecordId::Int(99)));
        assert_eq!(model.selected_count(), 3);
    }

    #[test]
    fn clear_all_reports_cleared_count() {
        let mut model = SelectionModel::new();
        model.select_all_on_page(&ids(&[1, 2, 3, 4]));

        assert_eq!(model.clear_all(), 4);
        assert_eq!(model.selected_count(), 0);
        assert_eq!(model.clear_all(), 0);
    }

    #[test]
    fn all_page_selected_requires_every_id() {
        let mut model = SelectionModel::new();
        let page = ids(&[1, 2, 3]);
        model.select_all_on_page(&ids(&[1, 2]));

        assert!(!model.is_all_page_selected(&page));
        model.toggle(&RecordId::Int(3));
        assert!(model.is_all_page_selected(&page));
        assert!(!model.is_all_page_selected(&[]));
    }

    #[test]
    fn all_dataset_selected_uses_exact_count() {
        let mut model = SelectionModel::new();
        model.union((0..42_i64).map(RecordId::Int));

        assert!(model.is_all_dataset_selected(42));
        assert!(!model.is_all_dataset_selected(43));
        assert!(!model.is_all_dataset_selected(41));

        model.toggle(&RecordId::Int(0));
        assert!(!model.is_all_dataset_selected(42));
    }

    #[test]
    fn mixed_identifier_kinds_coexist() {
        let mut model = SelectionModel::new();
        model.toggle(&RecordId::Int(1));
        model.toggle(&RecordId::from("1"));

        assert_eq!(model.selected_count(), 2);
    }
}

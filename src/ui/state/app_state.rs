use std::collections::BTreeSet;

use dioxus::prelude::{use_signal, Signal};

use crate::domain::entities::dataset::{DatasetId, DatasetMeta};
use crate::domain::entities::record::RecordId;
use crate::usecase::services::dataset_view::DatasetView;
use crate::usecase::services::table_controller::TableController;

/// Layout flags of one table view: hidden columns, expanded detail rows and
/// the collapsed toolbar. Built by the root view and handed down as a prop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutStore {
    hidden_columns: BTreeSet<String>,
    expanded_rows: BTreeSet<RecordId>,
    toolbar_collapsed: bool,
}

impl LayoutStore {
    pub fn new(hidden_columns: BTreeSet<String>) -> Self {
        Self {
            hidden_columns,
            ..Self::default()
        }
    }

    pub fn hidden_columns(&self) -> &BTreeSet<String> {
        &self.hidden_columns
    }

    pub fn is_hidden(&self, column: &str) -> bool {
        self.hidden_columns.contains(column)
    }

    /// Flips a column's visibility. Hiding the last visible column is
    /// refused. Returns whether anything changed.
    pub fn toggle_column(&mut self, column: &str, all_columns: &[String]) -> bool {
        if self.hidden_columns.remove(column) {
            return true;
        }
        let visible = all_columns
            .iter()
            .filter(|name| !self.hidden_columns.contains(*name))
            .count();
        if visible <= 1 {
            return false;
        }
        self.hidden_columns.insert(column.to_string())
    }

    /// Visible columns in dataset order. This is the request projection.
    pub fn projection(&self, all_columns: &[String]) -> Vec<String> {
        all_columns
            .iter()
            .filter(|name| !self.hidden_columns.contains(*name))
            .cloned()
            .collect()
    }

    pub fn is_expanded(&self, id: &RecordId) -> bool {
        self.expanded_rows.contains(id)
    }

    pub fn toggle_expanded(&mut self, id: &RecordId) {
        if !self.expanded_rows.remove(id) {
            self.expanded_rows.insert(id.clone());
        }
    }

    pub fn toolbar_collapsed(&self) -> bool {
        self.toolbar_collapsed
    }

    pub fn toggle_toolbar(&mut self) {
        self.toolbar_collapsed = !self.toolbar_collapsed;
    }
}

#[derive(Clone, Copy)]
pub struct AppState {
    pub datasets: Signal<Vec<DatasetMeta>>,
    pub selected_dataset_id: Signal<Option<DatasetId>>,
    pub controller: Signal<TableController>,
    pub view: Signal<DatasetView>,
    pub layout: Signal<LayoutStore>,
    pub filter_input: Signal<String>,
    pub busy: Signal<bool>,
    pub status: Signal<String>,
}

impl AppState {
    pub fn new(page_size: i64) -> Self {
        Self {
            datasets: use_signal(Vec::<DatasetMeta>::new),
            selected_dataset_id: use_signal(|| None::<DatasetId>),
            controller: use_signal(|| TableController::new("", page_size)),
            view: use_signal(DatasetView::new),
            layout: use_signal(LayoutStore::default),
            filter_input: use_signal(String::new),
            busy: use_signal(|| false),
            status: use_signal(|| "Ready".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> Vec<String> {
        ["part", "desc", "qty"].iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn projection_skips_hidden_columns_in_order() {
        let mut layout = LayoutStore::default();
        layout.toggle_column("desc", &columns());

        assert_eq!(layout.projection(&columns()), vec!["part", "qty"]);
    }

    #[test]
    fn last_visible_column_cannot_be_hidden() {
        let mut layout = LayoutStore::default();
        assert!(layout.toggle_column("part", &columns()));
        assert!(layout.toggle_column("desc", &columns()));

        assert!(!layout.toggle_column("qty", &columns()));
        assert_eq!(layout.projection(&columns()), vec!["qty"]);

        assert!(layout.toggle_column("part", &columns()));
        assert!(!layout.is_hidden("part"));
    }

    #[test]
    fn expanded_rows_toggle() {
        let mut layout = LayoutStore::default();
        let id = RecordId::Int(4);

        layout.toggle_expanded(&id);
        assert!(layout.is_expanded(&id));
        layout.toggle_expanded(&id);
        assert!(!layout.is_expanded(&id));
    }

    #[test]
    fn separate_instances_do_not_share_state() {
        let mut first = LayoutStore::default();
        let second = LayoutStore::default();

        first.toggle_toolbar();

        assert!(first.toolbar_collapsed());
        assert!(!second.toolbar_collapsed());
    }
}

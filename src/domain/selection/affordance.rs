/// Header checkbox tri-state for the visible page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckboxState {
    Checked,
    Indeterminate,
    Unchecked,
}

impl CheckboxState {
    pub fn derive(all_page_selected: bool, any_page_selected: bool) -> Self {
        if all_page_selected {
            CheckboxState::Checked
        } else if any_page_selected {
            CheckboxState::Indeterminate
        } else {
            CheckboxState::Unchecked
        }
    }
}

/// The one bulk-selection action the banner offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionAffordance {
    /// Nothing is selected yet: offer "select all on this page".
    SelectPage,
    /// The page is fully selected but the dataset is larger.
    SelectDataset { total: u64 },
    /// Something is selected but not everything; show the literal count.
    ClearSelection { count: usize },
    /// Empty dataset, or every row in it is already selected.
    None,
}

impl SelectionAffordance {
    /// Pure function of the three inputs; the table keeps no extra state for
    /// the banner.
    pub fn derive(all_page_selected: bool, selected_count: usize, total_row_count: u64) -> Self {
        let count = selected_count as u64;
        if total_row_count == 0 {
            return SelectionAffordance::None;
        }
        if all_page_selected && count < total_row_count {
            return SelectionAffordance::SelectDataset {
                total: total_row_count,
            };
        }
        if selected_count > 0 && count != total_row_count {
            return SelectionAffordance::ClearSelection {
                count: selected_count,
            };
        }
        if selected_count == 0 {
            return SelectionAffordance::SelectPage;
        }
        SelectionAffordance::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkbox_tri_state() {
        assert_eq!(CheckboxState::derive(true, true), CheckboxState::Checked);
        assert_eq!(CheckboxState::derive(false, true), CheckboxState::Indeterminate);
        assert_eq!(CheckboxState::derive(false, false), CheckboxState::Unchecked);
    }

    #[test]
    fn full_page_of_larger_dataset_offers_dataset_selection() {
        assert_eq!(
            SelectionAffordance::derive(true, 10, 100),
            SelectionAffordance::SelectDataset { total: 100 }
        );
    }

    #[test]
    fn partial_selection_offers_clear_with_count() {
        assert_eq!(
            SelectionAffordance::derive(false, 3, 100),
            SelectionAffordance::ClearSelection { count: 3 }
        );
    }

    #[test]
    fn empty_selection_offers_page_selection() {
        assert_eq!(
            SelectionAffordance::derive(false, 0, 100),
            SelectionAffordance::SelectPage
        );
    }

    #[test]
    fn everything_selected_or_empty_dataset_offers_nothing() {
        assert_eq!(
            SelectionAffordance::derive(true, 100, 100),
            SelectionAffordance::None
        );
        assert_eq!(SelectionAffordance::derive(false, 0, 0), SelectionAffordance::None);
    }

    #[test]
    fn drifted_count_above_total_still_offers_clear() {
        assert_eq!(
            SelectionAffordance::derive(true, 101, 100),
            SelectionAffordance::ClearSelection { count: 101 }
        );
    }
}

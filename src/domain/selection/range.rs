use crate::domain::entities::record::{Record, RecordId};
use crate::domain::selection::model::SelectionModel;

/// Remembers the last ordinary click so a later shift-click can extend from
/// it. Ranges are never cached: every expansion scans the page as it is
/// rendered right now, because sorting and paging reorder rows between clicks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeSelector {
    cursor: Option<RecordId>,
}

/// Ids to update and the single value to write to all of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeToggle {
    pub ids: Vec<RecordId>,
    pub value: bool,
}

impl RangeSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call after every non-shift click.
    pub fn record_interaction(&mut self, id: &RecordId) {
        self.cursor = Some(id.clone());
    }

    pub fn cursor(&self) -> Option<&RecordId> {
        self.cursor.as_ref()
    }

    pub fn reset(&mut self) {
        self.cursor = None;
    }

    /// Inclusive run of `rows` between `from_id` and `to_id`, in render order,
    /// whichever endpoint comes first.
    ///
    /// If either endpoint is not on the page, only the `from_id` row is
    /// returned (or nothing if that is missing too). Without this guard a scan
    /// that finds one endpoint but never the other would sweep the rest of
    /// the page.
    pub fn expand_range<'a>(
        rows: &'a [Record],
        from_id: &RecordId,
        to_id: &RecordId,
    ) -> Vec<&'a Record> {
        let has = |id: &RecordId| rows.iter().any(|row| &row.id == id);
        if !has(from_id) || !has(to_id) {
            return rows.iter().filter(|row| &row.id == from_id).take(1).collect();
        }

        let mut range = Vec::new();
        let mut closing: Option<&RecordId> = None;
        for row in rows {
            match closing {
                None => {
                    if &row.id == from_id || &row.id == to_id {
                        range.push(row);
                        if from_id == to_id {
                            break;
                        }
                        closing = Some(if &row.id == from_id { to_id } else { from_id });
                    }
                }
                Some(end) => {
                    range.push(row);
                    if &row.id == end {
                        break;
                    }
                }
            }
        }
        range
    }

    /// Works out what a shift-click on `clicked` does to the page.
    ///
    /// The range runs from `clicked` back to the cursor. Every row in it gets
    /// the cursor row's current value, so the gesture extends whatever the
    /// last click did; shift-clicking the cursor row itself flips it. With no
    /// usable cursor the click degrades to a plain toggle of `clicked`.
    pub fn plan_shift_click(
        &self,
        rows: &[Record],
        clicked: &RecordId,
        selection: &SelectionModel,
    ) -> RangeToggle {
        let single = || RangeToggle {
            ids: vec![clicked.clone()],
            value: !selection.is_selected(clicked),
        };

        let Some(anchor) = self.cursor.as_ref() else {
            return single();
        };
        if anchor == clicked || !rows.iter().any(|row| &row.id == anchor) {
            return single();
        }

        let ids = Self::expand_range(rows, clicked, anchor)
            .into_iter()
            .map(|row| row.id.clone())
            .collect();
        RangeToggle {
            ids,
            value: selection.is_selected(anchor),
        }
    }
}

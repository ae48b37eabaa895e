//! Multi-row selection over the matrix
//!
//! Rows are selected by requirement id, so a selection survives a refresh
//! that reorders rows. Range extension works on row positions relative to
//! the last clicked row (the anchor).

use std::collections::BTreeSet;

use crate::models::TraceabilityItem;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowSelection {
    selected: BTreeSet<String>,
    anchor: Option<usize>,
}

impl RowSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle a click on the row at `index`.
    ///
    /// The clicked row's id is toggled. With `extend_range` and an existing
    /// anchor, every non-orphan row between the anchor and `index` is then
    /// added. Clicks on orphan rows or past the end of `rows` are ignored and
    /// leave the anchor where it was.
    pub fn select_row(&mut self, rows: &[TraceabilityItem], index: usize, extend_range: bool) {
        let Some(id) = rows.get(index).and_then(TraceabilityItem::requirement_id) else {
            return;
        };

        if !self.selected.remove(id) {
            self.selected.insert(id.to_string());
        }

        if extend_range {
            if let Some(anchor) = self.anchor {
                let (start, end) = (anchor.min(index), anchor.max(index));
                let ids = rows[start..=end.min(rows.len() - 1)]
                    .iter()
                    .filter_map(TraceabilityItem::requirement_id)
                    .map(ToString::to_string);
                self.selected.extend(ids);
            }
        }

        self.anchor = Some(index);
    }

    /// Clear a non-empty selection, otherwise select every non-orphan row
    pub fn toggle_select_all(&mut self, rows: &[TraceabilityItem]) {
        if self.selected.is_empty() {
            self.selected = rows
                .iter()
                .filter_map(TraceabilityItem::requirement_id)
                .map(ToString::to_string)
                .collect();
        } else {
            self.selected.clear();
        }
    }

    pub fn is_selected(&self, requirement_id: &str) -> bool {
        self.selected.contains(requirement_id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.selected.iter().map(String::as_str)
    }

    /// The selected rows, in table order
    pub fn selected_rows<'a>(&self, rows: &'a [TraceabilityItem]) -> Vec<&'a TraceabilityItem> {
        rows.iter()
            .filter(|row| row.requirement_id().is_some_and(|id| self.is_selected(id)))
            .collect()
    }

    pub fn anchor(&self) -> Option<usize> {
        self.anchor
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn clear(&mut self) {
        self.selected.clear();
        self.anchor = None;
    }

    /// Drop ids whose rows are gone. The anchor is reset when it no longer
    /// points inside the table.
    pub fn prune(&mut self, rows: &[TraceabilityItem]) {
        let present: BTreeSet<&str> = rows
            .iter()
            .filter_map(TraceabilityItem::requirement_id)
            .collect();
        self.selected.retain(|id| present.contains(id.as_str()));
        if self.anchor.is_some_and(|a| a >= rows.len()) {
            self.anchor = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Requirement;

    fn rows(ids: &[Option<&str>]) -> Vec<TraceabilityItem> {
        ids.iter()
            .map(|id| match id {
                Some(id) => TraceabilityItem::for_requirement(Requirement::new(*id, "text")),
                None => TraceabilityItem::default(),
            })
            .collect()
    }

    fn selected(selection: &RowSelection) -> Vec<&str> {
        selection.ids().collect()
    }

    #[test]
    fn test_plain_clicks_toggle() {
        let rows = rows(&[Some("R1"), Some("R2"), Some("R3")]);
        let mut selection = RowSelection::new();

        // R1 clicked three times, R2 twice, R3 once
        for index in [0, 1, 0, 2, 1, 0] {
            selection.select_row(&rows, index, false);
        }
        assert_eq!(selected(&selection), vec!["R1", "R3"]);
        assert_eq!(selection.anchor(), Some(0));
    }

    #[test]
    fn test_shift_click_selects_range() {
        let rows = rows(&[Some("R1"), Some("R2"), Some("R3")]);
        let mut selection = RowSelection::new();

        selection.select_row(&rows, 0, false);
        selection.select_row(&rows, 2, true);
        assert_eq!(selected(&selection), vec!["R1", "R2", "R3"]);

        selection.toggle_select_all(&rows);
        assert!(selection.is_empty());
    }

    #[test]
    fn test_shift_click_backwards_skips_orphans() {
        let rows = rows(&[Some("R1"), None, Some("R3"), Some("R4"), Some("R5")]);
        let mut selection = RowSelection::new();

        selection.select_row(&rows, 3, false);
        selection.select_row(&rows, 0, true);
        assert_eq!(selected(&selection), vec!["R1", "R3", "R4"]);
        assert!(!selection.is_selected("R5"));
    }

    #[test]
    fn test_shift_click_without_anchor_is_plain_toggle() {
        let rows = rows(&[Some("R1"), Some("R2"), Some("R3")]);
        let mut selection = RowSelection::new();

        selection.select_row(&rows, 2, true);
        assert_eq!(selected(&selection), vec!["R3"]);
        assert_eq!(selection.anchor(), Some(2));
    }

    #[test]
    fn test_shift_click_on_selected_row_keeps_it() {
        let rows = rows(&[Some("R1"), Some("R2"), Some("R3")]);
        let mut selection = RowSelection::new();

        selection.select_row(&rows, 2, false);
        selection.select_row(&rows, 0, false);
        assert_eq!(selected(&selection), vec!["R1", "R3"]);
        assert_eq!(selection.anchor(), Some(0));

        selection.select_row(&rows, 2, true);
        assert!(selection.is_selected("R3"));
        assert_eq!(selected(&selection), vec!["R1", "R2", "R3"]);
        assert_eq!(selection.anchor(), Some(2));
    }

    #[test]
    fn test_shift_click_on_anchor_row_keeps_it() {
        let rows = rows(&[Some("R1"), Some("R2"), Some("R3")]);
        let mut selection = RowSelection::new();

        selection.select_row(&rows, 1, false);
        selection.select_row(&rows, 1, true);
        assert_eq!(selected(&selection), vec!["R2"]);
        assert_eq!(selection.anchor(), Some(1));
    }

    #[test]
    fn test_orphan_and_out_of_range_clicks_are_ignored() {
        let rows = rows(&[Some("R1"), None]);
        let mut selection = RowSelection::new();
        selection.select_row(&rows, 0, false);

        selection.select_row(&rows, 1, false);
        selection.select_row(&rows, 7, true);
        assert_eq!(selected(&selection), vec!["R1"]);
        assert_eq!(selection.anchor(), Some(0));
    }

    #[test]
    fn test_toggle_select_all() {
        let rows = rows(&[Some("R1"), None, Some("R3")]);
        let mut selection = RowSelection::new();

        selection.toggle_select_all(&rows);
        assert_eq!(selected(&selection), vec!["R1", "R3"]);
        selection.toggle_select_all(&rows);
        assert!(selection.is_empty());

        selection.select_row(&rows, 2, false);
        selection.toggle_select_all(&rows);
        assert!(selection.is_empty());
    }

    #[test]
    fn test_selected_rows_in_table_order() {
        let rows = rows(&[Some("B"), Some("A"), Some("C")]);
        let mut selection = RowSelection::new();
        selection.select_row(&rows, 2, false);
        selection.select_row(&rows, 0, false);

        let ids: Vec<_> = selection
            .selected_rows(&rows)
            .into_iter()
            .filter_map(TraceabilityItem::requirement_id)
            .collect();
        assert_eq!(ids, vec!["B", "C"]);
        assert_eq!(selection.len(), 2);
    }

    #[test]
    fn test_prune_drops_missing_rows() {
        let before = rows(&[Some("R1"), Some("R2"), Some("R3")]);
        let mut selection = RowSelection::new();
        selection.toggle_select_all(&before);
        selection.select_row(&before, 2, false);
        selection.select_row(&before, 2, false);

        let after = rows(&[Some("R1")]);
        selection.prune(&after);
        assert_eq!(selected(&selection), vec!["R1"]);
        assert_eq!(selection.anchor(), None);

        selection.clear();
        assert!(selection.is_empty());
    }
}

//! Selection and scroll bookkeeping for a list of rows.

pub struct ScrollableList<T> {
    pub items: Vec<T>,
    pub selected: usize,
    pub scroll_offset: usize,
}

impl<T> Default for ScrollableList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ScrollableList<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            selected: 0,
            scroll_offset: 0,
        }
    }

    /// Replace the rows. Selection is clamped, not reset, so re-rendering
    /// a card in place does not jump the cursor.
    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
        if self.selected >= self.items.len() {
            self.selected = self.items.len().saturating_sub(1);
        }
        if self.scroll_offset > self.selected {
            self.scroll_offset = self.selected;
        }
    }

    pub fn select_up(&mut self, n: usize) {
        self.selected = self.selected.saturating_sub(n);
    }

    pub fn select_down(&mut self, n: usize) {
        if self.items.is_empty() {
            return;
        }
        self.selected = (self.selected + n).min(self.items.len() - 1);
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
        self.scroll_offset = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.items.len().saturating_sub(1);
    }

    pub fn select(&mut self, index: usize) {
        if index < self.items.len() {
            self.selected = index;
        }
    }

    pub fn selected_item(&self) -> Option<&T> {
        self.items.get(self.selected)
    }

    /// Keep the selection inside a window of `height` rows.
    pub fn ensure_visible(&mut self, height: usize) {
        if height == 0 {
            return;
        }
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        } else if self.selected >= self.scroll_offset + height {
            self.scroll_offset = self.selected + 1 - height;
        }
    }

    /// `(index, item)` pairs for the rows currently in view.
    pub fn visible_items(&self, height: usize) -> Vec<(usize, &T)> {
        let start = self.scroll_offset.min(self.items.len());
        let end = (start + height).min(self.items.len());
        (start..end).map(|i| (i, &self.items[i])).collect()
    }

    /// Index of the item at `row` (0 = first visible row), if any.
    pub fn index_at_row(&self, row: usize) -> Option<usize> {
        let target = self.scroll_offset + row;
        (target < self.items.len()).then_some(target)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(n: usize) -> ScrollableList<usize> {
        let mut l = ScrollableList::new();
        l.set_items((0..n).collect());
        l
    }

    #[test]
    fn scrolls_to_keep_selection_visible() {
        let mut l = list(10);
        l.select_down(6);
        l.ensure_visible(4);
        assert_eq!(l.scroll_offset, 3);
        assert_eq!(l.visible_items(4).first().map(|(i, _)| *i), Some(3));

        l.select_up(5);
        l.ensure_visible(4);
        assert_eq!(l.scroll_offset, 1);
    }

    #[test]
    fn click_rows_map_through_offset() {
        let mut l = list(10);
        l.scroll_offset = 5;
        assert_eq!(l.index_at_row(2), Some(7));
        assert_eq!(l.index_at_row(5), None);
    }

    #[test]
    fn shrinking_clamps_selection() {
        let mut l = list(10);
        l.select_last();
        l.set_items(vec![1, 2, 3]);
        assert_eq!(l.selected, 2);
        l.set_items(Vec::new());
        assert_eq!(l.selected_item(), None);
        l.select_down(1);
        assert_eq!(l.selected, 0);
    }
}

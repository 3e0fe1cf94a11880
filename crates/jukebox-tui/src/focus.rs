//! FocusRing: keyboard focus cycling between panes.

use crate::action::ComponentId;

pub struct FocusRing {
    items: Vec<ComponentId>,
    current: usize,
}

impl FocusRing {
    pub fn new(items: Vec<ComponentId>) -> Self {
        Self { items, current: 0 }
    }

    pub fn current(&self) -> Option<ComponentId> {
        self.items.get(self.current).copied()
    }

    pub fn next(&mut self) -> Option<ComponentId> {
        if self.items.is_empty() {
            return None;
        }
        self.current = (self.current + 1) % self.items.len();
        self.current()
    }

    pub fn prev(&mut self) -> Option<ComponentId> {
        if self.items.is_empty() {
            return None;
        }
        self.current = self.current.checked_sub(1).unwrap_or(self.items.len() - 1);
        self.current()
    }

    pub fn set(&mut self, id: ComponentId) {
        if let Some(pos) = self.items.iter().position(|&x| x == id) {
            self.current = pos;
        }
    }

    pub fn is_focused(&self, id: ComponentId) -> bool {
        self.current() == Some(id)
    }

    /// Swap the ring contents (the playlist pane leaves when the drawer
    /// closes), keeping focus on the same pane when it is still present.
    pub fn set_items(&mut self, items: Vec<ComponentId>) {
        let old = self.current();
        self.items = items;
        self.current = old
            .and_then(|id| self.items.iter().position(|&x| x == id))
            .unwrap_or(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycles_both_ways() {
        let mut ring = FocusRing::new(vec![
            ComponentId::CardGrid,
            ComponentId::Playlist,
            ComponentId::PlayerBar,
        ]);
        assert_eq!(ring.next(), Some(ComponentId::Playlist));
        assert_eq!(ring.next(), Some(ComponentId::PlayerBar));
        assert_eq!(ring.next(), Some(ComponentId::CardGrid));
        assert_eq!(ring.prev(), Some(ComponentId::PlayerBar));
    }

    #[test]
    fn set_items_keeps_or_resets_focus() {
        let mut ring = FocusRing::new(vec![ComponentId::Playlist, ComponentId::CardGrid]);
        ring.set(ComponentId::CardGrid);
        ring.set_items(vec![ComponentId::CardGrid, ComponentId::PlayerBar]);
        assert!(ring.is_focused(ComponentId::CardGrid));

        ring.set(ComponentId::PlayerBar);
        ring.set_items(vec![ComponentId::CardGrid]);
        assert!(ring.is_focused(ComponentId::CardGrid));

        let mut empty = FocusRing::new(Vec::new());
        assert_eq!(empty.next(), None);
    }
}

//! Playlist pane: the drawer listing the open folder's songs.

use ratatui::crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{C_CONNECTING, C_MUTED, C_NUMBER_HINT, C_PLAYING, C_PRIMARY, C_SECONDARY, C_SELECTION_BG},
    widgets::{
        pane_chrome::{pane_chrome, Badge},
        scrollable_list::ScrollableList,
    },
};

pub struct Playlist {
    list: ScrollableList<String>,
    /// Active row seen on the last sync; the cursor follows it when it moves.
    last_active: Option<usize>,
}

impl Default for Playlist {
    fn default() -> Self {
        Self::new()
    }
}

impl Playlist {
    pub fn new() -> Self {
        Self {
            list: ScrollableList::new(),
            last_active: None,
        }
    }

    /// Pull rows from state. A new playlist resets the cursor.
    fn sync(&mut self, state: &AppState) {
        if self.list.items != state.playlist_rows {
            self.list.set_items(state.playlist_rows.clone());
            self.list.select_first();
        }
        if state.active_row != self.last_active {
            if let Some(row) = state.active_row {
                self.list.select(row);
            }
            self.last_active = state.active_row;
        }
    }
}

impl Component for Playlist {
    fn id(&self) -> ComponentId {
        ComponentId::Playlist
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        self.sync(state);
        let step = if key.modifiers.contains(KeyModifiers::SHIFT) {
            5
        } else {
            1
        };
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.list.select_up(step),
            KeyCode::Down | KeyCode::Char('j') => self.list.select_down(step),
            KeyCode::PageUp => self.list.select_up(10),
            KeyCode::PageDown => self.list.select_down(10),
            KeyCode::Home | KeyCode::Char('g') => self.list.select_first(),
            KeyCode::End | KeyCode::Char('G') => self.list.select_last(),
            KeyCode::Enter if !self.list.is_empty() => {
                return vec![Action::PlayAt(self.list.selected)];
            }
            _ => {}
        }
        vec![]
    }

    fn handle_mouse(&mut self, event: MouseEvent, area: Rect, state: &AppState) -> Vec<Action> {
        self.sync(state);
        match event.kind {
            MouseEventKind::ScrollUp => self.list.select_up(1),
            MouseEventKind::ScrollDown => self.list.select_down(1),
            MouseEventKind::Down(MouseButton::Left) => {
                let inner = Block::default().borders(Borders::ALL).inner(area);
                if event.row < inner.y || event.row >= inner.y + inner.height {
                    return vec![];
                }
                let row = (event.row - inner.y) as usize;
                if let Some(idx) = self.list.index_at_row(row) {
                    self.list.select(idx);
                    return vec![Action::PlayAt(idx)];
                }
            }
            _ => {}
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        self.sync(state);

        let title = state.open_folder.as_deref().unwrap_or("playlist");
        let count = format!("{} songs", self.list.len());
        let badge = (!self.list.is_empty()).then(|| Badge {
            text: &count,
            color: C_MUTED,
        });
        let block = pane_chrome(title, Some('2'), focused, badge);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if self.list.is_empty() {
            let msg = if state.loading {
                "  loading…"
            } else if state.open_folder.is_some() {
                "  no songs in this folder"
            } else {
                "  pick a folder"
            };
            frame.render_widget(
                Paragraph::new(Span::styled(msg, Style::default().fg(C_MUTED))),
                inner,
            );
            return;
        }

        let height = inner.height as usize;
        self.list.ensure_visible(height);
        let items: Vec<ListItem> = self
            .list
            .visible_items(height)
            .into_iter()
            .map(|(idx, name)| {
                let is_active = state.active_row == Some(idx);
                let is_selected = focused && idx == self.list.selected;

                let (icon, icon_color) = match (is_active, state.is_playing()) {
                    (true, true) => ("▶", C_PLAYING),
                    (true, false) => ("⏸", C_CONNECTING),
                    _ => (" ", C_MUTED),
                };
                let name_style = if is_active {
                    Style::default().fg(icon_color).add_modifier(Modifier::BOLD)
                } else if is_selected {
                    Style::default().fg(C_PRIMARY)
                } else {
                    Style::default().fg(C_SECONDARY)
                };
                let bg = if is_selected {
                    Style::default().bg(C_SELECTION_BG)
                } else {
                    Style::default()
                };
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{:>3} ", idx + 1), Style::default().fg(C_NUMBER_HINT)),
                    Span::styled(icon, Style::default().fg(icon_color)),
                    Span::raw(" "),
                    Span::styled(name.clone(), name_style),
                ]))
                .style(bg)
            })
            .collect();

        frame.render_widget(List::new(items), inner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with(rows: &[&str], active: Option<usize>) -> AppState {
        let mut state = AppState::new(String::new(), 0.5);
        state.playlist_rows = rows.iter().map(|s| s.to_string()).collect();
        state.active_row = active;
        state
    }

    #[test]
    fn enter_plays_selected_row() {
        let state = state_with(&["Alpha", "Beta", "Gamma"], Some(0));
        let mut pane = Playlist::new();
        pane.handle_key(KeyEvent::from(KeyCode::Down), &state);
        let actions = pane.handle_key(KeyEvent::from(KeyCode::Enter), &state);
        assert_eq!(actions, vec![Action::PlayAt(1)]);
    }

    #[test]
    fn cursor_follows_active_row() {
        let mut pane = Playlist::new();
        pane.sync(&state_with(&["a", "b", "c"], Some(0)));
        pane.sync(&state_with(&["a", "b", "c"], Some(2)));
        assert_eq!(pane.list.selected, 2);
    }

    #[test]
    fn click_maps_to_row_and_empty_is_noop() {
        let state = state_with(&["a", "b"], None);
        let mut pane = Playlist::new();
        let area = Rect::new(0, 0, 30, 10);
        let click = MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 4,
            row: 2,
            modifiers: KeyModifiers::NONE,
        };
        assert_eq!(pane.handle_mouse(click, area, &state), vec![Action::PlayAt(1)]);

        let below = MouseEvent { row: 5, ..click };
        assert!(pane.handle_mouse(below, area, &state).is_empty());

        let empty = state_with(&[], None);
        let mut pane = Playlist::new();
        assert!(pane
            .handle_key(KeyEvent::from(KeyCode::Enter), &empty)
            .is_empty());
    }
}

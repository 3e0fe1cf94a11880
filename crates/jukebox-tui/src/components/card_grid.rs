//! CardGrid: one card per music folder, laid out in columns.

use ratatui::crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use jukebox_proto::cover::resolve_cover_hint;
use jukebox_proto::manifest::{FolderInfo, Manifest};
use jukebox_proto::names::normalize_folder_name;
use jukebox_proto::urls::SiteUrls;
use unicode_width::UnicodeWidthStr;

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{
        C_ACCENT, C_CARD_BG, C_MUTED, C_PANEL_BORDER, C_PANEL_BORDER_FOCUSED, C_PLAYING,
        C_PRIMARY, C_SECONDARY,
    },
    widgets::pane_chrome::{pane_chrome, Badge},
};

const CARD_WIDTH: u16 = 30;
const CARD_HEIGHT: u16 = 5;
const PLAY_GLYPH: &str = "▶";

#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    /// Normalised folder id; cards are keyed by it.
    pub id: String,
    /// Name handed to `OpenFolder` on activation.
    pub folder: String,
    pub title: String,
    pub description: String,
    /// Image path, present only once a cover resolved.
    pub cover: Option<String>,
}

pub struct CardGrid {
    cards: Vec<Card>,
    selected: usize,
    scroll_row: usize,
    /// Columns used by the last draw; keyboard moves and clicks use it.
    columns: usize,
}

impl Default for CardGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl CardGrid {
    pub fn new() -> Self {
        Self {
            cards: Vec::new(),
            selected: 0,
            scroll_row: 0,
            columns: 1,
        }
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn selected_card(&self) -> Option<&Card> {
        self.cards.get(self.selected)
    }

    /// Create the card for `folder`, or update it in place.
    ///
    /// On update, title and description change only when `info` carries
    /// them non-empty and the image only when `cover` resolved; nothing is
    /// ever cleared. New cards append, so grid order follows arrival order.
    pub fn render_card(&mut self, folder: &str, info: Option<&FolderInfo>, cover: Option<String>) {
        let id = card_id(folder);
        let title = info.and_then(|i| i.title.clone()).filter(|t| !t.is_empty());
        let description = info
            .and_then(|i| i.description.clone())
            .filter(|d| !d.is_empty());

        if let Some(card) = self.cards.iter_mut().find(|c| c.id == id) {
            if let Some(title) = title {
                card.title = title;
            }
            if let Some(description) = description {
                card.description = description;
            }
            if cover.is_some() {
                card.cover = cover;
            }
            return;
        }

        self.cards.push(Card {
            id,
            folder: folder.to_string(),
            title: title.unwrap_or_else(|| folder.to_string()),
            description: description.unwrap_or_default(),
            cover,
        });
    }

    /// First paint straight from the manifest, before any `info.json`.
    pub fn seed_from_manifest(&mut self, manifest: &Manifest, urls: &SiteUrls) {
        for folder in &manifest.folders {
            let info = FolderInfo {
                title: Some(folder.title.clone()),
                description: Some(folder.description.clone()),
                cover: None,
            };
            let cover = folder
                .cover
                .as_deref()
                .and_then(|hint| resolve_cover_hint(urls, &folder.name, hint));
            self.render_card(&folder.name, Some(&info), cover);
        }
    }

    fn move_by(&mut self, delta: isize) {
        if self.cards.is_empty() {
            return;
        }
        let last = self.cards.len() - 1;
        let target = self.selected as isize + delta;
        self.selected = target.clamp(0, last as isize) as usize;
    }

    fn activate_selected(&self) -> Vec<Action> {
        self.selected_card()
            .map(|c| vec![Action::OpenFolder(c.folder.clone())])
            .unwrap_or_default()
    }

    /// Index of the card under terminal cell (`column`, `row`), where
    /// `inner` is the grid area inside the pane border.
    fn card_at(&self, inner: Rect, column: u16, row: u16) -> Option<usize> {
        if column < inner.x
            || row < inner.y
            || column >= inner.x + inner.width
            || row >= inner.y + inner.height
        {
            return None;
        }
        let col = ((column - inner.x) / CARD_WIDTH) as usize;
        if col >= self.columns {
            return None;
        }
        let grid_row = ((row - inner.y) / CARD_HEIGHT) as usize + self.scroll_row;
        let idx = grid_row * self.columns + col;
        (idx < self.cards.len()).then_some(idx)
    }

    fn ensure_visible(&mut self, visible_rows: usize) {
        if visible_rows == 0 {
            return;
        }
        let row = self.selected / self.columns.max(1);
        if row < self.scroll_row {
            self.scroll_row = row;
        } else if row >= self.scroll_row + visible_rows {
            self.scroll_row = row + 1 - visible_rows;
        }
    }

    fn draw_card(&self, frame: &mut Frame, area: Rect, card: &Card, selected: bool, open: bool) {
        let border = if selected {
            C_PANEL_BORDER_FOCUSED
        } else {
            C_PANEL_BORDER
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .style(Style::default().bg(C_CARD_BG));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let width = inner.width as usize;
        let glyph_color = if open { C_PLAYING } else { C_ACCENT };
        let title_style = if selected {
            Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(C_PRIMARY)
        };

        let mut lines = vec![
            Line::from(vec![
                Span::styled(format!("{} ", PLAY_GLYPH), Style::default().fg(glyph_color)),
                Span::styled(truncate(&card.title, width.saturating_sub(2)), title_style),
            ]),
            Line::from(Span::styled(
                truncate(&card.description, width),
                Style::default().fg(C_SECONDARY),
            )),
        ];
        if let Some(cover) = &card.cover {
            let name = cover.rsplit('/').next().unwrap_or(cover);
            lines.push(Line::from(Span::styled(
                truncate(&format!("▣ {}", name), width),
                Style::default().fg(C_MUTED),
            )));
        }
        frame.render_widget(Paragraph::new(lines), inner);
    }
}

fn card_id(folder: &str) -> String {
    let id = normalize_folder_name(folder);
    if id.is_empty() {
        folder.to_string()
    } else {
        id
    }
}

/// Cut `s` to at most `width` terminal cells, marking the cut with `…`.
fn truncate(s: &str, width: usize) -> String {
    if s.width() <= width {
        return s.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in s.chars() {
        let w = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    if width > 0 {
        out.push('…');
    }
    out
}

impl Component for CardGrid {
    fn id(&self) -> ComponentId {
        ComponentId::CardGrid
    }

    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        let cols = self.columns.max(1) as isize;
        match key.code {
            KeyCode::Left => self.move_by(-1),
            KeyCode::Right => self.move_by(1),
            KeyCode::Up | KeyCode::Char('k') => self.move_by(-cols),
            KeyCode::Down | KeyCode::Char('j') => self.move_by(cols),
            KeyCode::Home | KeyCode::Char('g') => self.selected = 0,
            KeyCode::End | KeyCode::Char('G') => {
                self.selected = self.cards.len().saturating_sub(1)
            }
            KeyCode::Enter => return self.activate_selected(),
            _ => {}
        }
        vec![]
    }

    fn handle_mouse(&mut self, event: MouseEvent, area: Rect, _state: &AppState) -> Vec<Action> {
        let inner = Block::default().borders(Borders::ALL).inner(area);
        match event.kind {
            MouseEventKind::ScrollUp => self.move_by(-(self.columns.max(1) as isize)),
            MouseEventKind::ScrollDown => self.move_by(self.columns.max(1) as isize),
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(idx) = self.card_at(inner, event.column, event.row) {
                    self.selected = idx;
                    return self.activate_selected();
                }
            }
            _ => {}
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let count = format!("{} folders", self.cards.len());
        let title = if state.site_label.is_empty() {
            "library".to_string()
        } else {
            format!("library · {}", state.site_label)
        };
        let block = pane_chrome(
            &title,
            Some('1'),
            focused,
            Some(Badge {
                text: &count,
                color: C_MUTED,
            }),
        );
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if self.cards.is_empty() {
            frame.render_widget(
                Paragraph::new(Span::styled("  no folders", Style::default().fg(C_MUTED))),
                inner,
            );
            return;
        }

        self.columns = (inner.width / CARD_WIDTH).max(1) as usize;
        let visible_rows = (inner.height / CARD_HEIGHT) as usize;
        self.ensure_visible(visible_rows);

        let first = self.scroll_row * self.columns;
        let last = (first + visible_rows * self.columns).min(self.cards.len());
        for idx in first..last {
            let slot = idx - first;
            let x = inner.x + (slot % self.columns) as u16 * CARD_WIDTH;
            let y = inner.y + (slot / self.columns) as u16 * CARD_HEIGHT;
            let cell = Rect {
                x,
                y,
                width: CARD_WIDTH.min(inner.x + inner.width - x),
                height: CARD_HEIGHT,
            };
            let card = &self.cards[idx];
            let open = state.open_folder.as_deref() == Some(card.id.as_str());
            self.draw_card(frame, cell, card, idx == self.selected, open);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jukebox_proto::manifest::FolderDescriptor;

    fn info(title: Option<&str>, description: Option<&str>) -> FolderInfo {
        FolderInfo {
            title: title.map(str::to_string),
            description: description.map(str::to_string),
            cover: None,
        }
    }

    #[test]
    fn new_card_defaults_to_folder_name() {
        let mut grid = CardGrid::new();
        grid.render_card("ncs", None, None);
        let card = &grid.cards()[0];
        assert_eq!(card.title, "ncs");
        assert_eq!(card.description, "");
        assert_eq!(card.cover, None);
    }

    #[test]
    fn update_only_touches_present_fields() {
        let mut grid = CardGrid::new();
        grid.render_card("ncs", Some(&info(Some("NCS"), Some("free"))), Some("/c.jpg".into()));
        grid.render_card("songs/ncs/", Some(&info(None, None)), None);

        assert_eq!(grid.cards().len(), 1);
        let card = &grid.cards()[0];
        assert_eq!(card.title, "NCS");
        assert_eq!(card.description, "free");
        assert_eq!(card.cover.as_deref(), Some("/c.jpg"));

        grid.render_card("ncs", Some(&info(Some("Renamed"), Some(""))), Some("/d.png".into()));
        let card = &grid.cards()[0];
        assert_eq!(card.title, "Renamed");
        assert_eq!(card.description, "free");
        assert_eq!(card.cover.as_deref(), Some("/d.png"));
    }

    #[test]
    fn seed_follows_manifest_order() {
        let manifest = Manifest {
            folders: vec![
                FolderDescriptor {
                    name: "b".into(),
                    title: "Bee".into(),
                    cover: Some("cover.jpg".into()),
                    ..Default::default()
                },
                FolderDescriptor {
                    name: "a".into(),
                    ..Default::default()
                },
            ],
        };
        let urls = SiteUrls::new("http://x", "/site/");
        let mut grid = CardGrid::new();
        grid.seed_from_manifest(&manifest, &urls);

        let cards = grid.cards();
        assert_eq!(cards[0].title, "Bee");
        assert_eq!(cards[0].cover.as_deref(), Some("/site/songs/b/cover.jpg"));
        assert_eq!(cards[1].title, "a");
        assert_eq!(cards[1].cover, None);
    }

    #[test]
    fn enter_and_click_open_folder() {
        let state = AppState::new(String::new(), 0.5);
        let mut grid = CardGrid::new();
        grid.render_card("one", None, None);
        grid.render_card("two", None, None);
        grid.columns = 2;

        let enter = KeyEvent::from(KeyCode::Enter);
        assert_eq!(
            grid.handle_key(enter, &state),
            vec![Action::OpenFolder("one".into())]
        );

        let area = Rect::new(0, 0, 62, 12);
        let click = MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 1 + CARD_WIDTH + 2,
            row: 2,
            modifiers: ratatui::crossterm::event::KeyModifiers::NONE,
        };
        assert_eq!(
            grid.handle_mouse(click, area, &state),
            vec![Action::OpenFolder("two".into())]
        );

        let miss = MouseEvent { row: 11, ..click };
        assert!(grid.handle_mouse(miss, area, &state).is_empty());
    }

    #[test]
    fn truncate_marks_cut() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefgh", 5), "abcd…");
    }
}

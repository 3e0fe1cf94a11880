//! PlayerBar: transport buttons, now-playing label, seek bar, time label
//! and volume controls.

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

use jukebox_proto::protocol::EngineHealth;
use jukebox_proto::session::PlayIcon;

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    controls::{seek_fraction, slider_at, VolumeIcon, SLIDER_MAX},
    theme::{
        C_ACCENT, C_BADGE_ERR, C_BADGE_PENDING, C_MUTED, C_PLAYING, C_PRIMARY, C_SECONDARY,
    },
    widgets::{
        pane_chrome::{pane_chrome, Badge},
        progress_bar::draw_progress,
    },
};

const BUTTON_W: u16 = 3;
const ICON_W: u16 = 3;
const SLIDER_W: u16 = 12;
const PERCENT_W: u16 = 5;
/// "MM:SS / MM:SS" plus a leading space.
const TIME_W: u16 = 14;
/// Keyboard seek step, as a fraction of the track.
const SEEK_STEP: f64 = 0.05;

/// Hit areas inside the pane border. Row 0 holds buttons, label and volume;
/// row 1 the seek bar and time label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarLayout {
    pub prev: Rect,
    pub play: Rect,
    pub next: Rect,
    pub label: Rect,
    pub volume_icon: Rect,
    pub slider: Rect,
    pub percent: Rect,
    pub seek: Rect,
    pub time: Rect,
}

impl BarLayout {
    pub fn new(inner: Rect) -> Self {
        let row0 = inner.y;
        let row1 = inner.y + inner.height.min(2).saturating_sub(1);
        let right = inner.x + inner.width;
        let cell = |x: u16, w: u16, y: u16| Rect {
            x: x.min(right),
            y,
            width: w.min(right.saturating_sub(x)),
            height: 1,
        };

        let prev = cell(inner.x, BUTTON_W, row0);
        let play = cell(inner.x + BUTTON_W, BUTTON_W, row0);
        let next = cell(inner.x + 2 * BUTTON_W, BUTTON_W, row0);

        let volume_w = ICON_W + SLIDER_W + PERCENT_W;
        let volume_x = right.saturating_sub(volume_w).max(inner.x + 3 * BUTTON_W);
        let volume_icon = cell(volume_x, ICON_W, row0);
        let slider = cell(volume_x + ICON_W, SLIDER_W, row0);
        let percent = cell(volume_x + ICON_W + SLIDER_W, PERCENT_W, row0);

        let label_x = inner.x + 3 * BUTTON_W + 1;
        let label = cell(label_x, volume_x.saturating_sub(label_x + 1), row0);

        let seek_w = inner.width.saturating_sub(TIME_W);
        let seek = cell(inner.x, seek_w, row1);
        let time = cell(inner.x + seek_w, TIME_W, row1);

        Self {
            prev,
            play,
            next,
            label,
            volume_icon,
            slider,
            percent,
            seek,
            time,
        }
    }
}

fn contains(r: Rect, column: u16, row: u16) -> bool {
    r.width > 0 && row == r.y && column >= r.x && column < r.x + r.width
}

fn slider_text(slider: u8, width: usize) -> (String, String) {
    let filled = (f64::from(slider.min(SLIDER_MAX)) / f64::from(SLIDER_MAX) * width as f64)
        .round() as usize;
    ("━".repeat(filled), "─".repeat(width - filled))
}

#[derive(Default)]
pub struct PlayerBar;

impl PlayerBar {
    pub fn new() -> Self {
        Self
    }
}

impl Component for PlayerBar {
    fn id(&self) -> ComponentId {
        ComponentId::PlayerBar
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        let current = state.position.fraction();
        match key.code {
            KeyCode::Enter => vec![Action::TogglePlay],
            KeyCode::Left => {
                vec![Action::SeekTo((current - SEEK_STEP).max(0.0))]
            }
            KeyCode::Right => {
                vec![Action::SeekTo((current + SEEK_STEP).min(1.0))]
            }
            KeyCode::Up => vec![Action::NudgeVolume(crate::controls::SLIDER_STEP)],
            KeyCode::Down => vec![Action::NudgeVolume(-crate::controls::SLIDER_STEP)],
            _ => vec![],
        }
    }

    fn handle_mouse(&mut self, event: MouseEvent, area: Rect, _state: &AppState) -> Vec<Action> {
        if !matches!(event.kind, MouseEventKind::Down(MouseButton::Left)) {
            return vec![];
        }
        let layout = BarLayout::new(Block::default().borders(Borders::ALL).inner(area));
        let (col, row) = (event.column, event.row);

        if contains(layout.prev, col, row) {
            vec![Action::PlayPrev]
        } else if contains(layout.play, col, row) {
            vec![Action::TogglePlay]
        } else if contains(layout.next, col, row) {
            vec![Action::PlayNext]
        } else if contains(layout.volume_icon, col, row) {
            vec![Action::ToggleMute]
        } else if contains(layout.slider, col, row) {
            slider_at(layout.slider, col)
                .map(|v| vec![Action::SetVolumeSlider(v)])
                .unwrap_or_default()
        } else if row == layout.seek.y {
            seek_fraction(layout.seek, col)
                .map(|f| vec![Action::SeekTo(f)])
                .unwrap_or_default()
        } else {
            vec![]
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let badge = state.health.badge_label().map(|text| Badge {
            text,
            color: match state.health {
                EngineHealth::Starting | EngineHealth::Restarting => C_BADGE_PENDING,
                _ => C_BADGE_ERR,
            },
        });
        let block = pane_chrome("player", Some('3'), focused, badge);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        if inner.height == 0 || inner.width == 0 {
            return;
        }
        let layout = BarLayout::new(inner);
        let button = Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD);

        let play_glyph = match state.play_icon {
            PlayIcon::Playing => " ⏸ ",
            PlayIcon::Paused => " ▶ ",
        };
        frame.render_widget(Paragraph::new(Span::styled(" ⏮ ", button)), layout.prev);
        frame.render_widget(
            Paragraph::new(Span::styled(play_glyph, button.fg(C_ACCENT))),
            layout.play,
        );
        frame.render_widget(Paragraph::new(Span::styled(" ⏭ ", button)), layout.next);

        let label = if state.now_playing.is_empty() {
            Span::styled("nothing playing", Style::default().fg(C_MUTED))
        } else {
            Span::styled(
                state.now_playing.as_str(),
                Style::default().fg(C_PLAYING).add_modifier(Modifier::BOLD),
            )
        };
        frame.render_widget(Paragraph::new(label), layout.label);

        let icon_color = match state.volume_icon {
            VolumeIcon::Speaker => C_PRIMARY,
            VolumeIcon::Muted => C_MUTED,
        };
        frame.render_widget(
            Paragraph::new(Span::styled(
                format!("{} ", state.volume_icon.glyph()),
                Style::default().fg(icon_color),
            )),
            layout.volume_icon,
        );
        let (filled, rest) = slider_text(state.volume_slider, layout.slider.width as usize);
        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled(filled, Style::default().fg(C_ACCENT)),
                Span::styled(rest, Style::default().fg(C_MUTED)),
            ])),
            layout.slider,
        );
        frame.render_widget(
            Paragraph::new(Span::styled(
                format!("{:>4}%", state.volume_slider),
                Style::default().fg(C_SECONDARY),
            )),
            layout.percent,
        );

        draw_progress(frame, layout.seek, state.position.fraction());
        frame.render_widget(
            Paragraph::new(Span::styled(
                format!(" {}", state.position.time_label()),
                Style::default().fg(C_SECONDARY),
            )),
            layout.time,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyModifiers;

    fn click(column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn layout_splits_rows() {
        let layout = BarLayout::new(Rect::new(1, 1, 78, 2));
        assert_eq!(layout.prev, Rect::new(1, 1, 3, 1));
        assert_eq!(layout.play.x, 4);
        assert_eq!(layout.percent.x + layout.percent.width, 79);
        assert_eq!(layout.seek, Rect::new(1, 2, 64, 1));
        assert_eq!(layout.time.x, 65);
    }

    #[test]
    fn clicks_map_to_controls() {
        let state = AppState::new(String::new(), 0.5);
        let mut bar = PlayerBar::new();
        let area = Rect::new(0, 0, 80, 4);
        let layout = BarLayout::new(Rect::new(1, 1, 78, 2));

        assert_eq!(bar.handle_mouse(click(2, 1), area, &state), vec![Action::PlayPrev]);
        assert_eq!(bar.handle_mouse(click(5, 1), area, &state), vec![Action::TogglePlay]);
        assert_eq!(bar.handle_mouse(click(8, 1), area, &state), vec![Action::PlayNext]);
        assert_eq!(
            bar.handle_mouse(click(layout.volume_icon.x, 1), area, &state),
            vec![Action::ToggleMute]
        );
        assert_eq!(
            bar.handle_mouse(click(layout.slider.x, 1), area, &state),
            vec![Action::SetVolumeSlider(0)]
        );
        assert_eq!(
            bar.handle_mouse(click(layout.slider.x + layout.slider.width - 1, 1), area, &state),
            vec![Action::SetVolumeSlider(100)]
        );
        // seek bar is 64 wide starting at column 1
        assert_eq!(bar.handle_mouse(click(33, 2), area, &state), vec![Action::SeekTo(0.5)]);
        assert!(bar.handle_mouse(click(70, 2), area, &state).is_empty());
        assert!(bar.handle_mouse(click(30, 0), area, &state).is_empty());
    }

    #[test]
    fn slider_fill_tracks_value() {
        assert_eq!(slider_text(0, 10), (String::new(), "─".repeat(10)));
        assert_eq!(slider_text(50, 10).0.chars().count(), 5);
        assert_eq!(slider_text(100, 10).1, "");
    }
}

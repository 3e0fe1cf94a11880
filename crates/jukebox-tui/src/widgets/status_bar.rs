//! Bottom line: engine state dot and key bindings.

use jukebox_proto::protocol::{EngineHealth, PlaybackStatus};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::theme::{C_ACCENT, C_CONNECTING, C_ERROR, C_MUTED, C_PLAYING, C_SECONDARY};

const KEYS: &str = "↑↓/jk select  Enter open/play  Space play/pause  n/p next/prev  ,/. seek  +/- vol  m mute  h drawer  Tab panes  q quit";

fn status_color(status: PlaybackStatus, health: &EngineHealth) -> Color {
    if health.is_unhealthy() {
        return C_ERROR;
    }
    match status {
        PlaybackStatus::Playing => C_PLAYING,
        PlaybackStatus::Connecting => C_CONNECTING,
        PlaybackStatus::Error => C_ERROR,
        PlaybackStatus::Idle | PlaybackStatus::Paused => C_SECONDARY,
    }
}

pub fn draw_keys_bar(frame: &mut Frame, area: Rect, status: PlaybackStatus, health: &EngineHealth) {
    let color = status_color(status, health);
    let line = Line::from(vec![
        Span::styled(" JUKEBOX ", Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD)),
        Span::styled("●", Style::default().fg(color).add_modifier(Modifier::BOLD)),
        Span::styled(format!(" {:<8}", status.label()), Style::default().fg(color)),
        Span::styled(KEYS, Style::default().fg(C_MUTED)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unhealthy_engine_overrides_status_colour() {
        assert_eq!(status_color(PlaybackStatus::Playing, &EngineHealth::Running), C_PLAYING);
        assert_eq!(status_color(PlaybackStatus::Playing, &EngineHealth::Dead), C_ERROR);
        assert_eq!(status_color(PlaybackStatus::Connecting, &EngineHealth::Starting), C_CONNECTING);
    }
}

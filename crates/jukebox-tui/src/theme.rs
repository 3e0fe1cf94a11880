//! Jukebox palette: green on charcoal, cards slightly lifted off the
//! background.

use ratatui::style::{Color, Style};

// surfaces
pub const C_CARD_BG: Color = Color::Rgb(26, 28, 30);
pub const C_SELECTION_BG: Color = Color::Rgb(34, 44, 38);
pub const C_PANEL_BORDER: Color = Color::Rgb(48, 52, 56);
pub const C_PANEL_BORDER_FOCUSED: Color = Color::Rgb(30, 215, 96);

// text
pub const C_PRIMARY: Color = Color::Rgb(232, 232, 232);
pub const C_SECONDARY: Color = Color::Rgb(167, 167, 167);
pub const C_MUTED: Color = Color::Rgb(92, 96, 100);
pub const C_NUMBER_HINT: Color = Color::Rgb(120, 126, 130);
pub const C_ACCENT: Color = Color::Rgb(30, 215, 96);

// playback state
pub const C_PLAYING: Color = Color::Rgb(110, 230, 150);
pub const C_CONNECTING: Color = Color::Rgb(240, 190, 90);
pub const C_ERROR: Color = Color::Rgb(235, 90, 90);

// toasts and badges follow the state colours
pub const C_TOAST_INFO: Color = Color::Rgb(100, 170, 235);
pub const C_TOAST_SUCCESS: Color = C_PLAYING;
pub const C_TOAST_WARNING: Color = C_CONNECTING;
pub const C_TOAST_ERROR: Color = C_ERROR;
pub const C_BADGE_ERR: Color = C_ERROR;
pub const C_BADGE_PENDING: Color = C_CONNECTING;

pub fn style_focused_border() -> Style {
    Style::default().fg(C_PANEL_BORDER_FOCUSED)
}

pub fn style_unfocused_border() -> Style {
    Style::default().fg(C_PANEL_BORDER)
}

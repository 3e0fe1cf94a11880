//! Control Surface rules: slider/volume mapping, mute icon state, seek-bar
//! hit mapping and the drawer. Pure functions, no I/O.

use ratatui::layout::Rect;

pub const SLIDER_MAX: u8 = 100;
/// Step for `+`/`-`.
pub const SLIDER_STEP: i16 = 5;

/// The slider maps linearly onto engine volume: 0..=100 → 0.0..=1.0.
pub fn volume_from_slider(slider: u8) -> f32 {
    f32::from(slider.min(SLIDER_MAX)) / f32::from(SLIDER_MAX)
}

pub fn slider_from_volume(volume: f32) -> u8 {
    (volume.clamp(0.0, 1.0) * f32::from(SLIDER_MAX)).round() as u8
}

pub fn nudge_slider(slider: u8, delta: i16) -> u8 {
    (i16::from(slider) + delta).clamp(0, i16::from(SLIDER_MAX)) as u8
}

/// Speaker/muted glyph. Its identity *is* the mute state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VolumeIcon {
    #[default]
    Speaker,
    Muted,
}

impl VolumeIcon {
    /// Flip the icon. Returns the new icon and the volume to apply: muting
    /// goes to 0, unmuting to `restore` (a fixed default, not the previous
    /// level).
    pub fn toggle(self, restore: f32) -> (VolumeIcon, f32) {
        match self {
            VolumeIcon::Speaker => (VolumeIcon::Muted, 0.0),
            VolumeIcon::Muted => (VolumeIcon::Speaker, restore.clamp(0.0, 1.0)),
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            VolumeIcon::Speaker => "🔊",
            VolumeIcon::Muted => "🔇",
        }
    }
}

/// Navigation drawer holding the playlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Drawer {
    #[default]
    Open,
    Closed,
}

/// Fraction of the seek bar under `column`, or `None` outside the bar.
pub fn seek_fraction(bar: Rect, column: u16) -> Option<f64> {
    if bar.width == 0 || column < bar.x || column >= bar.x + bar.width {
        return None;
    }
    Some(f64::from(column - bar.x) / f64::from(bar.width))
}

/// Slider position under `column` for a slider drawn across `bar`.
pub fn slider_at(bar: Rect, column: u16) -> Option<u8> {
    if bar.width == 0 || column < bar.x || column >= bar.x + bar.width {
        return None;
    }
    if bar.width == 1 {
        return Some(SLIDER_MAX);
    }
    let frac = f64::from(column - bar.x) / f64::from(bar.width - 1);
    Some((frac * f64::from(SLIDER_MAX)).round() as u8)
}

//! Smooth Unicode seek bar.

use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::theme::{C_MUTED, C_PLAYING};

const BLOCKS: [char; 9] = [' ', '▏', '▎', '▍', '▌', '▋', '▊', '▉', '█'];

/// Fill `width` cells to `progress` (0.0..=1.0), eight steps per cell.
/// The unfilled tail is a dim rule so the bar stays visible at 0.
pub fn bar_cells(progress: f64, width: usize) -> (String, String) {
    let eighths = (progress.clamp(0.0, 1.0) * width as f64 * 8.0) as usize;
    let full_blocks = eighths / 8;
    let partial = eighths % 8;

    let mut filled = String::with_capacity(width * 3);
    for _ in 0..full_blocks {
        filled.push('█');
    }
    let mut rest = 0;
    if full_blocks < width {
        if partial > 0 {
            filled.push(BLOCKS[partial]);
            rest = width - full_blocks - 1;
        } else {
            rest = width - full_blocks;
        }
    }
    (filled, "─".repeat(rest))
}

/// Draw the bar across the whole of `area`. Clicks map back through
/// `controls::seek_fraction` with the same rect.
pub fn draw_progress(frame: &mut Frame, area: Rect, progress: f64) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let (filled, rest) = bar_cells(progress, area.width as usize);
    let line = Line::from(vec![
        Span::styled(filled, Style::default().fg(C_PLAYING)),
        Span::styled(rest, Style::default().fg(C_MUTED)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(progress: f64, width: usize) -> usize {
        let (a, b) = bar_cells(progress, width);
        a.chars().count() + b.chars().count()
    }

    #[test]
    fn always_fills_width() {
        for p in [0.0, 0.01, 0.33, 0.5, 0.999, 1.0, 7.0, -1.0] {
            assert_eq!(cells(p, 20), 20, "progress {}", p);
        }
    }

    #[test]
    fn empty_and_full() {
        assert_eq!(bar_cells(0.0, 4), (String::new(), "────".to_string()));
        assert_eq!(bar_cells(1.0, 4), ("████".to_string(), String::new()));
        assert_eq!(bar_cells(0.5, 4).0, "██");
    }
}

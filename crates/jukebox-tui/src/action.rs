//! Action enum: every user intent and internal event the App dispatches.

/// Unique identifier for a focusable component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentId {
    CardGrid,
    Playlist,
    PlayerBar,
}

/// Components produce Actions; the App dispatches them.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // ── Playlist ─────────────────────────────────────────────────────────────
    /// Open a folder by raw reference (card id, href, name).
    OpenFolder(String),
    PlayAt(usize),
    PlayNext,
    PlayPrev,

    // ── Transport ────────────────────────────────────────────────────────────
    TogglePlay,
    /// Seek to a fraction of the current track.
    SeekTo(f64),
    /// Volume slider position, 0..=100.
    SetVolumeSlider(u8),
    /// Nudge the slider by this many points.
    NudgeVolume(i16),
    ToggleMute,

    // ── Navigation ───────────────────────────────────────────────────────────
    OpenDrawer,
    CloseDrawer,
    FocusNext,
    FocusPrev,
    FocusPane(ComponentId),

    // ── System ───────────────────────────────────────────────────────────────
    Quit,
    Noop,
}

//! AppState: what the panes render from.
//!
//! Components read it; only the App loop (through the playlist controller
//! and engine events) writes to it.

use jukebox_proto::protocol::{EngineHealth, PlaybackPosition, PlaybackStatus};
use jukebox_proto::session::PlayIcon;

use crate::controls::{slider_from_volume, Drawer, VolumeIcon};

pub struct AppState {
    // ── Playlist ────────────────────────────────────────────────────────────
    /// Display names, one per song of the open folder.
    pub playlist_rows: Vec<String>,
    pub active_row: Option<usize>,
    /// Folder id of the open playlist.
    pub open_folder: Option<String>,
    /// A folder fetch is in flight.
    pub loading: bool,

    // ── Player bar ──────────────────────────────────────────────────────────
    pub now_playing: String,
    pub play_icon: PlayIcon,
    pub position: PlaybackPosition,
    pub volume_slider: u8,
    pub volume_icon: VolumeIcon,
    pub status: PlaybackStatus,
    pub health: EngineHealth,

    // ── Layout ──────────────────────────────────────────────────────────────
    pub drawer: Drawer,
    /// Origin + base path, shown in the card grid title.
    pub site_label: String,
}

impl AppState {
    pub fn new(site_label: String, initial_volume: f32) -> Self {
        Self {
            playlist_rows: Vec::new(),
            active_row: None,
            open_folder: None,
            loading: false,
            now_playing: String::new(),
            play_icon: PlayIcon::Paused,
            position: PlaybackPosition::default(),
            volume_slider: slider_from_volume(initial_volume),
            volume_icon: VolumeIcon::Speaker,
            status: PlaybackStatus::Idle,
            health: EngineHealth::Absent,
            drawer: Drawer::Open,
            site_label,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.play_icon == PlayIcon::Playing
    }
}

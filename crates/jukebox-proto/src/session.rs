//! The playlist state machine.
//!
//! `Session` owns which folder is open, its songs and the current index.
//! Every transition is pure: it updates the session and returns the
//! [`Effect`]s the caller must apply to the engine and the view. Nothing
//! here performs I/O.

use crate::manifest::{FolderDescriptor, SongRef};
use crate::names::normalize_folder_name;
use crate::protocol::EngineCommand;
use crate::urls::SiteUrls;

/// Play/pause glyph shown on the control surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayIcon {
    #[default]
    Paused,
    Playing,
}

/// One side effect requested by a transition, applied in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Engine(EngineCommand),
    /// Replace every playlist row (display names, in song order).
    ShowPlaylist(Vec<String>),
    SetActiveRow(Option<usize>),
    SetNowPlaying(String),
    SetPlayIcon(PlayIcon),
    /// Seek indicator to the start, time label to `00:00 / 00:00`.
    ResetProgress,
}

/// Handed out by [`Session::begin_open`]; the folder fetch must present it
/// back so a slower, superseded fetch can be recognised and dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenTicket {
    pub folder: String,
    pub generation: u64,
}

#[derive(Debug, Clone)]
pub struct Session {
    urls: SiteUrls,
    extension: String,
    prefer_remote: bool,
    folder: Option<String>,
    songs: Vec<SongRef>,
    index: Option<usize>,
    generation: u64,
}

impl Session {
    pub fn new(urls: SiteUrls, extension: &str, prefer_remote: bool) -> Self {
        Self {
            urls,
            extension: extension.to_string(),
            prefer_remote,
            folder: None,
            songs: Vec::new(),
            index: None,
            generation: 0,
        }
    }

    pub fn folder(&self) -> Option<&str> {
        self.folder.as_deref()
    }

    pub fn songs(&self) -> &[SongRef] {
        &self.songs
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn current_song(&self) -> Option<&SongRef> {
        self.index.and_then(|i| self.songs.get(i))
    }

    /// Absolute media URL for song `i` of the open folder.
    pub fn source_for(&self, i: usize) -> Option<String> {
        let folder = self.folder.as_deref()?;
        let song = self.songs.get(i)?;
        Some(
            self.urls
                .song_source(folder, song, &self.extension, self.prefer_remote),
        )
    }

    /// Start opening a folder. The previous playlist is dropped right away;
    /// the song list arrives later through [`Session::finish_open`].
    pub fn begin_open(&mut self, raw: &str) -> (OpenTicket, Vec<Effect>) {
        let normalized = normalize_folder_name(raw);
        let folder = if normalized.is_empty() {
            raw.to_string()
        } else {
            normalized
        };

        self.generation += 1;
        self.folder = Some(folder.clone());
        self.songs.clear();
        self.index = None;

        let ticket = OpenTicket {
            folder,
            generation: self.generation,
        };
        let effects = vec![
            Effect::Engine(EngineCommand::Stop),
            Effect::ResetProgress,
            Effect::SetPlayIcon(PlayIcon::Paused),
        ];
        (ticket, effects)
    }

    /// Install the fetched descriptor and start the first song. Returns no
    /// effects for a stale ticket.
    pub fn finish_open(
        &mut self,
        ticket: &OpenTicket,
        descriptor: Option<FolderDescriptor>,
    ) -> Vec<Effect> {
        if ticket.generation != self.generation {
            return Vec::new();
        }

        let songs = descriptor.map(|d| d.songs).unwrap_or_default();
        if songs.is_empty() {
            self.songs.clear();
            self.index = None;
            return vec![
                Effect::ShowPlaylist(Vec::new()),
                Effect::SetActiveRow(None),
                Effect::SetNowPlaying(String::new()),
            ];
        }

        self.songs = songs;
        let rows = self.songs.iter().map(SongRef::display_name).collect();

        let mut effects = vec![Effect::ShowPlaylist(rows)];
        effects.extend(self.start_song(0));
        effects.push(Effect::ResetProgress);
        effects
    }

    /// Jump to song `i`. Out of range is a no-op.
    pub fn play_at(&mut self, i: usize) -> Vec<Effect> {
        if i >= self.songs.len() {
            return Vec::new();
        }
        self.start_song(i)
    }

    pub fn play_next(&mut self) -> Vec<Effect> {
        match self.index {
            Some(i) => self.play_at(i + 1),
            None => Vec::new(),
        }
    }

    pub fn play_prev(&mut self) -> Vec<Effect> {
        match self.index.and_then(|i| i.checked_sub(1)) {
            Some(i) => self.play_at(i),
            None => Vec::new(),
        }
    }

    /// The engine finished the current track.
    pub fn on_ended(&mut self) -> Vec<Effect> {
        self.play_next()
    }

    fn start_song(&mut self, i: usize) -> Vec<Effect> {
        let Some(src) = self.source_for(i) else {
            return Vec::new();
        };
        self.index = Some(i);
        let label = self.songs[i].display_name();
        vec![
            Effect::SetActiveRow(Some(i)),
            Effect::Engine(EngineCommand::Load { src }),
            Effect::Engine(EngineCommand::Play),
            Effect::SetNowPlaying(label),
            Effect::SetPlayIcon(PlayIcon::Playing),
        ]
    }
}

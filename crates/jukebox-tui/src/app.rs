//! App: component-based event loop.
//!
//! Architecture:
//! - `App` owns the components, `AppState` and the playlist controller.
//! - A `tokio::mpsc` channel carries `AppMessage`s in from background tasks
//!   (terminal input, engine events, HTTP fetches).
//! - The loop draws a frame, then awaits the next message.
//! - Components return `Vec<Action>`; `apply_action` carries them out.
//! - Audio changes go out through the `EngineHandle`; nothing here waits on
//!   the engine or the network.

use std::io;
use std::time::Duration;

use ratatui::crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    Terminal,
};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use jukebox_proto::config::Config;
use jukebox_proto::cover::resolve_cover;
use jukebox_proto::manifest::{FolderDescriptor, FolderInfo, Manifest};
use jukebox_proto::protocol::{EngineCommand, EngineEvent, EngineHealth, PlaybackPosition};
use jukebox_proto::resolver::Library;
use jukebox_proto::session::{OpenTicket, PlayIcon, Session};
use jukebox_proto::urls::SiteUrls;

use crate::action::{Action, ComponentId};
use crate::app_state::AppState;
use crate::component::Component;
use crate::components::{card_grid::CardGrid, player_bar::PlayerBar, playlist::Playlist};
use crate::controller::PlaylistController;
use crate::controls::{nudge_slider, volume_from_slider, Drawer, SLIDER_STEP};
use crate::engine::EngineHandle;
use crate::focus::FocusRing;
use crate::widgets::{status_bar::draw_keys_bar, toast::ToastManager};

const PLAYER_BAR_HEIGHT: u16 = 4;
const DRAWER_PERCENT: u16 = 35;
/// Keyboard seek step, as a fraction of the track.
const SEEK_STEP: f64 = 0.05;

enum AppMessage {
    Event(Event),
    Engine(EngineEvent),
    ManifestLoaded(Option<Manifest>),
    FolderLoaded(OpenTicket, Option<FolderDescriptor>),
    CardMetadata {
        folder: String,
        info: Option<FolderInfo>,
        cover: Option<String>,
    },
}

/// Where each pane was last drawn; mouse hits are resolved against it.
#[derive(Default, Clone, Copy)]
struct PaneAreas {
    playlist: Rect,
    cards: Rect,
    player: Rect,
}

pub struct App {
    state: AppState,
    controller: PlaylistController,
    library: Library,
    engine: EngineHandle,

    card_grid: CardGrid,
    playlist: Playlist,
    player_bar: PlayerBar,
    focus: FocusRing,
    toasts: ToastManager,
    areas: PaneAreas,

    mute_restore_volume: f32,
    autoplay_first_folder: bool,
    /// Set once the manifest has been seen, so a reload never re-autoplays.
    autoplayed: bool,
    tx: Option<mpsc::Sender<AppMessage>>,
    should_quit: bool,
}

fn drawer_ring(drawer: Drawer) -> Vec<ComponentId> {
    match drawer {
        Drawer::Open => vec![
            ComponentId::CardGrid,
            ComponentId::Playlist,
            ComponentId::PlayerBar,
        ],
        Drawer::Closed => vec![ComponentId::CardGrid, ComponentId::PlayerBar],
    }
}

fn hit(r: Rect, col: u16, row: u16) -> bool {
    r.width > 0
        && r.height > 0
        && col >= r.x
        && col < r.x + r.width
        && row >= r.y
        && row < r.y + r.height
}

impl App {
    pub fn new(config: &Config, urls: SiteUrls, engine: EngineHandle) -> Self {
        let library = Library::new(urls.clone());
        let session = Session::new(
            urls.clone(),
            &config.player.audio_extension,
            config.player.prefer_remote_urls,
        );
        let site_label = format!("{}{}", urls.origin(), urls.base_path());
        let state = AppState::new(site_label, config.mpv.default_volume);

        Self {
            focus: FocusRing::new(drawer_ring(state.drawer)),
            state,
            controller: PlaylistController::new(session, library.clone(), engine.clone()),
            library,
            engine,
            card_grid: CardGrid::new(),
            playlist: Playlist::new(),
            player_bar: PlayerBar::new(),
            toasts: ToastManager::new(),
            areas: PaneAreas::default(),
            mute_restore_volume: config.player.mute_restore_volume,
            autoplay_first_folder: config.player.autoplay_first_folder,
            autoplayed: false,
            tx: None,
            should_quit: false,
        }
    }

    // ── Main run loop ─────────────────────────────────────────────────────────

    pub async fn run(mut self, mut engine_rx: broadcast::Receiver<EngineEvent>) -> anyhow::Result<()> {
        debug!("run(): enabling raw mode");
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        debug!("run(): terminal created, size={:?}", terminal.size());

        let (tx, mut rx) = mpsc::channel::<AppMessage>(1024);
        self.tx = Some(tx.clone());

        // ── Background task: keyboard/mouse events ────────────────────────────
        let event_tx = tx.clone();
        tokio::task::spawn_blocking(move || loop {
            match event::read() {
                Ok(ev) => {
                    if event_tx.blocking_send(AppMessage::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        });

        // ── Background task: engine events → AppMessage ───────────────────────
        let engine_tx = tx.clone();
        tokio::spawn(async move {
            loop {
                match engine_rx.recv().await {
                    Ok(ev) => {
                        if engine_tx.send(AppMessage::Engine(ev)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("engine receiver lagged by {} events", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        // ── Background task: first manifest fetch ─────────────────────────────
        let library = self.library.clone();
        let manifest_tx = tx.clone();
        tokio::spawn(async move {
            let manifest = library.load_manifest().await;
            let _ = manifest_tx.send(AppMessage::ManifestLoaded(manifest)).await;
        });

        let mut toast_tick = tokio::time::interval(Duration::from_millis(250));
        toast_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // ── Main loop ─────────────────────────────────────────────────────────
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal.draw(|f| self.draw(f))?;
            }
            needs_redraw = false;

            if self.should_quit {
                break;
            }

            tokio::select! {
                Some(msg) = rx.recv() => {
                    self.handle_message(msg);
                    // Drain what is already queued so a burst of progress
                    // events costs one frame.
                    while let Ok(next) = rx.try_recv() {
                        self.handle_message(next);
                    }
                    needs_redraw = true;
                }
                _ = toast_tick.tick() => {
                    if !self.toasts.is_empty() {
                        self.toasts.tick();
                        needs_redraw = true;
                    }
                }
            }
        }

        // ── Teardown ──────────────────────────────────────────────────────────
        self.engine.shutdown().await;
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        Ok(())
    }

    // ── Message handler ───────────────────────────────────────────────────────

    fn handle_message(&mut self, msg: AppMessage) {
        match msg {
            AppMessage::Event(ev) => {
                let actions = match ev {
                    Event::Key(key) if key.kind != KeyEventKind::Release => self.handle_key(key),
                    Event::Mouse(mouse) => self.handle_mouse(mouse),
                    _ => vec![],
                };
                for a in actions {
                    self.dispatch(a);
                }
            }
            AppMessage::Engine(ev) => self.on_engine_event(ev),
            AppMessage::ManifestLoaded(manifest) => self.on_manifest(manifest),
            AppMessage::FolderLoaded(ticket, descriptor) => {
                let folder = ticket.folder.clone();
                if self
                    .controller
                    .finish_open(&ticket, descriptor, &mut self.state)
                    && self.state.playlist_rows.is_empty()
                {
                    self.toasts.warning(format!("no songs in {}", folder));
                }
            }
            AppMessage::CardMetadata {
                folder,
                info,
                cover,
            } => {
                self.card_grid.render_card(&folder, info.as_ref(), cover);
            }
        }
    }

    fn on_manifest(&mut self, manifest: Option<Manifest>) {
        let Some(manifest) = manifest else {
            self.toasts
                .error("could not load the music library; see the log for details");
            return;
        };
        info!("manifest loaded: {} folders", manifest.folders.len());
        self.card_grid
            .seed_from_manifest(&manifest, self.library.urls());

        if let Some(tx) = self.tx.clone() {
            for name in manifest.folder_names() {
                let library = self.library.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    let info = library.load_supplemental_info(&name).await;
                    let cover = resolve_cover(&library, &name, info.as_ref()).await;
                    let _ = tx
                        .send(AppMessage::CardMetadata {
                            folder: name,
                            info,
                            cover,
                        })
                        .await;
                });
            }
        }

        if self.autoplay_first_folder && !self.autoplayed {
            self.autoplayed = true;
            if let Some(first) = manifest.folders.first() {
                self.dispatch(Action::OpenFolder(first.name.clone()));
            }
        }
    }

    fn on_engine_event(&mut self, ev: EngineEvent) {
        match ev {
            EngineEvent::Progress {
                time_pos_secs,
                duration_secs,
            } => {
                self.state.position = PlaybackPosition {
                    time_pos_secs,
                    duration_secs,
                };
            }
            EngineEvent::Paused { paused } => {
                if self.controller.session().current_song().is_some() {
                    self.state.play_icon = if paused {
                        PlayIcon::Paused
                    } else {
                        PlayIcon::Playing
                    };
                }
            }
            EngineEvent::Status { status } => self.state.status = status,
            EngineEvent::Ended => self.controller.on_ended(&mut self.state),
            EngineEvent::PlayFailed { reason } => {
                self.state.play_icon = PlayIcon::Paused;
                self.toasts.error(format!("playback failed: {}", reason));
            }
            EngineEvent::Health { health } => {
                if health == EngineHealth::Dead {
                    self.toasts.error("mpv stopped; it restarts on the next command");
                }
                self.state.health = health;
            }
        }
    }

    // ── Keyboard handling ─────────────────────────────────────────────────────

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Action> {
        match key.code {
            KeyCode::Char('c') if key.modifiers == KeyModifiers::CONTROL => {
                return vec![Action::Quit];
            }
            KeyCode::Char('q') => return vec![Action::Quit],
            KeyCode::Tab => return vec![Action::FocusNext],
            KeyCode::BackTab => return vec![Action::FocusPrev],
            KeyCode::Char(' ') => return vec![Action::TogglePlay],
            KeyCode::Char('n') => return vec![Action::PlayNext],
            KeyCode::Char('p') => return vec![Action::PlayPrev],
            KeyCode::Char('m') => return vec![Action::ToggleMute],
            KeyCode::Char('+') | KeyCode::Char('=') => {
                return vec![Action::NudgeVolume(SLIDER_STEP)];
            }
            KeyCode::Char('-') => return vec![Action::NudgeVolume(-SLIDER_STEP)],
            KeyCode::Char(',') => {
                let f = (self.state.position.fraction() - SEEK_STEP).max(0.0);
                return vec![Action::SeekTo(f)];
            }
            KeyCode::Char('.') => {
                let f = (self.state.position.fraction() + SEEK_STEP).min(1.0);
                return vec![Action::SeekTo(f)];
            }
            KeyCode::Char('h') => {
                return vec![match self.state.drawer {
                    Drawer::Open => Action::CloseDrawer,
                    Drawer::Closed => Action::OpenDrawer,
                }];
            }
            KeyCode::Esc => return vec![Action::CloseDrawer],
            KeyCode::Char('1') => return vec![Action::FocusPane(ComponentId::CardGrid)],
            KeyCode::Char('2') => return vec![Action::FocusPane(ComponentId::Playlist)],
            KeyCode::Char('3') => return vec![Action::FocusPane(ComponentId::PlayerBar)],
            _ => {}
        }

        let s = &self.state;
        match self.focus.current() {
            Some(ComponentId::CardGrid) => self.card_grid.handle_key(key, s),
            Some(ComponentId::Playlist) => self.playlist.handle_key(key, s),
            Some(ComponentId::PlayerBar) => self.player_bar.handle_key(key, s),
            None => vec![],
        }
    }

    // ── Mouse handling ────────────────────────────────────────────────────────

    fn handle_mouse(&mut self, event: MouseEvent) -> Vec<Action> {
        if !matches!(
            event.kind,
            MouseEventKind::Down(_) | MouseEventKind::ScrollUp | MouseEventKind::ScrollDown
        ) {
            return vec![];
        }
        let (col, row) = (event.column, event.row);
        let areas = self.areas;
        let s = &self.state;

        let (id, mut actions) = if self.state.drawer == Drawer::Open && hit(areas.playlist, col, row)
        {
            (
                ComponentId::Playlist,
                self.playlist.handle_mouse(event, areas.playlist, s),
            )
        } else if hit(areas.cards, col, row) {
            (
                ComponentId::CardGrid,
                self.card_grid.handle_mouse(event, areas.cards, s),
            )
        } else if hit(areas.player, col, row) {
            (
                ComponentId::PlayerBar,
                self.player_bar.handle_mouse(event, areas.player, s),
            )
        } else {
            return vec![];
        };

        if !self.focus.is_focused(id) {
            actions.insert(0, Action::FocusPane(id));
        }
        actions
    }

    // ── Action dispatcher ─────────────────────────────────────────────────────

    fn dispatch(&mut self, action: Action) {
        let secondary: Vec<Action> = {
            let s = &self.state;
            let mut out = Vec::new();
            out.extend(self.card_grid.on_action(&action, s));
            out.extend(self.playlist.on_action(&action, s));
            out.extend(self.player_bar.on_action(&action, s));
            out
        };

        self.apply_action(action);

        for a in secondary {
            self.apply_action(a);
        }
    }

    fn apply_action(&mut self, action: Action) {
        if action != Action::Noop {
            debug!("apply_action: {:?}", action);
        }
        match action {
            // ── Playlist ──────────────────────────────────────────────────────
            Action::OpenFolder(raw) => {
                let (ticket, fetch) = self.controller.open_folder(&raw, &mut self.state);
                if let Some(tx) = self.tx.clone() {
                    tokio::spawn(async move {
                        let descriptor = fetch.await;
                        let _ = tx.send(AppMessage::FolderLoaded(ticket, descriptor)).await;
                    });
                }
            }
            Action::PlayAt(i) => self.controller.play_at(i, &mut self.state),
            Action::PlayNext => self.controller.play_next(&mut self.state),
            Action::PlayPrev => self.controller.play_prev(&mut self.state),

            // ── Transport ─────────────────────────────────────────────────────
            Action::TogglePlay => self.controller.toggle_play(&mut self.state),
            Action::SeekTo(fraction) => {
                self.engine.command(EngineCommand::SeekTo { fraction });
            }
            Action::SetVolumeSlider(v) => {
                self.state.volume_slider = v;
                self.engine.command(EngineCommand::SetVolume {
                    value: volume_from_slider(v),
                });
            }
            Action::NudgeVolume(delta) => {
                let v = nudge_slider(self.state.volume_slider, delta);
                self.apply_action(Action::SetVolumeSlider(v));
            }
            Action::ToggleMute => {
                let (icon, value) = self.state.volume_icon.toggle(self.mute_restore_volume);
                self.state.volume_icon = icon;
                self.engine.command(EngineCommand::SetVolume { value });
            }

            // ── Navigation ────────────────────────────────────────────────────
            Action::OpenDrawer => self.set_drawer(Drawer::Open),
            Action::CloseDrawer => self.set_drawer(Drawer::Closed),
            Action::FocusNext => {
                self.focus.next();
            }
            Action::FocusPrev => {
                self.focus.prev();
            }
            Action::FocusPane(id) => {
                if id == ComponentId::Playlist {
                    self.set_drawer(Drawer::Open);
                }
                self.focus.set(id);
            }

            Action::Quit => self.should_quit = true,
            Action::Noop => {}
        }
    }

    fn set_drawer(&mut self, drawer: Drawer) {
        self.state.drawer = drawer;
        self.focus.set_items(drawer_ring(drawer));
    }

    // ── Drawing ───────────────────────────────────────────────────────────────

    fn draw(&mut self, frame: &mut ratatui::Frame) {
        let area = frame.area();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),
                Constraint::Length(PLAYER_BAR_HEIGHT),
                Constraint::Length(1),
            ])
            .split(area);

        let (playlist_area, cards_area) = match self.state.drawer {
            Drawer::Open => {
                let cols = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([
                        Constraint::Percentage(DRAWER_PERCENT),
                        Constraint::Min(10),
                    ])
                    .split(rows[0]);
                (cols[0], cols[1])
            }
            Drawer::Closed => (Rect::default(), rows[0]),
        };
        self.areas = PaneAreas {
            playlist: playlist_area,
            cards: cards_area,
            player: rows[1],
        };

        let s = &self.state;
        if s.drawer == Drawer::Open {
            let focused = self.focus.is_focused(ComponentId::Playlist);
            self.playlist.draw(frame, playlist_area, focused, s);
        }
        let focused = self.focus.is_focused(ComponentId::CardGrid);
        self.card_grid.draw(frame, cards_area, focused, s);
        let focused = self.focus.is_focused(ComponentId::PlayerBar);
        self.player_bar.draw(frame, rows[1], focused, s);
        draw_keys_bar(frame, rows[2], s.status, &s.health);

        self.toasts.draw(frame, area);
    }
}

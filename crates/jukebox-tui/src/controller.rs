//! PlaylistController: applies `Session` transitions.
//!
//! The session decides; this type carries the resulting effects out to the
//! engine handle and the view state. It is owned by the App and only ever
//! touched from the event loop.

use std::future::Future;

use jukebox_proto::manifest::FolderDescriptor;
use jukebox_proto::protocol::{EngineCommand, PlaybackPosition};
use jukebox_proto::resolver::Library;
use jukebox_proto::session::{Effect, OpenTicket, PlayIcon, Session};
use tracing::{debug, info};

use crate::app_state::AppState;
use crate::engine::EngineHandle;

pub struct PlaylistController {
    session: Session,
    library: Library,
    engine: EngineHandle,
}

impl PlaylistController {
    pub fn new(session: Session, library: Library, engine: EngineHandle) -> Self {
        Self {
            session,
            library,
            engine,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Start opening `raw`. The old playlist is torn down immediately; the
    /// returned future fetches the folder and must be handed back, with the
    /// ticket, to [`PlaylistController::finish_open`].
    pub fn open_folder(
        &mut self,
        raw: &str,
        state: &mut AppState,
    ) -> (
        OpenTicket,
        impl Future<Output = Option<FolderDescriptor>> + Send + 'static,
    ) {
        let (ticket, effects) = self.session.begin_open(raw);
        info!("opening folder {:?} (gen {})", ticket.folder, ticket.generation);
        state.open_folder = Some(ticket.folder.clone());
        state.loading = true;
        self.apply(effects, state);

        let library = self.library.clone();
        let folder = ticket.folder.clone();
        let fetch = async move { library.load_folder(&folder).await };
        (ticket, fetch)
    }

    /// Install a fetched folder. Returns false when the ticket was stale and
    /// the result was dropped.
    pub fn finish_open(
        &mut self,
        ticket: &OpenTicket,
        descriptor: Option<FolderDescriptor>,
        state: &mut AppState,
    ) -> bool {
        if ticket.generation != self.session.generation() {
            debug!(
                "dropping stale folder {:?} (gen {}, current {})",
                ticket.folder,
                ticket.generation,
                self.session.generation()
            );
            return false;
        }
        state.loading = false;
        let effects = self.session.finish_open(ticket, descriptor);
        self.apply(effects, state);
        true
    }

    pub fn play_at(&mut self, i: usize, state: &mut AppState) {
        let effects = self.session.play_at(i);
        self.apply(effects, state);
    }

    pub fn play_next(&mut self, state: &mut AppState) {
        let effects = self.session.play_next();
        self.apply(effects, state);
    }

    pub fn play_prev(&mut self, state: &mut AppState) {
        let effects = self.session.play_prev();
        self.apply(effects, state);
    }

    /// The engine reported the end of the current track.
    pub fn on_ended(&mut self, state: &mut AppState) {
        let effects = self.session.on_ended();
        if effects.is_empty() {
            state.play_icon = PlayIcon::Paused;
        }
        self.apply(effects, state);
    }

    /// Flip between playing and paused, driven by the icon. Nothing happens
    /// until a song has been started.
    pub fn toggle_play(&mut self, state: &mut AppState) {
        if self.session.current_song().is_none() {
            return;
        }
        let effects = match state.play_icon {
            PlayIcon::Playing => vec![
                Effect::Engine(EngineCommand::Pause),
                Effect::SetPlayIcon(PlayIcon::Paused),
            ],
            PlayIcon::Paused => vec![
                Effect::Engine(EngineCommand::Play),
                Effect::SetPlayIcon(PlayIcon::Playing),
            ],
        };
        self.apply(effects, state);
    }

    fn apply(&self, effects: Vec<Effect>, state: &mut AppState) {
        for effect in effects {
            match effect {
                Effect::Engine(cmd) => self.engine.command(cmd),
                Effect::ShowPlaylist(rows) => state.playlist_rows = rows,
                Effect::SetActiveRow(row) => state.active_row = row,
                Effect::SetNowPlaying(label) => state.now_playing = label,
                Effect::SetPlayIcon(icon) => state.play_icon = icon,
                Effect::ResetProgress => state.position = PlaybackPosition::default(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineInput;
    use axum::http::{StatusCode, Uri};
    use axum::Router;
    use jukebox_proto::manifest::SongRef;
    use jukebox_proto::urls::SiteUrls;
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;

    const MANIFEST: &str = r#"{"folders":[
        {"name":"ncs","title":"NCS","songs":["01 - Alpha_Song","02_Beta",{"file":"Gamma.mp3"}]},
        {"name":"empty","songs":[]}
    ]}"#;

    async fn serve_manifest() -> String {
        async fn handler(uri: Uri) -> (StatusCode, &'static str) {
            if uri.path() == "/music-data.json" {
                (StatusCode::OK, MANIFEST)
            } else {
                (StatusCode::NOT_FOUND, "")
            }
        }
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, Router::new().fallback(handler)).await;
        });
        format!("http://{}", addr)
    }

    fn controller(origin: &str) -> (PlaylistController, mpsc::Receiver<EngineInput>, AppState) {
        let urls = SiteUrls::new(origin, "/");
        let (tx, rx) = mpsc::channel(64);
        let ctl = PlaylistController::new(
            Session::new(urls.clone(), "mp3", false),
            Library::new(urls),
            EngineHandle::new(tx),
        );
        (ctl, rx, AppState::new(String::new(), 0.5))
    }

    fn drain(rx: &mut mpsc::Receiver<EngineInput>) -> Vec<EngineCommand> {
        let mut out = Vec::new();
        while let Ok(input) = rx.try_recv() {
            if let EngineInput::Command(cmd) = input {
                out.push(cmd);
            }
        }
        out
    }

    fn three_songs() -> FolderDescriptor {
        FolderDescriptor {
            name: "ncs".into(),
            songs: vec![
                SongRef::Stem("a".into()),
                SongRef::Stem("b".into()),
                SongRef::Stem("c".into()),
            ],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn open_fetches_and_starts_first_song() {
        let origin = serve_manifest().await;
        let (mut ctl, mut rx, mut state) = controller(&origin);

        let (ticket, fetch) = ctl.open_folder("songs/ncs/", &mut state);
        assert_eq!(drain(&mut rx), vec![EngineCommand::Stop]);
        assert!(state.loading);

        let descriptor = fetch.await;
        assert!(ctl.finish_open(&ticket, descriptor, &mut state));

        assert_eq!(state.playlist_rows, vec!["Alpha Song", "Beta", "Gamma"]);
        assert_eq!(state.active_row, Some(0));
        assert_eq!(state.now_playing, "Alpha Song");
        assert_eq!(state.play_icon, PlayIcon::Playing);
        assert!(!state.loading);

        let cmds = drain(&mut rx);
        assert_eq!(cmds.len(), 2);
        match &cmds[0] {
            EngineCommand::Load { src } => {
                assert!(src.ends_with("/songs/ncs/01%20-%20Alpha_Song.mp3"), "{}", src)
            }
            other => panic!("expected load, got {:?}", other),
        }
        assert_eq!(cmds[1], EngineCommand::Play);
    }

    #[tokio::test]
    async fn empty_folder_loads_nothing() {
        let origin = serve_manifest().await;
        let (mut ctl, mut rx, mut state) = controller(&origin);
        state.now_playing = "old".into();
        state.playlist_rows = vec!["old".into()];

        let (ticket, fetch) = ctl.open_folder("empty", &mut state);
        let descriptor = fetch.await;
        ctl.finish_open(&ticket, descriptor, &mut state);

        assert!(state.playlist_rows.is_empty());
        assert_eq!(state.now_playing, "");
        assert_eq!(state.active_row, None);
        assert_eq!(drain(&mut rx), vec![EngineCommand::Stop]);
    }

    #[tokio::test]
    async fn stale_open_is_dropped() {
        let (mut ctl, mut rx, mut state) = controller("http://127.0.0.1:9");
        let (first, _) = ctl.open_folder("ncs", &mut state);
        let (second, _) = ctl.open_folder("other", &mut state);
        drain(&mut rx);

        assert!(!ctl.finish_open(&first, Some(three_songs()), &mut state));
        assert!(state.playlist_rows.is_empty());
        assert!(drain(&mut rx).is_empty());
        assert!(state.loading);

        assert!(ctl.finish_open(&second, None, &mut state));
        assert_eq!(state.open_folder.as_deref(), Some("other"));
    }

    #[tokio::test]
    async fn next_past_the_end_and_toggle() {
        let (mut ctl, mut rx, mut state) = controller("http://127.0.0.1:9");
        let (ticket, _) = ctl.open_folder("ncs", &mut state);
        ctl.finish_open(&ticket, Some(three_songs()), &mut state);
        drain(&mut rx);

        ctl.play_next(&mut state);
        ctl.play_next(&mut state);
        assert_eq!(ctl.session().index(), Some(2));
        assert_eq!(state.active_row, Some(2));
        drain(&mut rx);

        ctl.on_ended(&mut state);
        assert!(drain(&mut rx).is_empty());
        assert_eq!(state.play_icon, PlayIcon::Paused);

        ctl.toggle_play(&mut state);
        assert_eq!(drain(&mut rx), vec![EngineCommand::Play]);
        assert_eq!(state.play_icon, PlayIcon::Playing);
        ctl.toggle_play(&mut state);
        assert_eq!(drain(&mut rx), vec![EngineCommand::Pause]);
    }

    #[tokio::test]
    async fn toggle_before_any_song_is_noop() {
        let (mut ctl, mut rx, mut state) = controller("http://127.0.0.1:9");
        ctl.toggle_play(&mut state);
        ctl.play_at(3, &mut state);
        assert!(drain(&mut rx).is_empty());
        assert_eq!(state.play_icon, PlayIcon::Paused);
    }
}

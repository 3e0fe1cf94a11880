/// PlaybackEngine: single owner of the mpv process.
///
/// Everything that wants audio to change sends an `EngineInput` to this
/// loop; state changes go out as `EngineEvent`s on a broadcast channel.
/// mpv state is observed, not polled: every fresh connection registers
/// property observers and mpv pushes `property-change` events. The 10 s
/// heartbeat only checks that the process is still alive.
use jukebox_proto::protocol::{EngineCommand, EngineEvent, EngineHealth, PlaybackStatus};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

use crate::mpv::{
    MpvDriver, MpvEvent, MpvHandle, OBS_CORE_IDLE, OBS_DURATION, OBS_PAUSE, OBS_TIME_POS,
};

const HEARTBEAT_SECS: u64 = 10;
const CONNECTING_TIMEOUT_SECS: u64 = 15;

/// All inputs into the engine loop.
#[derive(Debug)]
pub enum EngineInput {
    Command(EngineCommand),
    HeartbeatTick,
    Mpv(MpvEvent),
    Shutdown,
}

/// Cloneable sender side of the engine loop.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineInput>,
}

impl EngineHandle {
    pub fn new(tx: mpsc::Sender<EngineInput>) -> Self {
        Self { tx }
    }

    /// Queue a command without waiting. The UI loop never blocks on audio.
    pub fn command(&self, cmd: EngineCommand) {
        if let Err(e) = self.tx.try_send(EngineInput::Command(cmd)) {
            warn!("engine: dropping command: {}", e);
        }
    }

    pub async fn shutdown(&self) {
        let _ = self.tx.send(EngineInput::Shutdown).await;
    }
}

pub struct PlaybackEngine {
    driver: MpvDriver,
    mpv_handle: Option<MpvHandle>,
    input_tx: mpsc::Sender<EngineInput>,
    events_tx: broadcast::Sender<EngineEvent>,
    /// Source of the last successful load.
    src: Option<String>,
    /// A track has been loaded since the last stop.
    loaded: bool,
    /// Set on load, cleared when the track ends or fails; `Ended` fires
    /// only while armed.
    armed: bool,
    /// mpv playlist entry of the armed load, once known.
    armed_entry: Option<u64>,
    /// The loaded file ran out or failed; mpv is idle with nothing to
    /// unpause, so the next play loads `src` again.
    needs_reload: bool,
    intend_playing: bool,
    health: EngineHealth,
    obs_core_idle: Option<bool>,
    obs_pause: bool,
    obs_time_pos: Option<f64>,
    obs_duration: Option<f64>,
    connecting_since: Option<tokio::time::Instant>,
    last_status: PlaybackStatus,
}

impl PlaybackEngine {
    pub fn new(
        initial_volume: f32,
        input_tx: mpsc::Sender<EngineInput>,
        events_tx: broadcast::Sender<EngineEvent>,
    ) -> Self {
        Self {
            driver: MpvDriver::new(initial_volume),
            mpv_handle: None,
            input_tx,
            events_tx,
            src: None,
            loaded: false,
            armed: false,
            armed_entry: None,
            needs_reload: false,
            intend_playing: false,
            health: EngineHealth::Absent,
            obs_core_idle: None,
            obs_pause: true,
            obs_time_pos: None,
            obs_duration: None,
            connecting_since: None,
            last_status: PlaybackStatus::Idle,
        }
    }

    /// Run until `Shutdown` or until every sender is gone.
    pub async fn run(mut self, mut input_rx: mpsc::Receiver<EngineInput>) -> anyhow::Result<()> {
        info!("engine: starting event loop");

        let heartbeat_tx = self.input_tx.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(tokio::time::Duration::from_secs(HEARTBEAT_SECS)).await;
                if heartbeat_tx.send(EngineInput::HeartbeatTick).await.is_err() {
                    break;
                }
            }
        });

        while let Some(input) = input_rx.recv().await {
            match input {
                EngineInput::Shutdown => {
                    info!("engine: shutdown requested");
                    break;
                }
                EngineInput::Command(cmd) => {
                    debug!("engine: command {:?}", cmd);
                    if let Err(e) = self.handle_command(cmd).await {
                        error!("engine: command error: {}", e);
                    }
                }
                EngineInput::Mpv(evt) => self.handle_mpv_event(evt).await,
                EngineInput::HeartbeatTick => {
                    if self.mpv_handle.is_some()
                        && self.driver.has_process()
                        && !self.driver.process_alive()
                    {
                        warn!("engine: heartbeat: mpv process died");
                        self.mpv_handle = None;
                        self.set_health(EngineHealth::Dead);
                        self.reset_observed_state();
                    }
                    if self.intend_playing && !self.obs_pause {
                        self.maybe_update_status();
                    }
                }
            }
        }

        info!("engine: cleanup, killing mpv");
        self.driver.kill().await;
        Ok(())
    }

    fn publish(&self, event: EngineEvent) {
        // no subscribers is fine (e.g. during shutdown)
        let _ = self.events_tx.send(event);
    }

    fn publish_progress(&self) {
        self.publish(EngineEvent::Progress {
            time_pos_secs: self.obs_time_pos,
            duration_secs: self.obs_duration,
        });
    }

    // ── mpv events ────────────────────────────────────────────────────────────

    async fn handle_mpv_event(&mut self, evt: MpvEvent) {
        if let Some((obs_id, data)) = evt.as_property_change() {
            match obs_id {
                OBS_CORE_IDLE => {
                    let val = data.as_bool();
                    if val != self.obs_core_idle {
                        debug!("mpv: core-idle → {:?}", val);
                        self.obs_core_idle = val;
                        self.maybe_update_status();
                    }
                }
                OBS_PAUSE => {
                    let val = data.as_bool().unwrap_or(false);
                    if val != self.obs_pause {
                        debug!("mpv: pause → {}", val);
                        self.obs_pause = val;
                        self.publish(EngineEvent::Paused { paused: val });
                        self.maybe_update_status();
                    }
                }
                OBS_TIME_POS => {
                    self.obs_time_pos = data.as_f64();
                    self.publish_progress();
                }
                OBS_DURATION => {
                    let val = data.as_f64();
                    if val != self.obs_duration {
                        self.obs_duration = val;
                        self.publish_progress();
                    }
                }
                _ => {}
            }
            return;
        }

        match evt.event_name() {
            Some("end-file") => {
                let reason = evt.end_reason().unwrap_or("unknown");
                let current = self.armed && self.is_armed_entry(evt.playlist_entry_id());
                info!(
                    "mpv: end-file reason={} entry={:?} current={}",
                    reason,
                    evt.playlist_entry_id(),
                    current
                );
                match reason {
                    "eof" if current => {
                        self.armed = false;
                        self.needs_reload = true;
                        self.intend_playing = false;
                        self.publish(EngineEvent::Ended);
                    }
                    "error" if current => {
                        self.armed = false;
                        self.needs_reload = true;
                        self.intend_playing = false;
                        let why = evt.file_error().unwrap_or("playback error").to_string();
                        warn!("mpv: track failed: {}", why);
                        self.publish(EngineEvent::PlayFailed { reason: why });
                        self.publish(EngineEvent::Paused { paused: true });
                    }
                    // "stop" is the previous file being replaced by loadfile
                    _ => {}
                }
                self.obs_core_idle = Some(true);
                self.maybe_update_status();
            }
            Some("start-file") => {
                if self.armed && self.armed_entry.is_none() {
                    self.armed_entry = evt.playlist_entry_id();
                }
                self.connecting_since = None;
                self.obs_core_idle = Some(true);
                self.maybe_update_status();
            }
            Some("file-loaded") => {
                // re-register so mpv pushes the new file's duration right away
                if let Some(h) = self.mpv_handle.clone() {
                    tokio::spawn(async move {
                        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
                        h.observe_all_properties().await;
                    });
                }
            }
            _ => {}
        }
    }

    /// Whether an end-file for `entry` belongs to the armed load. Until the
    /// armed entry is known, an event naming some entry is a leftover from
    /// the file that load replaced; events without ids are trusted.
    fn is_armed_entry(&self, entry: Option<u64>) -> bool {
        match (self.armed_entry, entry) {
            (Some(armed), Some(entry)) => armed == entry,
            (None, Some(_)) => false,
            (_, None) => true,
        }
    }

    /// Derive the playback status from observed state, publish on change.
    fn maybe_update_status(&mut self) {
        let status = if !self.intend_playing {
            self.connecting_since = None;
            PlaybackStatus::Idle
        } else if self.obs_pause {
            self.connecting_since = None;
            PlaybackStatus::Paused
        } else {
            match self.obs_core_idle {
                Some(false) => {
                    self.connecting_since = None;
                    PlaybackStatus::Playing
                }
                _ => {
                    let since = self
                        .connecting_since
                        .get_or_insert_with(tokio::time::Instant::now);
                    if since.elapsed().as_secs() >= CONNECTING_TIMEOUT_SECS {
                        warn!("mpv: no audio after {}s", CONNECTING_TIMEOUT_SECS);
                        PlaybackStatus::Error
                    } else {
                        PlaybackStatus::Connecting
                    }
                }
            }
        };

        if status != self.last_status {
            info!("engine: status {:?} → {:?}", self.last_status, status);
            self.last_status = status;
            self.publish(EngineEvent::Status { status });
        }
    }

    fn reset_observed_state(&mut self) {
        self.obs_core_idle = None;
        self.obs_pause = true;
        self.obs_time_pos = None;
        self.obs_duration = None;
        self.connecting_since = None;
    }

    fn set_health(&mut self, health: EngineHealth) {
        if self.health != health {
            info!("engine: mpv health {:?} → {:?}", self.health, health);
            self.health = health.clone();
            self.publish(EngineEvent::Health { health });
        }
    }

    // ── mpv handle management ─────────────────────────────────────────────────

    /// Forward raw mpv events from one connection into our own input queue.
    fn spawn_event_forwarder(&self, mut event_rx: mpsc::Receiver<MpvEvent>) {
        let input_tx = self.input_tx.clone();
        tokio::spawn(async move {
            while let Some(evt) = event_rx.recv().await {
                if input_tx.send(EngineInput::Mpv(evt)).await.is_err() {
                    break;
                }
            }
        });
    }

    async fn ensure_mpv_handle(&mut self) -> Option<MpvHandle> {
        if self.mpv_handle.is_some() && self.driver.has_process() && !self.driver.process_alive() {
            warn!("engine: mpv process died, dropping handle");
            self.mpv_handle = None;
            self.set_health(EngineHealth::Dead);
            self.reset_observed_state();
        }

        if self.mpv_handle.is_none() {
            let was_dead = self.health == EngineHealth::Dead;
            let (event_tx, event_rx) = mpsc::channel::<MpvEvent>(64);
            self.spawn_event_forwarder(event_rx);

            let handle = match self.driver.try_reconnect(event_tx.clone()).await {
                Some(h) => h,
                None => {
                    self.set_health(if was_dead {
                        EngineHealth::Restarting
                    } else {
                        EngineHealth::Starting
                    });
                    match self.driver.spawn_and_connect(event_tx).await {
                        Ok(h) => h,
                        Err(e) => {
                            warn!("engine: failed to start mpv: {}", e);
                            self.set_health(EngineHealth::Dead);
                            return None;
                        }
                    }
                }
            };

            self.set_health(EngineHealth::Running);
            let observer = handle.clone();
            tokio::spawn(async move {
                observer.observe_all_properties().await;
            });
            self.mpv_handle = Some(handle);
        }

        self.mpv_handle.clone()
    }

    // ── commands ──────────────────────────────────────────────────────────────

    async fn handle_command(&mut self, cmd: EngineCommand) -> anyhow::Result<()> {
        match cmd {
            EngineCommand::Load { src } => self.load(src).await,
            EngineCommand::Play => self.play().await,
            EngineCommand::Pause => self.pause().await?,
            EngineCommand::Stop => self.stop().await,
            EngineCommand::SeekTo { fraction } => self.seek_fraction(fraction).await?,
            EngineCommand::SetVolume { value } => self.set_volume(value).await?,
        }
        Ok(())
    }

    async fn load(&mut self, src: String) {
        info!("engine: load {}", src);
        self.armed = false;
        self.armed_entry = None;
        self.obs_time_pos = None;
        self.obs_duration = None;
        self.obs_core_idle = None;
        self.connecting_since = None;
        self.intend_playing = false;
        self.publish_progress();

        let Some(handle) = self.ensure_mpv_handle().await else {
            self.fail("audio output unavailable".to_string());
            return;
        };
        match handle.load_paused(&src).await {
            Ok(entry) => {
                self.loaded = true;
                self.armed = true;
                self.armed_entry = entry;
                self.needs_reload = false;
                self.src = Some(src);
            }
            Err(e) => {
                warn!("engine: failed to load '{}': {}", src, e);
                self.fail(e.to_string());
            }
        }
    }

    async fn play(&mut self) {
        if !self.loaded {
            debug!("engine: play with nothing loaded");
            return;
        }
        if self.needs_reload {
            let Some(src) = self.src.clone() else {
                return;
            };
            debug!("engine: reloading finished track {}", src);
            self.load(src).await;
            if !self.armed {
                return;
            }
        }
        self.intend_playing = true;
        self.connecting_since = None;

        let result = match self.ensure_mpv_handle().await {
            Some(handle) => handle.set_pause(false).await,
            None => Err(anyhow::anyhow!("audio output unavailable")),
        };
        match result {
            Ok(()) => self.maybe_update_status(),
            Err(e) => {
                warn!("engine: play failed: {}", e);
                self.fail(e.to_string());
            }
        }
    }

    /// Report a start failure; the UI stays paused.
    fn fail(&mut self, reason: String) {
        self.intend_playing = false;
        self.publish(EngineEvent::PlayFailed { reason });
        self.publish(EngineEvent::Paused { paused: true });
        self.maybe_update_status();
    }

    async fn pause(&mut self) -> anyhow::Result<()> {
        self.intend_playing = false;
        if let Some(handle) = self.mpv_handle.as_ref() {
            handle.set_pause(true).await?;
        }
        self.maybe_update_status();
        Ok(())
    }

    async fn stop(&mut self) {
        self.intend_playing = false;
        self.armed = false;
        if let Some(handle) = self.mpv_handle.clone() {
            if let Err(e) = handle.set_pause(true).await {
                debug!("engine: stop: pause failed: {}", e);
            }
            if self.loaded {
                if let Err(e) = handle.seek_to(0.0).await {
                    debug!("engine: stop: rewind failed: {}", e);
                }
            }
        }
        if self.obs_time_pos.is_some() {
            self.obs_time_pos = Some(0.0);
        }
        self.publish_progress();
        self.maybe_update_status();
    }

    async fn seek_fraction(&mut self, fraction: f64) -> anyhow::Result<()> {
        let duration = match self.obs_duration {
            Some(d) if d > 0.0 && d.is_finite() => d,
            _ => {
                debug!("engine: seek ignored, duration unknown");
                return Ok(());
            }
        };
        let target = fraction.clamp(0.0, 1.0) * duration;
        if let Some(handle) = self.mpv_handle.as_ref() {
            handle.seek_to(target).await?;
        }
        Ok(())
    }

    async fn set_volume(&mut self, value: f32) -> anyhow::Result<()> {
        let value = value.clamp(0.0, 1.0);
        self.driver.last_volume = value;
        if let Some(handle) = self.mpv_handle.as_ref() {
            handle.set_volume(value).await?;
        }
        Ok(())
    }
}

/// Spawn the engine loop; returns its command handle and event sender
/// (subscribe for a receiver).
pub fn spawn(initial_volume: f32) -> (EngineHandle, broadcast::Sender<EngineEvent>) {
    let (input_tx, input_rx) = mpsc::channel::<EngineInput>(1024);
    let (events_tx, _) = broadcast::channel::<EngineEvent>(1024);

    let engine = PlaybackEngine::new(initial_volume, input_tx.clone(), events_tx.clone());
    tokio::spawn(async move {
        if let Err(e) = engine.run(input_rx).await {
            error!("engine exited with error: {}", e);
        }
    });

    (EngineHandle::new(input_tx), events_tx)
}

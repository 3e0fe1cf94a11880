/// mpv JSON-IPC driver with separated reader/writer tasks.
///
/// ```text
///   MpvDriver::spawn_and_connect()
///         │
///         ├── writer_task   ← MpvRequest via mpsc, serialised → socket
///         └── reader_task   ← JSON lines from socket
///                                ├── reply (has request_id) → matching oneshot
///                                └── event / property-change → event_tx
/// ```
///
/// Unix uses a domain socket, Windows a named pipe `\\.\pipe\<name>`.
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, info, warn};

#[cfg(unix)]
use tokio::net::UnixStream;

#[cfg(windows)]
use tokio::net::windows::named_pipe::ClientOptions;

use jukebox_proto::platform;

static NEXT_REQ_ID: AtomicU64 = AtomicU64::new(1);

const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

// observe_property ids, matched in property-change events
pub const OBS_CORE_IDLE: u64 = 1;
pub const OBS_PAUSE: u64 = 2;
pub const OBS_TIME_POS: u64 = 3;
pub const OBS_DURATION: u64 = 4;

type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<anyhow::Result<Value>>>>>;

struct PendingRequest {
    req_id: u64,
    payload: String, // one JSON line, newline included
    reply: oneshot::Sender<anyhow::Result<Value>>,
}

/// Unsolicited mpv message (no request_id).
#[derive(Debug, Clone)]
pub struct MpvEvent {
    pub raw: Value,
}

impl MpvEvent {
    /// `(observe id, data)` for a property-change event.
    pub fn as_property_change(&self) -> Option<(u64, &Value)> {
        if self.raw.get("event")?.as_str()? == "property-change" {
            let id = self.raw.get("id")?.as_u64()?;
            let data = self.raw.get("data").unwrap_or(&Value::Null);
            Some((id, data))
        } else {
            None
        }
    }

    /// "end-file", "start-file", "file-loaded", ...
    pub fn event_name(&self) -> Option<&str> {
        self.raw.get("event")?.as_str()
    }

    /// Reason field of an end-file event ("eof", "stop", "error", ...).
    pub fn end_reason(&self) -> Option<&str> {
        self.raw.get("reason")?.as_str()
    }

    /// Playlist entry a start-file/end-file event refers to. Older mpv
    /// builds omit it.
    pub fn playlist_entry_id(&self) -> Option<u64> {
        self.raw.get("playlist_entry_id")?.as_u64()
    }

    /// mpv's textual error for a failed end-file, when present.
    pub fn file_error(&self) -> Option<&str> {
        self.raw.get("file_error")?.as_str()
    }
}

/// Cloneable handle to the writer task.
#[derive(Clone)]
pub struct MpvHandle {
    tx: mpsc::Sender<PendingRequest>,
}

impl MpvHandle {
    pub async fn send(&self, command: Value) -> anyhow::Result<Value> {
        let req_id = NEXT_REQ_ID.fetch_add(1, Ordering::Relaxed);
        let msg = json!({ "command": command, "request_id": req_id });
        let mut raw = serde_json::to_string(&msg)?;
        raw.push('\n');

        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(PendingRequest {
                req_id,
                payload: raw,
                reply: reply_tx,
            })
            .await
            .map_err(|_| anyhow::anyhow!("mpv writer task gone"))?;

        tokio::time::timeout(REPLY_TIMEOUT, reply_rx)
            .await
            .map_err(|_| anyhow::anyhow!("mpv IPC timeout for req={}", req_id))?
            .map_err(|_| anyhow::anyhow!("mpv reply channel dropped req={}", req_id))?
    }
}

/// Owns the mpv child process and (re)connects to its IPC endpoint.
pub struct MpvDriver {
    pub socket_name: String,
    process: Option<tokio::process::Child>,
    pub last_volume: f32,
}

impl MpvDriver {
    pub fn new(initial_volume: f32) -> Self {
        Self {
            socket_name: platform::mpv_socket_name(),
            process: None,
            last_volume: initial_volume,
        }
    }

    /// True when we spawned the mpv we are talking to (a reattached socket
    /// has no child to watch).
    pub fn has_process(&self) -> bool {
        self.process.is_some()
    }

    pub fn process_alive(&mut self) -> bool {
        let Some(child) = self.process.as_mut() else {
            return false;
        };
        match child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                match status.code() {
                    Some(code) => warn!("mpv process exited with code: {}", code),
                    None => warn!("mpv process terminated by signal"),
                }
                false
            }
            Err(e) => {
                warn!("mpv process_alive check failed: {}", e);
                false
            }
        }
    }

    pub async fn kill(&mut self) {
        if let Some(mut p) = self.process.take() {
            let _ = p.kill().await;
        }
    }

    fn spawn_process(&mut self) -> anyhow::Result<()> {
        let mpv_binary =
            platform::find_mpv_binary().ok_or_else(|| anyhow::anyhow!("mpv binary not found"))?;

        let vol_arg = format!(
            "--volume={}",
            (self.last_volume * 100.0).clamp(0.0, 100.0).round() as i64
        );

        let stderr_path = platform::mpv_stderr_path();
        if let Some(parent) = stderr_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let stderr_file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&stderr_path)?;
        info!("mpv: logging stderr to {:?}", stderr_path);

        let child = tokio::process::Command::new(&mpv_binary)
            .arg("--no-video")
            .arg("--idle=yes")
            .arg("--keep-open=no")
            .arg(platform::mpv_socket_arg(&self.socket_name))
            .arg("--quiet")
            .arg(vol_arg)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(stderr_file)
            .kill_on_drop(true)
            .spawn()?;
        info!("mpv: spawned {:?} pid {:?}", mpv_binary, child.id());
        self.process = Some(child);
        Ok(())
    }

    #[cfg(unix)]
    pub async fn spawn_and_connect(
        &mut self,
        event_tx: mpsc::Sender<MpvEvent>,
    ) -> anyhow::Result<MpvHandle> {
        self.kill().await;

        let socket_path = std::path::PathBuf::from(&self.socket_name);
        let _ = tokio::fs::remove_file(&socket_path).await;

        self.spawn_process()?;

        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            if socket_path.exists() {
                break;
            }
        }
        if !socket_path.exists() {
            anyhow::bail!("mpv IPC socket did not appear");
        }
        tokio::time::sleep(Duration::from_millis(200)).await;

        let stream = UnixStream::connect(&socket_path).await?;
        info!("mpv: connected to IPC socket");
        Ok(start_io_tasks(stream, event_tx))
    }

    /// Reattach to a still-running mpv without spawning.
    #[cfg(unix)]
    pub async fn try_reconnect(&mut self, event_tx: mpsc::Sender<MpvEvent>) -> Option<MpvHandle> {
        let socket_path = std::path::PathBuf::from(&self.socket_name);
        if !socket_path.exists() {
            return None;
        }
        match UnixStream::connect(&socket_path).await {
            Ok(stream) => {
                info!("mpv: reconnected to existing IPC socket");
                Some(start_io_tasks(stream, event_tx))
            }
            Err(e) => {
                warn!("mpv: failed to reconnect: {}", e);
                None
            }
        }
    }

    #[cfg(windows)]
    pub async fn spawn_and_connect(
        &mut self,
        event_tx: mpsc::Sender<MpvEvent>,
    ) -> anyhow::Result<MpvHandle> {
        self.kill().await;
        self.spawn_process()?;

        let pipe_path = format!(r"\\.\pipe\{}", self.socket_name);
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            if let Ok(client) = ClientOptions::new().open(&pipe_path) {
                info!("mpv: connected to named pipe");
                return Ok(start_io_tasks(client, event_tx));
            }
        }
        anyhow::bail!("mpv named pipe did not appear")
    }

    #[cfg(windows)]
    pub async fn try_reconnect(&mut self, event_tx: mpsc::Sender<MpvEvent>) -> Option<MpvHandle> {
        let pipe_path = format!(r"\\.\pipe\{}", self.socket_name);
        match ClientOptions::new().open(&pipe_path) {
            Ok(client) => {
                info!("mpv: reconnected to named pipe");
                Some(start_io_tasks(client, event_tx))
            }
            Err(e) => {
                warn!("mpv: failed to reconnect to named pipe: {}", e);
                None
            }
        }
    }
}

/// Split `stream` and start the reader/writer pair on it.
fn start_io_tasks<S>(stream: S, event_tx: mpsc::Sender<MpvEvent>) -> MpvHandle
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (read_half, write_half) = tokio::io::split(stream);
    let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
    let (cmd_tx, cmd_rx) = mpsc::channel::<PendingRequest>(64);

    tokio::spawn(writer_task(write_half, cmd_rx, pending.clone()));
    tokio::spawn(reader_task(BufReader::new(read_half), pending, event_tx));

    MpvHandle { tx: cmd_tx }
}

async fn fail_all(pending: &PendingMap, reason: &str) {
    let mut map = pending.lock().await;
    for (_, tx) in map.drain() {
        let _ = tx.send(Err(anyhow::anyhow!("{}", reason)));
    }
}

async fn reader_task<R>(mut reader: BufReader<R>, pending: PendingMap, event_tx: mpsc::Sender<MpvEvent>)
where
    R: AsyncRead + Unpin,
{
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => {
                debug!("mpv reader: connection closed");
                fail_all(&pending, "mpv IPC connection closed").await;
                break;
            }
            Ok(_) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let val: Value = match serde_json::from_str(trimmed) {
                    Ok(v) => v,
                    Err(e) => {
                        debug!("mpv reader: invalid json '{}': {}", trimmed, e);
                        continue;
                    }
                };

                let Some(req_id) = val.get("request_id").and_then(|v| v.as_u64()) else {
                    // time-pos fires several times a second; keep it out of the log
                    if val.get("id").and_then(|v| v.as_u64()) != Some(OBS_TIME_POS) {
                        debug!("mpv reader: event {}", trimmed);
                    }
                    let _ = event_tx.send(MpvEvent { raw: val }).await;
                    continue;
                };

                let mut map = pending.lock().await;
                match map.remove(&req_id) {
                    Some(tx) => {
                        let result = if val["error"].as_str() == Some("success") {
                            Ok(val)
                        } else {
                            let err = val["error"].as_str().unwrap_or("unknown error").to_string();
                            debug!("mpv reader: req={} err={}", req_id, err);
                            Err(anyhow::anyhow!("mpv error: {}", err))
                        };
                        let _ = tx.send(result);
                    }
                    None => debug!("mpv reader: response for unknown req={}", req_id),
                }
            }
            Err(e) => {
                warn!("mpv reader: read error: {}", e);
                fail_all(&pending, "mpv IPC read error").await;
                break;
            }
        }
    }
}

async fn writer_task<W>(mut writer: W, mut rx: mpsc::Receiver<PendingRequest>, pending: PendingMap)
where
    W: AsyncWrite + Unpin,
{
    while let Some(req) = rx.recv().await {
        // register before writing so the reader can always match the reply
        pending.lock().await.insert(req.req_id, req.reply);
        if let Err(e) = writer.write_all(req.payload.as_bytes()).await {
            warn!("mpv writer: write error: {}", e);
            if let Some(tx) = pending.lock().await.remove(&req.req_id) {
                let _ = tx.send(Err(anyhow::anyhow!("mpv write error: {}", e)));
            }
            break;
        }
    }
    debug!("mpv writer: task exiting");
}

impl MpvHandle {
    /// Replace the current file, paused, so nothing plays until asked.
    /// Returns the new playlist entry id when mpv reports one.
    pub async fn load_paused(&self, url: &str) -> anyhow::Result<Option<u64>> {
        self.set_pause(true).await?;
        debug!("mpv: loadfile {}", url);
        let reply = self.send(json!(["loadfile", url, "replace"])).await?;
        Ok(reply
            .get("data")
            .and_then(|d| d.get("playlist_entry_id"))
            .and_then(Value::as_u64))
    }

    pub async fn set_volume(&self, vol: f32) -> anyhow::Result<()> {
        let vol_pct = (vol * 100.0).clamp(0.0, 100.0);
        self.send(json!(["set_property", "volume", vol_pct])).await?;
        Ok(())
    }

    pub async fn set_pause(&self, paused: bool) -> anyhow::Result<()> {
        self.send(json!(["set_property", "pause", paused])).await?;
        Ok(())
    }

    pub async fn seek_to(&self, secs: f64) -> anyhow::Result<()> {
        self.send(json!(["set_property", "time-pos", secs])).await?;
        Ok(())
    }

    /// Register property observers. Needed after every fresh connection.
    pub async fn observe_all_properties(&self) {
        let props = [
            (OBS_CORE_IDLE, "core-idle"),
            (OBS_PAUSE, "pause"),
            (OBS_TIME_POS, "time-pos"),
            (OBS_DURATION, "duration"),
        ];
        for (id, name) in &props {
            match self.send(json!(["observe_property", id, name])).await {
                Ok(_) => debug!("mpv: observe_property id={} name={}", id, name),
                Err(e) => warn!("mpv: observe_property {} failed: {}", name, e),
            }
        }
    }

    pub async fn ping(&self) -> anyhow::Result<()> {
        self.send(json!(["get_property", "volume"])).await?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tokio::io::DuplexStream;

    /// Connect a handle to an in-memory pipe; the returned half plays mpv.
    pub(crate) fn fake_mpv() -> (MpvHandle, mpsc::Receiver<MpvEvent>, DuplexStream) {
        let (ours, theirs) = tokio::io::duplex(64 * 1024);
        let (event_tx, event_rx) = mpsc::channel(64);
        (start_io_tasks(ours, event_tx), event_rx, theirs)
    }

    #[test]
    fn property_change_parsing() {
        let ev = MpvEvent {
            raw: json!({"event": "property-change", "id": OBS_DURATION, "name": "duration", "data": 180.5}),
        };
        let (id, data) = ev.as_property_change().unwrap();
        assert_eq!(id, OBS_DURATION);
        assert_eq!(data.as_f64(), Some(180.5));

        let end = MpvEvent {
            raw: json!({"event": "end-file", "reason": "error", "file_error": "loading failed"}),
        };
        assert!(end.as_property_change().is_none());
        assert_eq!(end.event_name(), Some("end-file"));
        assert_eq!(end.end_reason(), Some("error"));
        assert_eq!(end.file_error(), Some("loading failed"));
    }

    #[tokio::test]
    async fn replies_are_matched_and_events_forwarded() {
        let (handle, mut events, theirs) = fake_mpv();
        let (read_half, mut write_half) = tokio::io::split(theirs);

        let server = tokio::spawn(async move {
            let mut lines = BufReader::new(read_half).lines();
            let line = lines.next_line().await.unwrap().unwrap();
            let req: Value = serde_json::from_str(&line).unwrap();
            assert_eq!(req["command"], json!(["set_property", "pause", true]));
            let id = req["request_id"].as_u64().unwrap();

            let event = json!({"event": "property-change", "id": OBS_PAUSE, "data": true});
            let reply = json!({"request_id": id, "error": "success", "data": null});
            write_half
                .write_all(format!("{}\n{}\n", event, reply).as_bytes())
                .await
                .unwrap();

            let line = lines.next_line().await.unwrap().unwrap();
            let req: Value = serde_json::from_str(&line).unwrap();
            let id = req["request_id"].as_u64().unwrap();
            let reply = json!({"request_id": id, "error": "property unavailable"});
            write_half
                .write_all(format!("{}\n", reply).as_bytes())
                .await
                .unwrap();
        });

        handle.set_pause(true).await.unwrap();
        let ev = events.recv().await.unwrap();
        assert_eq!(ev.as_property_change().map(|(id, _)| id), Some(OBS_PAUSE));

        let err = handle.seek_to(10.0).await.unwrap_err();
        assert!(err.to_string().contains("property unavailable"));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn closed_connection_fails_pending_requests() {
        let (handle, _events, theirs) = fake_mpv();
        drop(theirs);
        assert!(handle.ping().await.is_err());
    }
}

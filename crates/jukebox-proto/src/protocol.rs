use serde::{Deserialize, Serialize};

use crate::names::format_time;

/// Requests sent to the Playback Engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "cmd")]
pub enum EngineCommand {
    /// Replace the current track. Never starts playback by itself.
    Load { src: String },
    Play,
    Pause,
    /// Pause and rewind to the start.
    Stop,
    /// Seek to `fraction` of the known duration (clamped to 0..=1).
    SeekTo { fraction: f64 },
    /// Output volume, 0.0..=1.0.
    SetVolume { value: f32 },
}

/// Notifications published by the Playback Engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event")]
pub enum EngineEvent {
    Progress {
        time_pos_secs: Option<f64>,
        duration_secs: Option<f64>,
    },
    Paused { paused: bool },
    Status { status: PlaybackStatus },
    /// The loaded track reached its end. Sent at most once per load.
    Ended,
    PlayFailed { reason: String },
    Health { health: EngineHealth },
}

/// Detailed playback status, reflects actual mpv state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    #[default]
    Idle, // nothing loaded / stopped
    Connecting, // loadfile sent, mpv buffering
    Playing,    // core-idle=false, audio flowing
    Paused,
    Error, // failed to start (timeout or mpv error)
}

impl PlaybackStatus {
    pub fn label(&self) -> &'static str {
        match self {
            PlaybackStatus::Idle => "idle",
            PlaybackStatus::Connecting => "loading",
            PlaybackStatus::Playing => "playing",
            PlaybackStatus::Paused => "paused",
            PlaybackStatus::Error => "error",
        }
    }
}

/// Health of the mpv process as observed by the engine.
///
/// Transitions:
///   Absent -> Starting -> Running -> Dead -> Restarting -> Starting ...
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub enum EngineHealth {
    #[default]
    Absent,
    Starting,
    Running,
    Dead,
    Restarting,
}

impl EngineHealth {
    /// Short label for the player bar badge (≤5 chars).
    pub fn badge_label(&self) -> Option<&str> {
        match self {
            EngineHealth::Absent | EngineHealth::Running => None,
            EngineHealth::Starting => Some("INIT"),
            EngineHealth::Dead => Some("DEAD"),
            EngineHealth::Restarting => Some("REST"),
        }
    }

    pub fn is_unhealthy(&self) -> bool {
        matches!(self, EngineHealth::Dead | EngineHealth::Restarting)
    }
}

/// Last reported position of the loaded track.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlaybackPosition {
    pub time_pos_secs: Option<f64>,
    pub duration_secs: Option<f64>,
}

impl PlaybackPosition {
    /// Played fraction in 0..=1; 0 until the duration is known.
    pub fn fraction(&self) -> f64 {
        match (self.time_pos_secs, self.duration_secs) {
            (Some(t), Some(d)) if d > 0.0 && t.is_finite() => (t / d).clamp(0.0, 1.0),
            _ => 0.0,
        }
    }

    /// `MM:SS / MM:SS`.
    pub fn time_label(&self) -> String {
        format!(
            "{} / {}",
            format_time(self.time_pos_secs),
            format_time(self.duration_secs)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_wire_shape() {
        let json = serde_json::to_string(&EngineCommand::SeekTo { fraction: 0.5 }).unwrap();
        assert_eq!(json, r#"{"cmd":"SeekTo","fraction":0.5}"#);
        let back: EngineCommand = serde_json::from_str(r#"{"cmd":"Play"}"#).unwrap();
        assert_eq!(back, EngineCommand::Play);
    }

    #[test]
    fn position_fraction_and_label() {
        let pos = PlaybackPosition::default();
        assert_eq!(pos.fraction(), 0.0);
        assert_eq!(pos.time_label(), "00:00 / 00:00");

        let pos = PlaybackPosition {
            time_pos_secs: Some(30.0),
            duration_secs: Some(120.0),
        };
        assert!((pos.fraction() - 0.25).abs() < 1e-9);
        assert_eq!(pos.time_label(), "00:30 / 02:00");

        let overshoot = PlaybackPosition {
            time_pos_secs: Some(130.0),
            duration_secs: Some(120.0),
        };
        assert_eq!(overshoot.fraction(), 1.0);
    }

    #[test]
    fn health_badges() {
        assert_eq!(EngineHealth::Running.badge_label(), None);
        assert_eq!(EngineHealth::Dead.badge_label(), Some("DEAD"));
        assert!(EngineHealth::Restarting.is_unhealthy());
        assert!(!EngineHealth::Starting.is_unhealthy());
    }
}

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::platform;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub mpv: MpvConfig,
}

/// Where the static site lives. The manifest and media are resolved against
/// `origin + base_path`, info.json and directory listings against `origin`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_origin")]
    pub origin: String,
    #[serde(default = "default_base_path")]
    pub base_path: String,
    #[serde(default = "default_manifest")]
    pub manifest: String,
    #[serde(default = "default_media_root")]
    pub media_root: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    #[serde(default = "default_audio_extension")]
    pub audio_extension: String,
    /// Volume applied when un-muting from the muted icon.
    #[serde(default = "default_mute_restore_volume")]
    pub mute_restore_volume: f32,
    #[serde(default = "default_true")]
    pub autoplay_first_folder: bool,
    /// Use a song's `url` field from the manifest instead of the local path.
    #[serde(default)]
    pub prefer_remote_urls: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MpvConfig {
    #[serde(default = "default_volume")]
    pub default_volume: f32,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            base_path: default_base_path(),
            manifest: default_manifest(),
            media_root: default_media_root(),
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            audio_extension: default_audio_extension(),
            mute_restore_volume: default_mute_restore_volume(),
            autoplay_first_folder: default_true(),
            prefer_remote_urls: false,
        }
    }
}

impl Default for MpvConfig {
    fn default() -> Self {
        Self {
            default_volume: default_volume(),
        }
    }
}

fn default_origin() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_base_path() -> String {
    "/".to_string()
}

fn default_manifest() -> String {
    "music-data.json".to_string()
}

fn default_media_root() -> String {
    crate::names::MEDIA_ROOT.to_string()
}

fn default_audio_extension() -> String {
    crate::names::AUDIO_EXTENSION.to_string()
}

fn default_mute_restore_volume() -> f32 {
    0.1
}

fn default_true() -> bool {
    true
}

fn default_volume() -> f32 {
    0.5
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Read the config at `path`, writing the defaults there first if the
    /// file does not exist yet.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site: SiteConfig::default(),
            player: PlayerConfig::default(),
            mpv: MpvConfig::default(),
        }
    }
}

use serde::{Deserialize, Serialize};

use crate::names::sanitize_song_display_name;

/// The site-wide `music-data.json`. Folder order is authoritative.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Manifest {
    #[serde(default)]
    pub folders: Vec<FolderDescriptor>,
}

impl Manifest {
    /// Exact-name lookup.
    pub fn find(&self, name: &str) -> Option<&FolderDescriptor> {
        self.folders.iter().find(|f| f.name == name)
    }

    pub fn folder_names(&self) -> Vec<String> {
        self.folders.iter().map(|f| f.name.clone()).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FolderDescriptor {
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Cover hint relative to the site root (`songs/<name>/cover.jpg`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    #[serde(default)]
    pub songs: Vec<SongRef>,
}

/// One playlist entry: either a bare stem (extension implied) or an
/// explicit file name, optionally with a remote URL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum SongRef {
    Stem(String),
    File {
        file: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
    },
}

impl SongRef {
    /// File name on disk: stems get `.<ext>` appended, explicit files are
    /// used verbatim.
    pub fn file_name(&self, extension: &str) -> String {
        match self {
            SongRef::Stem(stem) => format!("{}.{}", stem, extension),
            SongRef::File { file, .. } => file.clone(),
        }
    }

    pub fn remote_url(&self) -> Option<&str> {
        match self {
            SongRef::File { url: Some(url), .. } if !url.trim().is_empty() => Some(url),
            _ => None,
        }
    }

    pub fn display_name(&self) -> String {
        match self {
            SongRef::Stem(stem) => sanitize_song_display_name(stem),
            SongRef::File { file, .. } => sanitize_song_display_name(file),
        }
    }
}

/// Optional per-folder `info.json`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FolderInfo {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cover: Option<String>,
}

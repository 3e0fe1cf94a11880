//! Builds `music-data.json` from a local `songs/` tree.
//!
//! Each sub-directory holding at least one audio file becomes a folder.
//! Titles and descriptions come from an optional `info.json` inside it.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::cover::PREFERRED_COVERS;
use crate::error::BuildError;
use crate::manifest::{FolderDescriptor, FolderInfo, Manifest, SongRef};
use crate::names::{encode_segment, MEDIA_ROOT};

pub fn build_manifest(songs_dir: &Path, extension: &str) -> Result<Manifest, BuildError> {
    if !songs_dir.is_dir() {
        return Err(BuildError::MissingRoot(songs_dir.to_path_buf()));
    }

    let mut dirs = read_dir_sorted(songs_dir)?;
    dirs.retain(|p| p.is_dir());

    let mut folders = Vec::new();
    for dir in dirs {
        let Some(name) = dir.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
            continue;
        };

        let songs = audio_songs(&dir, extension)?;
        if songs.is_empty() {
            debug!("skipping {}: no .{} files", dir.display(), extension);
            continue;
        }

        let info = read_info(&dir);
        let title = info
            .as_ref()
            .and_then(|i| i.title.clone())
            .unwrap_or_else(|| name.clone());
        let description = info
            .as_ref()
            .and_then(|i| i.description.clone())
            .unwrap_or_default();
        let cover = PREFERRED_COVERS
            .iter()
            .find(|c| dir.join(c).is_file())
            .map(|c| format!("{}/{}/{}", MEDIA_ROOT, name, c));

        info!("{}: {} songs", name, songs.len());
        folders.push(FolderDescriptor {
            name,
            title,
            description,
            cover,
            songs,
        });
    }

    Ok(Manifest { folders })
}

/// Point every song at `<base>/<encoded file>`. Bare stems get the audio
/// extension so the `file` field always names a real file.
pub fn with_remote_base(mut manifest: Manifest, base: &str, extension: &str) -> Manifest {
    let base = base.trim_end_matches('/');
    for folder in &mut manifest.folders {
        for song in &mut folder.songs {
            let file = song.file_name(extension);
            let url = format!("{}/{}", base, encode_segment(&file));
            *song = SongRef::File {
                file,
                url: Some(url),
            };
        }
    }
    manifest
}

pub fn write_manifest(manifest: &Manifest, out: &Path) -> Result<(), BuildError> {
    let json = serde_json::to_string_pretty(manifest)?;
    fs::write(out, json).map_err(|source| BuildError::Io {
        path: out.to_path_buf(),
        source,
    })
}

fn read_dir_sorted(dir: &Path) -> Result<Vec<PathBuf>, BuildError> {
    let io_err = |source| BuildError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut paths = fs::read_dir(dir)
        .map_err(io_err)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(io_err)?;
    paths.sort();
    Ok(paths)
}

/// Audio files in `dir`, by file name. The extension matches in any case,
/// but only an exact `.<extension>` becomes a bare stem; anything else keeps
/// its on-disk name so the URL still points at a real file.
fn audio_songs(dir: &Path, extension: &str) -> Result<Vec<SongRef>, BuildError> {
    let songs = read_dir_sorted(dir)?
        .into_iter()
        .filter(|p| p.is_file())
        .filter_map(|p| {
            let ext = p.extension()?.to_str()?;
            if !ext.eq_ignore_ascii_case(extension) {
                return None;
            }
            if ext == extension {
                p.file_stem()?.to_str().map(|s| SongRef::Stem(s.to_string()))
            } else {
                p.file_name()?.to_str().map(|f| SongRef::File {
                    file: f.to_string(),
                    url: None,
                })
            }
        })
        .collect();
    Ok(songs)
}

/// Unreadable or malformed info.json is treated as absent.
fn read_info(dir: &Path) -> Option<FolderInfo> {
    let content = fs::read_to_string(dir.join("info.json")).ok()?;
    match serde_json::from_str(&content) {
        Ok(info) => Some(info),
        Err(e) => {
            debug!("ignoring {}/info.json: {}", dir.display(), e);
            None
        }
    }
}

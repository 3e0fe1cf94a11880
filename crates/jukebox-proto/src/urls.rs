use reqwest::Url;

use crate::config::SiteConfig;
use crate::manifest::SongRef;
use crate::names::encode_segment;

/// Absolute URL rules for the static site.
///
/// Two roots are in play: the manifest and media live under
/// `origin + base_path` (the page's directory), while `info.json` and the
/// directory listing are always fetched from `origin/songs/...`.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteUrls {
    origin: String,
    base_path: String,
    manifest: String,
    media_root: String,
}

impl SiteUrls {
    pub fn new(origin: &str, base_path: &str) -> Self {
        Self {
            origin: origin.trim_end_matches('/').to_string(),
            base_path: normalize_base_path(base_path),
            manifest: "music-data.json".to_string(),
            media_root: crate::names::MEDIA_ROOT.to_string(),
        }
    }

    pub fn from_config(site: &SiteConfig) -> Self {
        let mut urls = Self::new(&site.origin, &site.base_path);
        urls.manifest = site.manifest.trim_start_matches('/').to_string();
        urls.media_root = site.media_root.trim_matches('/').to_string();
        urls
    }

    /// Split a page URL into origin and base path, dropping the final path
    /// segment: `https://host/app/index.html` gives `https://host` + `/app/`.
    pub fn split_page_url(page: &str) -> anyhow::Result<(String, String)> {
        let url = Url::parse(page)?;
        let origin = url.origin().ascii_serialization();
        if origin == "null" {
            anyhow::bail!("{} has no origin", page);
        }
        let path = url.path();
        let base = match path.rfind('/') {
            Some(idx) => &path[..=idx],
            None => "/",
        };
        Ok((origin, base.to_string()))
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn manifest_url(&self) -> String {
        format!("{}{}{}", self.origin, self.base_path, self.manifest)
    }

    pub fn info_url(&self, folder: &str) -> String {
        format!("{}/{}/info.json", self.origin, self.folder_path(folder))
    }

    pub fn listing_url(&self, folder: &str) -> String {
        format!("{}/{}/", self.origin, self.folder_path(folder))
    }

    /// Site-relative path for a file found through the directory listing.
    pub fn listing_file_path(&self, folder: &str, file: &str) -> String {
        format!("/{}/{}", self.folder_path(folder), encode_segment(file))
    }

    /// Base-relative path for a bare cover file name from info.json.
    pub fn bare_cover_path(&self, folder: &str, file: &str) -> String {
        format!(
            "{}{}/{}",
            self.base_path,
            self.folder_path(folder),
            encode_segment(file)
        )
    }

    pub fn media_url(&self, folder: &str, file: &str) -> String {
        format!(
            "{}{}{}/{}",
            self.origin,
            self.base_path,
            self.folder_path(folder),
            encode_segment(file)
        )
    }

    /// Playable source for one playlist entry.
    pub fn song_source(
        &self,
        folder: &str,
        song: &SongRef,
        extension: &str,
        prefer_remote: bool,
    ) -> String {
        if prefer_remote {
            if let Some(url) = song.remote_url() {
                return url.to_string();
            }
        }
        self.media_url(folder, &song.file_name(extension))
    }

    fn folder_path(&self, folder: &str) -> String {
        format!("{}/{}", self.media_root, encode_segment(folder))
    }
}

fn normalize_base_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn site() -> SiteUrls {
        SiteUrls::new("http://127.0.0.1:8000/", "/")
    }

    #[test]
    fn manifest_and_media_use_base_path() {
        let urls = SiteUrls::new("https://host", "app");
        assert_eq!(urls.manifest_url(), "https://host/app/music-data.json");
        assert_eq!(
            urls.media_url("ncs", "01 - Alpha_Song.mp3"),
            "https://host/app/songs/ncs/01%20-%20Alpha_Song.mp3"
        );
    }

    #[test]
    fn info_and_listing_ignore_base_path() {
        let urls = SiteUrls::new("https://host", "/app/");
        assert_eq!(urls.info_url("Chill Mix"), "https://host/songs/Chill%20Mix/info.json");
        assert_eq!(urls.listing_url("Chill Mix"), "https://host/songs/Chill%20Mix/");
        assert_eq!(
            urls.listing_file_path("Chill Mix", "cover.jpg"),
            "/songs/Chill%20Mix/cover.jpg"
        );
        assert_eq!(
            urls.bare_cover_path("Chill Mix", "art.png"),
            "/app/songs/Chill%20Mix/art.png"
        );
    }

    #[test]
    fn remote_url_only_when_preferred() {
        let song = SongRef::File {
            file: "a.mp3".into(),
            url: Some("https://cdn.example/a.mp3".into()),
        };
        let urls = site();
        assert_eq!(
            urls.song_source("f", &song, "mp3", false),
            "http://127.0.0.1:8000/songs/f/a.mp3"
        );
        assert_eq!(urls.song_source("f", &song, "mp3", true), "https://cdn.example/a.mp3");
        let bare = SongRef::Stem("b".into());
        assert_eq!(
            urls.song_source("f", &bare, "mp3", true),
            "http://127.0.0.1:8000/songs/f/b.mp3"
        );
    }

    #[test]
    fn page_url_splits_into_origin_and_directory() {
        let (origin, base) =
            SiteUrls::split_page_url("https://user.github.io/Spotify-Clone/index.html").unwrap();
        assert_eq!(origin, "https://user.github.io");
        assert_eq!(base, "/Spotify-Clone/");

        let (origin, base) = SiteUrls::split_page_url("http://localhost:8000").unwrap();
        assert_eq!(origin, "http://localhost:8000");
        assert_eq!(base, "/");

        assert!(SiteUrls::split_page_url("not a url").is_err());
    }

    proptest! {
        #[test]
        fn bare_song_source_ends_with_encoded_path(
            folder in "[a-zA-Z0-9 _%#?-]{1,12}",
            stem in "[a-zA-Z0-9 _%#?.()-]{1,16}",
        ) {
            let src = site().song_source(&folder, &SongRef::Stem(stem.clone()), "mp3", false);
            let suffix = format!("/{}/{}.mp3", encode_segment(&folder), encode_segment(&stem));
            prop_assert!(src.ends_with(&suffix));
            prop_assert!(src.starts_with("http://127.0.0.1:8000/songs/"));
        }
    }
}

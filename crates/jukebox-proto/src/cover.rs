//! Cover Resolver: pick an image for a folder card.
//!
//! An explicit `cover` hint from info.json wins. Without one, the folder's
//! directory listing is scraped for a likely image file.

use std::sync::OnceLock;

use regex::Regex;
use scraper::{Html, Selector};
use tracing::debug;

use crate::manifest::FolderInfo;
use crate::names::percent_decode;
use crate::resolver::Library;
use crate::urls::SiteUrls;

/// Checked in this order before falling back to any image file.
pub const PREFERRED_COVERS: [&str; 6] = [
    "cover.jpg",
    "cover.png",
    "cover.webp",
    "cover.jpeg",
    "folder.jpg",
    "folder.png",
];

fn image_ext_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\.(jpg|jpeg|png|webp|gif)$").expect("image ext regex"))
}

/// Resolve the card image for `folder`, or `None` when nothing usable is
/// found or any fetch fails.
pub async fn resolve_cover(
    library: &Library,
    folder: &str,
    info: Option<&FolderInfo>,
) -> Option<String> {
    if folder.is_empty() {
        return None;
    }

    let hint = info
        .and_then(|i| i.cover.as_deref())
        .filter(|c| !c.trim().is_empty());
    if let Some(hint) = hint {
        return resolve_cover_hint(library.urls(), folder, hint);
    }

    let listing_url = library.urls().listing_url(folder);
    let html = match library.fetch_text(&listing_url).await {
        Ok(html) => html,
        Err(e) => {
            debug!("no directory listing for {:?}: {}", folder, e);
            return None;
        }
    };

    let files = listing_file_names(&html);
    let picked = pick_cover_from_listing(&files)?;
    Some(library.urls().listing_file_path(folder, picked))
}

/// Turn an explicit cover hint into a path or URL.
///
/// Absolute URLs and rooted paths pass through, anything containing a slash
/// is treated as site-relative, and a bare file name lives in the folder.
pub fn resolve_cover_hint(urls: &SiteUrls, folder: &str, hint: &str) -> Option<String> {
    let decoded = percent_decode(hint.trim());
    let cover = backslashes_to_slash(&decoded);
    let cover = cover.trim();
    if cover.is_empty() {
        return None;
    }

    let lower = cover.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") || cover.starts_with('/') {
        return Some(cover.to_string());
    }
    if lower.starts_with("songs/") || cover.contains('/') {
        return Some(format!("/{}", cover));
    }
    Some(urls.bare_cover_path(folder, cover))
}

/// Basenames of every `<a href>` in a directory listing page, decoded.
pub fn listing_file_names(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| {
            let decoded = percent_decode(href);
            let path = backslashes_to_slash(&decoded);
            path.trim()
                .split('/')
                .filter(|s| !s.is_empty())
                .last()
                .map(str::to_string)
        })
        .collect()
}

/// Preferred names first, in declared order, then the first image file.
pub fn pick_cover_from_listing(files: &[String]) -> Option<&str> {
    PREFERRED_COVERS
        .iter()
        .find_map(|wanted| files.iter().find(|f| f.as_str() == *wanted))
        .or_else(|| files.iter().find(|f| image_ext_re().is_match(f)))
        .map(String::as_str)
}

/// Each run of backslashes becomes a single `/`.
fn backslashes_to_slash(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_run = false;
    for ch in raw.chars() {
        if ch == '\\' {
            if !in_run {
                out.push('/');
            }
            in_run = true;
        } else {
            out.push(ch);
            in_run = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls() -> SiteUrls {
        SiteUrls::new("http://127.0.0.1:8000", "/app/")
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn hint_passthrough_and_prefixing() {
        let u = urls();
        assert_eq!(
            resolve_cover_hint(&u, "ncs", "https://cdn.example/a.jpg").as_deref(),
            Some("https://cdn.example/a.jpg")
        );
        assert_eq!(
            resolve_cover_hint(&u, "ncs", "/img/a.jpg").as_deref(),
            Some("/img/a.jpg")
        );
        assert_eq!(
            resolve_cover_hint(&u, "ncs", "Songs/ncs/a.jpg").as_deref(),
            Some("/Songs/ncs/a.jpg")
        );
        assert_eq!(
            resolve_cover_hint(&u, "ncs", "art\\a.jpg").as_deref(),
            Some("/art/a.jpg")
        );
        assert_eq!(
            resolve_cover_hint(&u, "Chill Mix", "my cover.jpg").as_deref(),
            Some("/app/songs/Chill%20Mix/my%20cover.jpg")
        );
        assert_eq!(resolve_cover_hint(&u, "ncs", "  %20 "), None);
    }

    #[test]
    fn listing_names_are_decoded_basenames() {
        let html = r#"<html><body><ul>
            <li><a href="../">Parent</a></li>
            <li><a href="01%20-%20Alpha.mp3">01 - Alpha.mp3</a></li>
            <li><a href="/songs/ncs/Front%20Art.PNG">Front Art.PNG</a></li>
            <li><a>no href</a></li>
        </ul></body></html>"#;
        assert_eq!(
            listing_file_names(html),
            names(&["..", "01 - Alpha.mp3", "Front Art.PNG"])
        );
    }

    #[test]
    fn preferred_names_win_in_declared_order() {
        let files = names(&["a.gif", "folder.jpg", "cover.png", "x.mp3"]);
        assert_eq!(pick_cover_from_listing(&files), Some("cover.png"));

        let files = names(&["x.mp3", "Front.WEBP", "b.jpg"]);
        assert_eq!(pick_cover_from_listing(&files), Some("Front.WEBP"));

        let files = names(&["x.mp3", "notes.txt"]);
        assert_eq!(pick_cover_from_listing(&files), None);
    }
}

//! Folder-id and display-name cleanup shared by the resolver, the session
//! and the card grid.
//!
//! Everything here is pure and total: any input string produces an output,
//! malformed percent-escapes are kept verbatim.

use std::sync::OnceLock;

use regex::Regex;

/// Name of the media root directory on the static host.
pub const MEDIA_ROOT: &str = "songs";

/// Extension appended to bare song stems and stripped from display names.
pub const AUDIO_EXTENSION: &str = "mp3";

fn vendor_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\s*[\(\[]?\s*pendujatt\.com\.se\s*[\)\]]?").expect("vendor tag regex")
    })
}

fn track_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9]+[\s\-_:,.]+").expect("track number regex"))
}

fn whitespace_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s{2,}").expect("whitespace regex"))
}

/// Reduce a raw folder reference (href, manifest name, user input) to the
/// bare folder identifier.
///
/// `"songs/ncs/"`, `"/songs//ncs"`, `"songs%2Fncs"` and `"ncs"` all yield `"ncs"`.
pub fn normalize_folder_name(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let decoded = percent_decode(raw);
    let joined = collapse_separators(decoded.trim());
    let mut segments: Vec<&str> = joined.split('/').filter(|s| !s.is_empty()).collect();
    if segments.len() > 1 && segments[0].eq_ignore_ascii_case(MEDIA_ROOT) {
        segments.remove(0);
    }
    segments.last().map(|s| s.to_string()).unwrap_or_default()
}

/// Turn a song file reference into the label shown in the playlist and the
/// now-playing line.
///
/// `"02_My_Song (PenduJatt.Com.Se).mp3"` becomes `"My Song"`.
pub fn sanitize_song_display_name(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let decoded = percent_decode(raw);
    let joined = collapse_separators(&decoded);
    let last = joined
        .split('/')
        .filter(|s| !s.is_empty())
        .last()
        .unwrap_or_default();

    let stem = strip_extension(last, AUDIO_EXTENSION);
    let untagged = vendor_tag_re().replace_all(stem, "");
    let unnumbered = track_number_re().replace(&untagged, "");
    let spaced = unnumbered.replace('_', " ");
    whitespace_run_re()
        .replace_all(spaced.trim(), " ")
        .into_owned()
}

/// `MM:SS` clock used by the time label. Unknown, negative and NaN inputs
/// render as `00:00`; minutes are not wrapped into hours.
pub fn format_time(secs: Option<f64>) -> String {
    let secs = match secs {
        Some(s) if s.is_finite() && s > 0.0 => s,
        _ => return "00:00".to_string(),
    };
    let total = secs.floor() as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// Percent-encode one path segment.
pub fn encode_segment(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

/// Decode `%XX` escapes until the string stops changing.
///
/// A pass that does not yield valid UTF-8 leaves the whole string as it
/// was, the same way a failed `decodeURIComponent` leaves its input alone.
pub fn percent_decode(raw: &str) -> String {
    let mut current = raw.to_string();
    loop {
        let next = match urlencoding::decode(&current) {
            Ok(decoded) => decoded.into_owned(),
            Err(_) => return current,
        };
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Backslashes to slashes, repeated slashes collapsed, outer slashes trimmed.
fn collapse_separators(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        let ch = if ch == '\\' { '/' } else { ch };
        if ch == '/' && out.ends_with('/') {
            continue;
        }
        out.push(ch);
    }
    out.trim_matches('/').to_string()
}

fn strip_extension<'a>(name: &'a str, ext: &str) -> &'a str {
    let suffix_len = ext.len() + 1;
    if name.len() >= suffix_len && name.is_char_boundary(name.len() - suffix_len) {
        let (stem, suffix) = name.split_at(name.len() - suffix_len);
        if suffix.starts_with('.') && suffix[1..].eq_ignore_ascii_case(ext) {
            return stem;
        }
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folder_name_variants_reduce_to_the_id() {
        assert_eq!(normalize_folder_name("ncs"), "ncs");
        assert_eq!(normalize_folder_name("songs/ncs/"), "ncs");
        assert_eq!(normalize_folder_name("/SONGS//ncs"), "ncs");
        assert_eq!(normalize_folder_name("songs%2Fncs"), "ncs");
        assert_eq!(normalize_folder_name("songs\\\\ncs"), "ncs");
        assert_eq!(normalize_folder_name("  /a/b/Chill%20Mix/ "), "Chill Mix");
        assert_eq!(normalize_folder_name(""), "");
        assert_eq!(normalize_folder_name("///"), "");
    }

    #[test]
    fn lone_media_root_is_kept_as_a_folder() {
        assert_eq!(normalize_folder_name("songs"), "songs");
        assert_eq!(normalize_folder_name("songs/songs"), "songs");
    }

    #[test]
    fn sanitize_strips_vendor_tag_and_track_number() {
        assert_eq!(
            sanitize_song_display_name("02_My_Song (PenduJatt.Com.Se).mp3"),
            "My Song"
        );
        assert_eq!(
            sanitize_song_display_name("songs/ncs/01%20-%20Alpha_Song.mp3"),
            "Alpha Song"
        );
        assert_eq!(sanitize_song_display_name("Track [pendujatt.com.se]"), "Track");
        assert_eq!(sanitize_song_display_name("loud.MP3"), "loud");
        assert_eq!(sanitize_song_display_name("a__b   c.mp3"), "a b c");
    }

    #[test]
    fn sanitize_keeps_titles_that_start_with_words() {
        assert_eq!(sanitize_song_display_name("1999.mp3"), "1999");
        assert_eq!(sanitize_song_display_name("Intro.flac"), "Intro.flac");
        assert_eq!(sanitize_song_display_name(""), "");
    }

    #[test]
    fn malformed_escapes_are_kept() {
        assert_eq!(percent_decode("100%"), "100%");
        assert_eq!(percent_decode("%zz"), "%zz");
        assert_eq!(percent_decode("%FF%41"), "%FF%41");
        assert_eq!(percent_decode("songs%2F%E9t%C3%A9"), "songs%2F%E9t%C3%A9");
        assert_eq!(percent_decode("caf%C3%A9"), "café");
        assert_eq!(percent_decode("%2541"), "A");
    }

    #[test]
    fn time_label_formatting() {
        assert_eq!(format_time(None), "00:00");
        assert_eq!(format_time(Some(f64::NAN)), "00:00");
        assert_eq!(format_time(Some(-3.0)), "00:00");
        assert_eq!(format_time(Some(59.9)), "00:59");
        assert_eq!(format_time(Some(61.0)), "01:01");
        assert_eq!(format_time(Some(3725.0)), "62:05");
    }

    #[test]
    fn segments_are_percent_encoded() {
        assert_eq!(encode_segment("01 - Alpha_Song.mp3"), "01%20-%20Alpha_Song.mp3");
        assert_eq!(encode_segment("a/b"), "a%2Fb");
    }

    mod props {
        use super::super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn normalized_folder_has_no_separators(raw in r"[a-zA-Z0-9 /\\%._-]{0,24}|(%[0-9A-Fa-f]{2}|[a-z/]){0,12}") {
                let out = normalize_folder_name(&raw);
                prop_assert!(!out.contains('/'));
                prop_assert!(!out.contains('\\'));
            }

            #[test]
            fn ascii_escapes_decode_fully(raw in r"(%[2-7][0-9A-Fa-f]|[a-z ]){0,12}") {
                let out = percent_decode(&raw);
                prop_assert_eq!(percent_decode(&out), out.clone());
            }

            #[test]
            fn normalizing_is_idempotent(raw in r"[a-zA-Z0-9/\\._-]{0,24}") {
                let once = normalize_folder_name(&raw);
                prop_assert_eq!(normalize_folder_name(&once), once.clone());
            }
        }
    }
}

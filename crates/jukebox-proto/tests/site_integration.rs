mod common;

use common::static_site::{dead_origin, spawn_site, NCS_MANIFEST};
use jukebox_proto::cover::resolve_cover;
use jukebox_proto::manifest::FolderInfo;
use jukebox_proto::protocol::EngineCommand;
use jukebox_proto::resolver::Library;
use jukebox_proto::session::{Effect, Session};
use jukebox_proto::urls::SiteUrls;

async fn library(files: &[(&str, &str)]) -> Library {
    let origin = spawn_site(files).await;
    Library::new(SiteUrls::new(&origin, "/"))
}

fn loaded_sources(effects: &[Effect]) -> Vec<String> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::Engine(EngineCommand::Load { src }) => Some(src.clone()),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn folders_come_back_in_manifest_order() {
    let lib = library(&[("/music-data.json", NCS_MANIFEST)]).await;
    assert_eq!(lib.list_folders().await, vec!["ncs", "Chill Mix"]);

    let ncs = lib.load_folder("ncs").await.unwrap();
    assert_eq!(ncs.title, "NCS");
    assert_eq!(ncs.songs.len(), 3);
    assert!(lib.load_folder("NCS").await.is_none());
}

#[tokio::test]
async fn manifest_failures_are_empty() {
    let lib = Library::new(SiteUrls::new(&dead_origin().await, "/"));
    assert!(lib.list_folders().await.is_empty());
    assert!(lib.load_folder("ncs").await.is_none());

    let lib = library(&[("/music-data.json", "{\"folders\": [")]).await;
    assert!(lib.load_manifest().await.is_none());

    let lib = library(&[]).await;
    assert!(lib.list_folders().await.is_empty());
}

#[tokio::test]
async fn manifest_is_read_from_the_base_path() {
    let origin = spawn_site(&[("/app/music-data.json", NCS_MANIFEST)]).await;
    let lib = Library::new(SiteUrls::new(&origin, "/app/"));
    assert_eq!(lib.list_folders().await.len(), 2);
}

#[tokio::test]
async fn supplemental_info_is_best_effort() {
    let lib = library(&[
        (
            "/songs/Chill%20Mix/info.json",
            r#"{"title": "Chill Vibes", "cover": "art.png"}"#,
        ),
        ("/songs/broken/info.json", "<html>oops</html>"),
    ])
    .await;

    let info = lib.load_supplemental_info("Chill Mix").await.unwrap();
    assert_eq!(info.title.as_deref(), Some("Chill Vibes"));
    assert_eq!(info.description, None);
    assert!(lib.load_supplemental_info("broken").await.is_none());
    assert!(lib.load_supplemental_info("missing").await.is_none());
}

#[tokio::test]
async fn cover_prefers_hint_then_listing() {
    let listing = r#"<html><body>
        <a href="../">../</a>
        <a href="01%20-%20Alpha_Song.mp3">01 - Alpha_Song.mp3</a>
        <a href="Back.gif">Back.gif</a>
        <a href="folder.jpg">folder.jpg</a>
    </body></html>"#;
    let lib = library(&[
        ("/songs/ncs/", listing),
        ("/songs/plain/", r#"<a href="b.PNG">b</a><a href="a.mp3">a</a>"#),
        ("/songs/bare/", r#"<a href="a.mp3">a</a>"#),
    ])
    .await;

    assert_eq!(
        resolve_cover(&lib, "ncs", None).await.as_deref(),
        Some("/songs/ncs/folder.jpg")
    );
    assert_eq!(
        resolve_cover(&lib, "plain", None).await.as_deref(),
        Some("/songs/plain/b.PNG")
    );
    assert_eq!(resolve_cover(&lib, "bare", None).await, None);
    assert_eq!(resolve_cover(&lib, "unlisted", None).await, None);
    assert_eq!(resolve_cover(&lib, "", None).await, None);

    let info = FolderInfo {
        cover: Some("art.png".into()),
        ..Default::default()
    };
    assert_eq!(
        resolve_cover(&lib, "unlisted", Some(&info)).await.as_deref(),
        Some("/songs/unlisted/art.png")
    );

    let blank = FolderInfo {
        cover: Some("  ".into()),
        ..Default::default()
    };
    assert_eq!(
        resolve_cover(&lib, "ncs", Some(&blank)).await.as_deref(),
        Some("/songs/ncs/folder.jpg")
    );
}

#[tokio::test]
async fn opening_a_folder_end_to_end() {
    let lib = library(&[("/music-data.json", NCS_MANIFEST)]).await;
    let mut session = Session::new(lib.urls().clone(), "mp3", false);

    let (ticket, _) = session.begin_open("songs/ncs/");
    let descriptor = lib.load_folder(&ticket.folder).await;
    let effects = session.finish_open(&ticket, descriptor);

    assert_eq!(session.index(), Some(0));
    assert!(effects.contains(&Effect::SetNowPlaying("Alpha Song".into())));
    let sources = loaded_sources(&effects);
    assert_eq!(sources.len(), 1);
    assert!(sources[0].ends_with("/songs/ncs/01%20-%20Alpha_Song.mp3"));

    let rows = effects
        .iter()
        .find_map(|e| match e {
            Effect::ShowPlaylist(rows) => Some(rows.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(rows, vec!["Alpha Song", "Beta", "Gamma"]);

    // Walk to the end; the last next is a no-op.
    assert_eq!(loaded_sources(&session.play_next()).len(), 1);
    let last = loaded_sources(&session.play_next());
    assert!(last[0].ends_with("/songs/ncs/Gamma.mp3"));
    assert_eq!(session.index(), Some(2));
    assert!(session.play_next().is_empty());
    assert!(session.on_ended().is_empty());
}

#[tokio::test]
async fn empty_folder_loads_nothing() {
    let lib = library(&[("/music-data.json", NCS_MANIFEST)]).await;
    let mut session = Session::new(lib.urls().clone(), "mp3", false);

    let (ticket, _) = session.begin_open("songs%2FChill%20Mix");
    assert_eq!(ticket.folder, "Chill Mix");
    let effects = session.finish_open(&ticket, lib.load_folder(&ticket.folder).await);
    assert!(loaded_sources(&effects).is_empty());
    assert!(effects.contains(&Effect::ShowPlaylist(vec![])));
    assert!(effects.contains(&Effect::SetNowPlaying(String::new())));
    assert_eq!(session.index(), None);
}
